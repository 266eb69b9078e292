use chrono::{DateTime, Utc};
use docrepo::entity::{Audited, Entity};
use docrepo::timestamp;
use docrepo_derive::{Entity, MongoEntity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity, MongoEntity)]
#[entity(name = "roles", index(type = "non-unique", fields = "normalized_name"))]
pub struct Role {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
    pub created: DateTime<Utc>,
    #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
    pub updated: DateTime<Utc>,
}

impl Role {
    pub fn new(name: &str) -> Self {
        Role::with_normalized(name, &name.to_lowercase())
    }

    pub fn with_normalized(name: &str, normalized_name: &str) -> Self {
        Role {
            id: String::new(),
            name: name.to_string(),
            normalized_name: normalized_name.to_string(),
            created: timestamp::zero(),
            updated: timestamp::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity, MongoEntity)]
#[entity(name = "users", index(type = "unique", fields = "email"))]
#[mongo_entity(created = "created_at", updated = "updated_at")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub age: i32,
    #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, display_name: &str, age: i32) -> Self {
        User {
            id: String::new(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            age,
            created_at: timestamp::zero(),
            updated_at: timestamp::zero(),
        }
    }
}

/// Stock record keyed by its product code, without audit timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[entity(name = "stock")]
pub struct StockItem {
    #[serde(rename = "_id")]
    pub code: String,
    pub quantity: i64,
}

impl StockItem {
    pub fn new(code: &str, quantity: i64) -> Self {
        StockItem {
            code: code.to_string(),
            quantity,
        }
    }
}

/// Audited reading keyed by an integer sensor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor: i64,
    pub value: f64,
    #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
    pub created: DateTime<Utc>,
    #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
    pub updated: DateTime<Utc>,
}

impl Reading {
    pub fn new(sensor: i64, value: f64) -> Self {
        Reading {
            sensor,
            value,
            created: timestamp::zero(),
            updated: timestamp::zero(),
        }
    }
}

impl Entity for Reading {}

impl Audited for Reading {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn set_created(&mut self, created: DateTime<Utc>) {
        self.created = created;
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn set_updated(&mut self, updated: DateTime<Utc>) {
        self.updated = updated;
    }
}
