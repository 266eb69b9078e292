//! Audit timestamp helpers.
//!
//! Timestamps are `chrono::DateTime<Utc>` values persisted as native BSON
//! datetimes, which carry millisecond precision. [`now`] truncates to that
//! precision so a value read back compares equal to the value written.
//!
//! Use the module as a serde adapter on audit fields:
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct Role {
//!     #[serde(rename = "_id")]
//!     id: String,
//!     #[serde(with = "docrepo::timestamp", default)]
//!     created: DateTime<Utc>,
//!     #[serde(with = "docrepo::timestamp", default)]
//!     updated: DateTime<Utc>,
//! }
//! ```

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserializer, Serializer};

/// The zero value of an audit timestamp: the Unix epoch.
pub fn zero() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn is_zero(value: &DateTime<Utc>) -> bool {
    *value == zero()
}

/// Current UTC instant at storage precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    chrono_datetime_as_bson_datetime::serialize(value, serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    chrono_datetime_as_bson_datetime::deserialize(deserializer)
}
