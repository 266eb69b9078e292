//! Declarative index definitions.
//!
//! Indexes are declared on an entity (through `#[entity(index(...))]` on the
//! derive) or registered on [`RepositoryOptions`](crate::repository::RepositoryOptions)
//! and are ensured once, when a repository resolves its collection.

use std::fmt::{Display, Formatter};

/// Kind of index to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Rejects a second document with the same combination of field values.
    Unique,
    NonUnique,
}

impl IndexType {
    /// Parses the index type names accepted by the entity derive.
    pub fn parse(name: &str) -> Option<IndexType> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "unique" => Some(IndexType::Unique),
            "non-unique" | "nonunique" => Some(IndexType::NonUnique),
            _ => None,
        }
    }
}

/// Defines an index on one or more fields of a collection.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct IndexDefinition {
    fields: Vec<String>,
    index_type: IndexType,
}

impl IndexDefinition {
    /// Creates a new index definition over `fields`, in key order.
    pub fn new(fields: Vec<&str>, index_type: IndexType) -> Self {
        IndexDefinition {
            fields: fields.iter().map(|field| field.to_string()).collect(),
            index_type,
        }
    }

    pub fn unique(fields: Vec<&str>) -> Self {
        IndexDefinition::new(fields, IndexType::Unique)
    }

    pub fn non_unique(fields: Vec<&str>) -> Self {
        IndexDefinition::new(fields, IndexType::NonUnique)
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn is_unique(&self) -> bool {
        self.index_type == IndexType::Unique
    }

    /// Conventional index name, `field1_1_field2_1`.
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("{}_1", field))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl Display for IndexDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.name(), self.index_type)
    }
}
