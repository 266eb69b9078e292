use bson::{Bson, Document};

/// Specifies the direction for sorting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

/// Options for controlling find operations on documents.
///
/// `FindOptions` carries sorting and paging for a query. Stores apply them
/// after filtering: sort first, then skip, then limit.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::store::{FindOptions, SortOrder};
///
/// // Create options with sorting, skip, and limit
/// let options = FindOptions::new()
///     .sort_by("created", SortOrder::Descending)
///     .skip(10)
///     .limit(20);
///
/// // Use convenience functions
/// let options = order_by("name", SortOrder::Ascending);
/// let options = skip_by(5);
/// let options = limit_to(100);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) sort_by: Vec<(String, SortOrder)>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
}

/// Creates `FindOptions` with sorting by a field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips a number of results.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` that limits the number of results.
///
/// Combined with skip for pagination: skip(10).limit(20) returns results 11-30.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    /// Creates a new `FindOptions` with default settings.
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key. Keys apply in the order they are added.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn sort_fields(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    /// Sort document in server form (`{field: 1 | -1}`), or `None` when unsorted.
    pub fn sort_document(&self) -> Option<Document> {
        if self.sort_by.is_empty() {
            return None;
        }
        let mut document = Document::new();
        for (field, order) in &self.sort_by {
            let direction = match order {
                SortOrder::Ascending => 1,
                SortOrder::Descending => -1,
            };
            document.insert(field.clone(), Bson::Int32(direction));
        }
        Some(document)
    }
}
