use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::compare::{bson_eq, compare_bson, lookup_path, same_bracket};
use bson::{doc, Bson, Document};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The primary key field of every stored document.
pub const DOC_ID: &str = "_id";

/// Comparison operator of a [`Filter::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn operator(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => "$gt",
            ComparisonMode::GreaterEqual => "$gte",
            ComparisonMode::Lesser => "$lt",
            ComparisonMode::LesserEqual => "$lte",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }
}

/// A regular expression predicate on one field.
///
/// The pattern is compiled when the filter is built. An invalid pattern is
/// logged and kept uncompiled; evaluating the filter then fails with
/// [`ErrorKind::FilterError`], and a store that evaluates filters itself will
/// report its own error for the same pattern.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    field_name: String,
    pattern: String,
    compiled: Option<Arc<Regex>>,
}

impl RegexFilter {
    pub(crate) fn new(field_name: String, pattern: String) -> Self {
        let compiled = match Regex::new(&pattern) {
            Ok(regex) => Some(Arc::new(regex)),
            Err(e) => {
                log::error!("Invalid regex pattern '{}': {}", pattern, e);
                None
            }
        };
        RegexFilter {
            field_name,
            pattern,
            compiled,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn is_match(&self, value: &str) -> RepoResult<bool> {
        match &self.compiled {
            Some(regex) => Ok(regex.is_match(value)),
            None => {
                log::error!("Cannot evaluate invalid regex pattern '{}'", self.pattern);
                Err(RepoError::new(
                    &format!("Invalid regex pattern '{}'", self.pattern),
                    ErrorKind::FilterError,
                ))
            }
        }
    }
}

impl PartialEq for RegexFilter {
    fn eq(&self, other: &Self) -> bool {
        self.field_name == other.field_name && self.pattern == other.pattern
    }
}

/// A boolean predicate over the fields of a stored document.
///
/// Filters are plain values: they are built with the fluent API in
/// [`field`](crate::filter::field) and the free functions of this module,
/// combined with [`Filter::and`], [`Filter::or`] and [`Filter::not`], and then
/// handed to a repository. Each store decides how to run them: the in-memory
/// store evaluates them with [`Filter::matches`], the MongoDB adapter sends
/// [`Filter::to_document`] to the server.
///
/// Field names are dotted paths (`"address.city"`). A path crossing an array
/// matches when any element matches, the same way the server behaves.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::filter::{field, all};
///
/// let adults = field("age").gte(18);
/// let big = field("name").starts_with("Big");
/// let both = adults.and(big);
///
/// assert_eq!(all().to_document(), bson::doc! {});
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value (or an array field contains it).
    Eq { field: String, value: Bson },
    /// Negation of [`Filter::Eq`].
    Ne { field: String, value: Bson },
    /// Range comparison within the value's type bracket.
    Compare {
        field: String,
        value: Bson,
        mode: ComparisonMode,
    },
    /// Field equals one of the values.
    In { field: String, values: Vec<Bson> },
    /// Field equals none of the values.
    NotIn { field: String, values: Vec<Bson> },
    /// String field matches a regular expression.
    Regex(RegexFilter),
    /// Field is present (or absent).
    Exists { field: String, exists: bool },
    /// All sub-filters match. An empty list matches everything.
    And(Vec<Filter>),
    /// Any sub-filter matches. An empty list matches nothing.
    Or(Vec<Filter>),
    /// The sub-filter does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// Combines this filter with another using logical AND.
    ///
    /// Nested AND nodes are flattened and [`Filter::All`] operands are dropped,
    /// so composing many filters keeps a shallow tree.
    pub fn and(self, filter: Filter) -> Self {
        match (self, filter) {
            (Filter::All, other) | (other, Filter::All) => other,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (other, Filter::And(mut right)) => {
                right.insert(0, other);
                Filter::And(right)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Combines this filter with another using logical OR.
    pub fn or(self, filter: Filter) -> Self {
        match (self, filter) {
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), other) => {
                left.push(other);
                Filter::Or(left)
            }
            (left, right) => Filter::Or(vec![left, right]),
        }
    }

    /// Negates this filter.
    pub fn not(self) -> Self {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Evaluates the filter against a document.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::FilterError`] when a regex node carries a pattern
    /// that failed to compile.
    pub fn matches(&self, document: &Document) -> RepoResult<bool> {
        match self {
            Filter::All => Ok(true),
            Filter::Eq { field, value } => Ok(eq_matches(document, field, value)),
            Filter::Ne { field, value } => Ok(!eq_matches(document, field, value)),
            Filter::Compare { field, value, mode } => {
                Ok(candidates(document, field).into_iter().any(|candidate| {
                    same_bracket(candidate, value) && mode.accepts(compare_bson(candidate, value))
                }))
            }
            Filter::In { field, values } => {
                Ok(values.iter().any(|value| eq_matches(document, field, value)))
            }
            Filter::NotIn { field, values } => {
                Ok(!values.iter().any(|value| eq_matches(document, field, value)))
            }
            Filter::Regex(regex) => {
                for candidate in candidates(document, regex.field_name()) {
                    if let Bson::String(text) = candidate {
                        if regex.is_match(text)? {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            Filter::Exists { field, exists } => {
                Ok(!lookup_path(document, field).is_empty() == *exists)
            }
            Filter::And(filters) => {
                for filter in filters {
                    if !filter.matches(document)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(filters) => {
                for filter in filters {
                    if filter.matches(document)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(filter) => Ok(!filter.matches(document)?),
        }
    }

    /// Translates the filter into a server-side query document.
    ///
    /// Every node maps to its query-language operator. `Not` is expressed with
    /// `$nor` since `$not` is only valid below a field. An empty `Or` maps to a
    /// condition no stored document satisfies (`_id` absent).
    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => Document::new(),
            Filter::Eq { field, value } => doc! { field.as_str(): value.clone() },
            Filter::Ne { field, value } => doc! { field.as_str(): { "$ne": value.clone() } },
            Filter::Compare { field, value, mode } => {
                let mut condition = Document::new();
                condition.insert(mode.operator(), value.clone());
                doc! { field.as_str(): condition }
            }
            Filter::In { field, values } => doc! { field.as_str(): { "$in": values.clone() } },
            Filter::NotIn { field, values } => {
                doc! { field.as_str(): { "$nin": values.clone() } }
            }
            Filter::Regex(regex) => {
                doc! { regex.field_name(): { "$regex": regex.pattern() } }
            }
            Filter::Exists { field, exists } => {
                doc! { field.as_str(): { "$exists": *exists } }
            }
            Filter::And(filters) => {
                if filters.is_empty() {
                    Document::new()
                } else {
                    let clauses: Vec<Bson> = filters
                        .iter()
                        .map(|filter| Bson::Document(filter.to_document()))
                        .collect();
                    doc! { "$and": clauses }
                }
            }
            Filter::Or(filters) => {
                if filters.is_empty() {
                    doc! { DOC_ID: { "$exists": false } }
                } else {
                    let clauses: Vec<Bson> = filters
                        .iter()
                        .map(|filter| Bson::Document(filter.to_document()))
                        .collect();
                    doc! { "$or": clauses }
                }
            }
            Filter::Not(filter) => doc! { "$nor": [filter.to_document()] },
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

/// Values at `field`, with arrays expanded one level.
fn candidates<'a>(document: &'a Document, field: &str) -> Vec<&'a Bson> {
    let mut result = Vec::new();
    for value in lookup_path(document, field) {
        if let Bson::Array(items) = value {
            result.extend(items.iter());
        }
        result.push(value);
    }
    result
}

fn eq_matches(document: &Document, field: &str, value: &Bson) -> bool {
    let found = lookup_path(document, field);
    if found.is_empty() {
        // a null comparison also matches a missing field
        return matches!(value, Bson::Null);
    }
    candidates(document, field)
        .into_iter()
        .any(|candidate| bson_eq(candidate, value))
}

/// Creates a filter that matches every document.
pub fn all() -> Filter {
    Filter::All
}

/// Creates a filter matching the document whose `_id` equals `id`.
pub fn by_id<T: Into<Bson>>(id: T) -> Filter {
    Filter::Eq {
        field: DOC_ID.to_string(),
        value: id.into(),
    }
}

/// Creates a filter matching documents that satisfy every filter in `filters`.
pub fn and(filters: Vec<Filter>) -> Filter {
    filters.into_iter().fold(Filter::All, Filter::and)
}

/// Creates a filter matching documents that satisfy any filter in `filters`.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}

/// Creates a filter matching documents that do not satisfy `filter`.
pub fn not(filter: Filter) -> Filter {
    filter.not()
}
