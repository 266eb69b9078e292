use bson::Bson;

use super::{ComparisonMode, Filter, RegexFilter};

/// Creates a fluent filter builder for the specified field name.
///
/// # Arguments
///
/// * `field_name` - The name of the field to filter on; dotted paths address
///   nested fields
///
/// # Returns
///
/// A `FluentFilter` builder for constructing field-specific filters
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for constructing filters on a specific field.
///
/// Each method consumes the builder and returns a [`Filter`] that can be passed
/// to a repository directly or combined with other filters.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    /// Matches documents where the field equals `value`.
    #[inline]
    pub fn eq<T: Into<Bson>>(self, value: T) -> Filter {
        Filter::Eq {
            field: self.field_name,
            value: value.into(),
        }
    }

    /// Matches documents where the field does not equal `value`.
    #[inline]
    pub fn ne<T: Into<Bson>>(self, value: T) -> Filter {
        Filter::Ne {
            field: self.field_name,
            value: value.into(),
        }
    }

    /// Matches documents where the field is greater than `value`.
    #[inline]
    pub fn gt<T: Into<Bson>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    /// Matches documents where the field is greater than or equal to `value`.
    #[inline]
    pub fn gte<T: Into<Bson>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    /// Matches documents where the field is less than `value`.
    #[inline]
    pub fn lt<T: Into<Bson>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    /// Matches documents where the field is less than or equal to `value`.
    #[inline]
    pub fn lte<T: Into<Bson>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    /// Matches documents where the field lies in `[lower_bound, upper_bound]`.
    pub fn between<T: Into<Bson>>(self, lower_bound: T, upper_bound: T) -> Filter {
        let upper = FluentFilter {
            field_name: self.field_name.clone(),
        };
        self.gte(lower_bound).and(upper.lte(upper_bound))
    }

    /// Matches documents where the field equals one of `values`.
    pub fn in_array<I, T>(self, values: I) -> Filter
    where
        I: IntoIterator<Item = T>,
        T: Into<Bson>,
    {
        Filter::In {
            field: self.field_name,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches documents where the field equals none of `values`.
    pub fn not_in<I, T>(self, values: I) -> Filter
    where
        I: IntoIterator<Item = T>,
        T: Into<Bson>,
    {
        Filter::NotIn {
            field: self.field_name,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches documents where the string field matches the regex `pattern`.
    pub fn regex(self, pattern: &str) -> Filter {
        Filter::Regex(RegexFilter::new(self.field_name, pattern.to_string()))
    }

    /// Case-insensitive variant of [`FluentFilter::regex`].
    pub fn regex_case_insensitive(self, pattern: &str) -> Filter {
        Filter::Regex(RegexFilter::new(self.field_name, format!("(?i){}", pattern)))
    }

    /// Matches documents where the string field starts with `prefix`, taken literally.
    pub fn starts_with(self, prefix: &str) -> Filter {
        Filter::Regex(RegexFilter::new(
            self.field_name,
            format!("^{}", regex::escape(prefix)),
        ))
    }

    /// Matches documents that have the field, whatever its value.
    pub fn exists(self) -> Filter {
        Filter::Exists {
            field: self.field_name,
            exists: true,
        }
    }

    /// Matches documents that lack the field.
    pub fn not_exists(self) -> Filter {
        Filter::Exists {
            field: self.field_name,
            exists: false,
        }
    }

    fn compare(self, value: Bson, mode: ComparisonMode) -> Filter {
        Filter::Compare {
            field: self.field_name,
            value,
            mode,
        }
    }
}
