use bson::{Bson, Document};
use std::cmp::Ordering;

/// Sort rank of a BSON type, following the server's cross-type comparison order.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 12,
        Bson::DbPointer(_) => 13,
        Bson::MaxKey => 14,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn as_str(value: &Bson) -> Option<&str> {
    match value {
        Bson::String(s) => Some(s),
        Bson::Symbol(s) => Some(s),
        _ => None,
    }
}

/// Returns `true` when both values belong to the same comparison bracket.
///
/// Range operators only match values of the same bracket, so `{age: {$gt: 5}}`
/// never matches a string `age`.
pub(crate) fn same_bracket(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order over BSON values used for sorting and range comparisons.
pub(crate) fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        _ if rank_a == 2 => match (as_i64(a), as_i64(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => compare_f64(a, b),
        },
        _ if rank_a == 3 => as_str(a).cmp(&as_str(b)),
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        (Bson::Array(x), Bson::Array(y)) => compare_arrays(x, y),
        (Bson::Binary(x), Bson::Binary(y)) => x.bytes.cmp(&y.bytes),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        _ => Ordering::Equal,
    }
}

fn compare_f64(a: &Bson, b: &Bson) -> Ordering {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn compare_arrays(x: &[Bson], y: &[Bson]) -> Ordering {
    for (a, b) in x.iter().zip(y.iter()) {
        let ordering = compare_bson(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    x.len().cmp(&y.len())
}

fn compare_documents(x: &Document, y: &Document) -> Ordering {
    for ((key_a, a), (key_b, b)) in x.iter().zip(y.iter()) {
        let ordering = key_a.cmp(key_b).then_with(|| compare_bson(a, b));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    x.len().cmp(&y.len())
}

/// Equality with numeric widening: `Int32(1)`, `Int64(1)` and `Double(1.0)` are equal.
///
/// Two integers are compared exactly, a `Double` on either side widens both to `f64`.
pub(crate) fn bson_eq(a: &Bson, b: &Bson) -> bool {
    if let (Some(x), Some(y)) = (as_i64(a), as_i64(b)) {
        return x == y;
    }
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Bson::Null | Bson::Undefined, Bson::Null | Bson::Undefined) => true,
            (Bson::Array(x), Bson::Array(y)) => {
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| bson_eq(a, b))
            }
            (Bson::Document(x), Bson::Document(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((ka, a), (kb, b))| ka == kb && bson_eq(a, b))
            }
            _ => a == b,
        },
    }
}

/// Canonical string form of a key value, used by the in-memory store for its
/// primary and unique key maps. Numeric values share one form so `1` and `1.0`
/// collide the way they do on the server.
pub(crate) fn key_string(value: &Bson) -> String {
    match value {
        Bson::Int32(number) => format!("n:{}", number),
        Bson::Int64(number) => format!("n:{}", number),
        Bson::Double(number) if is_integral(*number) => format!("n:{}", *number as i64),
        Bson::Double(number) => format!("n:{}", number),
        _ => format!("{}:{}", type_rank(value), value),
    }
}

fn is_integral(number: f64) -> bool {
    number.fract() == 0.0 && number >= i64::MIN as f64 && number < i64::MAX as f64
}

/// Resolves a dotted field path against a document.
///
/// Arrays met along the path are traversed element-wise, so `tags.name` on
/// `{tags: [{name: "a"}, {name: "b"}]}` yields both names. A missing path
/// yields no values.
pub(crate) fn lookup_path<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let mut segments = path.split('.');
    let first = match segments.next() {
        Some(first) => first,
        None => return Vec::new(),
    };

    let mut current: Vec<&'a Bson> = match document.get(first) {
        Some(value) => vec![value],
        None => return Vec::new(),
    };

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Bson::Document(inner) => {
                    if let Some(found) = inner.get(segment) {
                        next.push(found);
                    }
                }
                Bson::Array(items) => {
                    if let Ok(index) = segment.parse::<usize>() {
                        if let Some(found) = items.get(index) {
                            next.push(found);
                        }
                    } else {
                        for item in items {
                            if let Bson::Document(inner) = item {
                                if let Some(found) = inner.get(segment) {
                                    next.push(found);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}
