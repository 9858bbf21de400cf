//! Filter predicates and ordering for query sets
//!
//! Conditions are declarative; a query source translates them into its own
//! dialect. [`FilterCondition::matches`] evaluates a condition against a
//! JSON row for sources that keep rows as documents, such as
//! [`MemoryStore`](super::MemoryStore).
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::query::{FilterCondition, OrderDirection};
//! use serde_json::json;
//!
//! let published = FilterCondition::eq("status", "published");
//! let popular = FilterCondition::gte("views", 100_i64);
//!
//! let row = json!({ "status": "published", "views": 250 });
//! assert!(published.matches(&row));
//! assert!(popular.matches(&row));
//! assert_eq!(OrderDirection::Descending.to_string(), "desc");
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl OrderDirection {
    /// Parse `asc`/`desc` (case-insensitive), defaulting to ascending
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") || raw.eq_ignore_ascii_case("descending") {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// SQL-style pattern, `%` matches any run and `_` one character;
    /// `\` makes the next character literal
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Right-hand side of a filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    StringList(Vec<String>),
    IntegerList(Vec<i64>),
    Null,
}

impl FilterValue {
    /// JSON form used when comparing against document rows
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::from(s.as_str()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::Boolean(b) => Value::from(*b),
            Self::Timestamp(ts) => Value::from(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::StringList(list) => Value::from(list.clone()),
            Self::IntegerList(list) => Value::from(list.clone()),
            Self::Null => Value::Null,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

/// A single `field <op> value` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// Pattern match, e.g. `%rust%`
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// Substring match on untrusted text; wildcards in `text` are literal
    pub fn contains(field: impl Into<String>, text: &str) -> Self {
        Self::like(field, format!("%{}%", escape_like(text)))
    }

    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::StringList(values))
    }

    pub fn in_integers(field: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::IntegerList(values))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }

    /// Evaluate against a JSON object row
    ///
    /// A missing field is treated as null. Comparisons involving null are
    /// false, as in SQL.
    pub fn matches(&self, row: &Value) -> bool {
        let actual = row.get(&self.field).unwrap_or(&Value::Null);

        match self.operator {
            FilterOperator::IsNull => actual.is_null(),
            FilterOperator::IsNotNull => !actual.is_null(),
            _ if actual.is_null() => false,
            FilterOperator::Equal => json_eq(actual, &self.value.to_json()),
            FilterOperator::NotEqual => !json_eq(actual, &self.value.to_json()),
            FilterOperator::GreaterThan => {
                compare_json(actual, &self.value.to_json()) == Some(Ordering::Greater)
            }
            FilterOperator::GreaterThanOrEqual => matches!(
                compare_json(actual, &self.value.to_json()),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => {
                compare_json(actual, &self.value.to_json()) == Some(Ordering::Less)
            }
            FilterOperator::LessThanOrEqual => matches!(
                compare_json(actual, &self.value.to_json()),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (actual.as_str(), &self.value) {
                (Some(text), FilterValue::String(pattern)) => like_match(text, pattern),
                _ => false,
            },
            FilterOperator::In => match self.value.to_json() {
                Value::Array(candidates) => candidates.iter().any(|c| json_eq(actual, c)),
                other => json_eq(actual, &other),
            },
        }
    }
}

/// Equality that treats integers and floats as numbers
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total-enough ordering over scalar JSON values
///
/// Values of different kinds are incomparable, except null which sorts
/// before everything.
pub(crate) fn compare_json(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Escape `%`, `_` and `\` so `raw` matches only itself in a LIKE pattern
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Iterative wildcard match, linear in `text` for each pattern position
///
/// On a mismatch after a `%`, the match resumes one character past where
/// the last `%` started consuming text.
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                backtrack = Some((p, t));
            }
            Some('_') => {
                t += 1;
                p += 1;
            }
            Some('\\') if pattern.get(p + 1) == Some(&text[t]) => {
                t += 1;
                p += 2;
            }
            Some(c) if *c != '\\' && *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((resume_p, resume_t)) => {
                    p = resume_p;
                    t = resume_t + 1;
                    backtrack = Some((resume_p, resume_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": 3,
            "title": "Learning Rust",
            "views": 120,
            "rating": 4.5,
            "published": true,
            "deleted_at": null
        })
    }

    #[test]
    fn test_order_direction_parse() {
        assert_eq!(OrderDirection::parse("desc"), OrderDirection::Descending);
        assert_eq!(OrderDirection::parse("DESC"), OrderDirection::Descending);
        assert_eq!(OrderDirection::parse("asc"), OrderDirection::Ascending);
        assert_eq!(OrderDirection::parse("sideways"), OrderDirection::Ascending);
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(FilterOperator::GreaterThanOrEqual.to_string(), ">=");
        assert_eq!(FilterOperator::IsNotNull.to_string(), "IS NOT NULL");
    }

    #[test]
    fn test_equality_across_number_kinds() {
        assert!(FilterCondition::eq("views", 120_i64).matches(&row()));
        assert!(FilterCondition::eq("views", 120.0_f64).matches(&row()));
        assert!(!FilterCondition::eq("views", 121_i64).matches(&row()));
        assert!(FilterCondition::ne("views", 121_i64).matches(&row()));
    }

    #[test]
    fn test_range_comparisons() {
        assert!(FilterCondition::gt("views", 100_i64).matches(&row()));
        assert!(FilterCondition::gte("views", 120_i64).matches(&row()));
        assert!(!FilterCondition::lt("views", 120_i64).matches(&row()));
        assert!(FilterCondition::lte("rating", 4.5_f64).matches(&row()));
    }

    #[test]
    fn test_comparisons_with_mismatched_kinds_are_false() {
        assert!(!FilterCondition::gt("title", 1_i64).matches(&row()));
        assert!(!FilterCondition::lt("title", 1_i64).matches(&row()));
    }

    #[test]
    fn test_like_patterns() {
        assert!(FilterCondition::like("title", "%Rust").matches(&row()));
        assert!(FilterCondition::like("title", "Learning%").matches(&row()));
        assert!(FilterCondition::like("title", "%arn%").matches(&row()));
        assert!(FilterCondition::like("title", "Learning _ust").matches(&row()));
        assert!(!FilterCondition::like("title", "rust").matches(&row()));
        assert!(FilterCondition::like("title", "%").matches(&row()));
        assert!(FilterCondition::like("title", "L%n%t").matches(&row()));
        assert!(!FilterCondition::like("title", "L%n%x").matches(&row()));
        assert!(!FilterCondition::like("title", "Learning Rust_").matches(&row()));
    }

    #[test]
    fn test_contains_treats_wildcards_literally() {
        let doc = json!({ "title": "100% off_road \\ fun" });
        assert!(FilterCondition::contains("title", "0% off_").matches(&doc));
        assert!(FilterCondition::contains("title", "\\").matches(&doc));
        assert!(!FilterCondition::contains("title", "%%").matches(&row()));
        assert!(!FilterCondition::contains("title", "_").matches(&row()));
        assert!(FilterCondition::contains("title", "Rust").matches(&row()));
        assert_eq!(escape_like("a%b_c"), "a\\%b\\_c");
    }

    #[test]
    fn test_like_with_many_wildcards_finishes_quickly() {
        let doc = json!({ "title": "a".repeat(4_000) });
        let pattern = format!("{}x%", "%".repeat(64));

        let started = std::time::Instant::now();
        assert!(!FilterCondition::like("title", pattern).matches(&doc));
        assert!(FilterCondition::like("title", "%a%a%a%a%a%a%a%a%a%a%a%a%").matches(&doc));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_in_lists() {
        assert!(FilterCondition::in_integers("id", vec![1, 2, 3]).matches(&row()));
        assert!(!FilterCondition::in_integers("id", vec![4, 5]).matches(&row()));
        assert!(FilterCondition::in_strings(
            "title",
            vec!["Other".to_string(), "Learning Rust".to_string()]
        )
        .matches(&row()));
    }

    #[test]
    fn test_null_checks_and_missing_fields() {
        assert!(FilterCondition::is_null("deleted_at").matches(&row()));
        assert!(FilterCondition::is_null("missing").matches(&row()));
        assert!(!FilterCondition::is_not_null("deleted_at").matches(&row()));
        assert!(FilterCondition::is_not_null("title").matches(&row()));
    }

    #[test]
    fn test_null_never_equals() {
        assert!(!FilterCondition::eq("deleted_at", "x").matches(&row()));
        assert!(!FilterCondition::ne("deleted_at", "x").matches(&row()));
    }

    #[test]
    fn test_boolean_equality() {
        assert!(FilterCondition::eq("published", true).matches(&row()));
        assert!(!FilterCondition::eq("published", false).matches(&row()));
    }

    #[test]
    fn test_timestamp_comparison() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let doc = json!({ "created_at": "2024-06-01T00:00:00Z" });
        assert!(FilterCondition::gt("created_at", ts).matches(&doc));
    }

    #[test]
    fn test_compare_json_null_sorts_first() {
        assert_eq!(
            compare_json(&Value::Null, &json!(1)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_json(&json!("a"), &json!(1)), None);
    }
}
