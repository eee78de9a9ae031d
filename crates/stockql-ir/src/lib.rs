//! stockql Intermediate Representation (IR)
//!
//! Canonical structured form of a stock screening question. The interpreter
//! produces it from free-form model output via [`QueryIr::from_json`]; the
//! compiler and renderers consume it.
//!
//! Clauses are carried verbatim: field and operator names are only resolved
//! against [`Field`] and [`Operator`] at compile time, where unknown names are
//! dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

mod record;
mod schema;

pub use record::Record;
pub use schema::{Field, FieldKind, Operator, STOCKS_TABLE};

/// Row limit applied when the interpreter omits one
pub const DEFAULT_LIMIT: u32 = 100;

/// Upper bound on any row limit
pub const MAX_LIMIT: u32 = 1000;

/// Structured stock query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIr {
    #[serde(default)]
    pub filters: Vec<FilterClause>,

    #[serde(default)]
    pub order_by: Option<OrderBy>,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for QueryIr {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            order_by: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QueryIr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an arbitrary JSON document into an IR.
    ///
    /// Never fails: a `filters` value that is not an array becomes empty, filter
    /// entries without string `field`/`operator` keys are skipped, a malformed
    /// `order_by` becomes `None` and the limit falls back to [`DEFAULT_LIMIT`]
    /// unless it is a positive integer (clamped to [`MAX_LIMIT`]).
    pub fn from_json(value: &Value) -> Self {
        let filters = match value.get("filters") {
            Some(Value::Array(items)) => items.iter().filter_map(FilterClause::from_json).collect(),
            _ => Vec::new(),
        };

        let order_by = value.get("order_by").and_then(OrderBy::from_json);

        let limit = value
            .get("limit")
            .and_then(limit_from_json)
            .unwrap_or(DEFAULT_LIMIT);

        Self {
            filters,
            order_by,
            limit,
        }
    }

    pub fn with_filter(mut self, field: &str, operator: &str, value: Value) -> Self {
        self.filters.push(FilterClause::new(field, operator, value));
        self
    }

    pub fn with_order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Limit actually applied to a query: the IR is publicly constructible, so
    /// the bounds are enforced again here.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Calculate fingerprint (SHA-256) of the canonical JSON form
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("IR should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn limit_from_json(value: &Value) -> Option<u32> {
    let raw = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f.fract() != 0.0 || f < 1.0 {
                return None;
            }
            f as u64
        }
    };

    if raw == 0 {
        return None;
    }
    Some(raw.min(MAX_LIMIT as u64) as u32)
}

/// One `{field, operator, value}` condition as emitted by the interpreter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl FilterClause {
    pub fn new(field: &str, operator: &str, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        let field = value.get("field")?.as_str()?;
        let operator = value.get("operator")?.as_str()?;
        let operand = value.get("value").cloned().unwrap_or(Value::Null);
        Some(Self::new(field, operator, operand))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Anything other than `desc` (case-insensitive) sorts ascending
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    fn from_json(value: &Value) -> Option<Self> {
        let field = value.get("field")?.as_str()?;
        let direction = value
            .get("direction")
            .and_then(Value::as_str)
            .map(Direction::parse)
            .unwrap_or_default();
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }

    /// The sort column, if the field is recognized
    pub fn resolve(&self) -> Option<(Field, Direction)> {
        Field::from_name(&self.field).map(|f| (f, self.direction))
    }
}

/// Scalar operand value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Literal {
    /// Scalar JSON values only; arrays and objects yield `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Literal::Int)
                .or_else(|| n.as_f64().map(Literal::Float)),
            Value::String(s) => Some(Literal::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert to the value family of a column so comparisons never fail on
    /// a type mismatch. Text that does not read as a finite number becomes
    /// `Null` against numeric columns, which matches no row.
    pub fn coerce_to(self, kind: FieldKind) -> Self {
        match (kind, self) {
            (_, Literal::Null) => Literal::Null,
            (FieldKind::Text, Literal::Text(s)) => Literal::Text(s),
            (FieldKind::Text, Literal::Int(i)) => Literal::Text(i.to_string()),
            (FieldKind::Text, Literal::Float(f)) => Literal::Text(f.to_string()),
            (FieldKind::Text, Literal::Bool(b)) => Literal::Text(b.to_string()),
            (_, Literal::Int(i)) => Literal::Int(i),
            (_, Literal::Float(f)) => Literal::Float(f),
            (_, Literal::Bool(b)) => Literal::Int(i64::from(b)),
            (_, Literal::Text(s)) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Literal::Float(f),
                _ => Literal::Null,
            },
        }
    }

    /// Text form used for substring matching; only strings and numbers qualify
    pub fn as_search_text(&self) -> Option<String> {
        match self {
            Literal::Text(s) => Some(s.clone()),
            Literal::Int(i) => Some(i.to_string()),
            Literal::Float(f) => Some(f.to_string()),
            Literal::Null | Literal::Bool(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_defaults() {
        let ir = QueryIr::from_json(&json!({}));
        assert!(ir.filters.is_empty());
        assert!(ir.order_by.is_none());
        assert_eq!(ir.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_non_array_filters_coerced_to_empty() {
        let ir = QueryIr::from_json(&json!({"filters": {"field": "price"}, "limit": 5}));
        assert!(ir.filters.is_empty());
        assert_eq!(ir.limit, 5);

        let ir = QueryIr::from_json(&json!({"filters": "price > 100"}));
        assert!(ir.filters.is_empty());
    }

    #[test]
    fn test_filters_kept_verbatim_including_unknown_fields() {
        let ir = QueryIr::from_json(&json!({
            "filters": [
                {"field": "price", "operator": "gt", "value": 100},
                {"field": "ebitda", "operator": "gt", "value": 5},
                {"field": "sector", "operator": "eq"},
                "not a clause"
            ]
        }));

        assert_eq!(ir.filters.len(), 3);
        assert_eq!(ir.filters[0], FilterClause::new("price", "gt", json!(100)));
        assert_eq!(ir.filters[1].field, "ebitda");
        assert_eq!(ir.filters[2].value, Value::Null);
    }

    #[test]
    fn test_order_by_normalization() {
        let ir = QueryIr::from_json(&json!({"order_by": {"field": "market_cap", "direction": "DESC"}}));
        assert_eq!(
            ir.order_by,
            Some(OrderBy {
                field: "market_cap".to_string(),
                direction: Direction::Desc
            })
        );

        let ir = QueryIr::from_json(&json!({"order_by": {"field": "price"}}));
        assert_eq!(ir.order_by.unwrap().direction, Direction::Asc);

        let ir = QueryIr::from_json(&json!({"order_by": "price"}));
        assert!(ir.order_by.is_none());
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(QueryIr::from_json(&json!({"limit": 5000})).limit, MAX_LIMIT);
        assert_eq!(QueryIr::from_json(&json!({"limit": 0})).limit, DEFAULT_LIMIT);
        assert_eq!(QueryIr::from_json(&json!({"limit": -3})).limit, DEFAULT_LIMIT);
        assert_eq!(QueryIr::from_json(&json!({"limit": 10.0})).limit, 10);
        assert_eq!(QueryIr::from_json(&json!({"limit": "ten"})).limit, DEFAULT_LIMIT);
        assert_eq!(QueryIr::new().with_limit(0).effective_limit(), 1);
        assert_eq!(QueryIr::new().with_limit(9999).effective_limit(), MAX_LIMIT);
    }

    #[test]
    fn test_serialized_shape() {
        let ir = QueryIr::new()
            .with_filter("price", "gt", json!(100))
            .with_order_by("market_cap", Direction::Desc);

        let value = serde_json::to_value(&ir).unwrap();
        assert_eq!(
            value,
            json!({
                "filters": [{"field": "price", "operator": "gt", "value": 100}],
                "order_by": {"field": "market_cap", "direction": "desc"},
                "limit": 100
            })
        );
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = QueryIr::new().with_filter("sector", "eq", json!("Energy"));
        let b = a.clone();
        let c = QueryIr::new().with_filter("sector", "eq", json!("Technology"));

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_literal_coercion_by_field_kind() {
        let text = |s: &str| Literal::Text(s.to_string());

        assert_eq!(text("150").coerce_to(FieldKind::Number), Literal::Float(150.0));
        assert_eq!(text(" 2.5 ").coerce_to(FieldKind::Integer), Literal::Float(2.5));
        assert_eq!(text("cheap").coerce_to(FieldKind::Number), Literal::Null);
        assert_eq!(text("inf").coerce_to(FieldKind::Number), Literal::Null);
        assert_eq!(Literal::Bool(true).coerce_to(FieldKind::Number), Literal::Int(1));
        assert_eq!(Literal::Int(7).coerce_to(FieldKind::Integer), Literal::Int(7));

        assert_eq!(Literal::Int(5).coerce_to(FieldKind::Text), text("5"));
        assert_eq!(Literal::Float(0.5).coerce_to(FieldKind::Text), text("0.5"));
        assert_eq!(text("AAPL").coerce_to(FieldKind::Text), text("AAPL"));
        assert_eq!(Literal::Null.coerce_to(FieldKind::Text), Literal::Null);
    }

    #[test]
    fn test_literal_from_json() {
        assert_eq!(Literal::from_json(&json!(3)), Some(Literal::Int(3)));
        assert_eq!(Literal::from_json(&json!(2.5)), Some(Literal::Float(2.5)));
        assert_eq!(Literal::from_json(&json!("x")), Some(Literal::Text("x".into())));
        assert_eq!(Literal::from_json(&json!(null)), Some(Literal::Null));
        assert_eq!(Literal::from_json(&json!([1, 2])), None);
        assert_eq!(Literal::from_json(&json!({"a": 1})), None);
    }
}
