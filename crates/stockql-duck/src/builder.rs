//! Parameterized SELECT builder for DuckDB
//!
//! Identifiers only ever come from `&'static str` column names; every value
//! goes through a `?` placeholder.

use duckdb::types::Value;
use stockql_compile::{Comparison, LIKE_ESCAPE};
use stockql_ir::Direction;

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    predicates: Vec<String>,
    params: Vec<Value>,
    order_by: Option<(&'static str, Direction)>,
    limit: Option<u32>,
}

impl SelectBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            predicates: Vec::new(),
            params: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Project these columns instead of `*`
    pub fn columns(&mut self, columns: &[&'static str]) -> &mut Self {
        self.columns.extend_from_slice(columns);
        self
    }

    pub fn compare(&mut self, column: &'static str, op: Comparison, value: Value) -> &mut Self {
        self.predicates.push(format!("{} {} ?", column, op.as_sql()));
        self.params.push(value);
        self
    }

    pub fn between(&mut self, column: &'static str, low: Value, high: Value) -> &mut Self {
        self.predicates.push(format!("{} BETWEEN ? AND ?", column));
        self.params.push(low);
        self.params.push(high);
        self
    }

    /// Case-insensitive LIKE; `pattern` must already be escaped with [`LIKE_ESCAPE`]
    pub fn ilike(&mut self, column: &'static str, pattern: String) -> &mut Self {
        self.predicates
            .push(format!("{} ILIKE ? ESCAPE '{}'", column, LIKE_ESCAPE));
        self.params.push(Value::Text(pattern));
        self
    }

    /// Set membership; an empty set becomes a predicate that matches nothing
    pub fn in_set(&mut self, column: &'static str, values: Vec<Value>) -> &mut Self {
        if values.is_empty() {
            self.predicates.push("FALSE".to_string());
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.predicates.push(format!("{} IN ({})", column, placeholders));
        self.params.extend(values);
        self
    }

    pub fn order_by(&mut self, column: &'static str, direction: Direction) -> &mut Self {
        self.order_by = Some((column, direction));
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> BoundQuery {
        let projection = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", projection, self.table);

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }
        if let Some((column, direction)) = self.order_by {
            sql.push_str(&format!(" ORDER BY {} {}", column, direction.as_sql()));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        BoundQuery {
            sql,
            params: self.params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_select() {
        let query = SelectBuilder::new("stocks").build();
        assert_eq!(query.sql, "SELECT * FROM stocks");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_placeholders_and_params_line_up() {
        let query = SelectBuilder::new("stocks")
            .columns(&["symbol", "price"])
            .compare("price", Comparison::Gte, Value::BigInt(10))
            .between("volume", Value::BigInt(1), Value::BigInt(5))
            .in_set(
                "symbol",
                vec![Value::Text("A".into()), Value::Text("B".into())],
            )
            .order_by("price", Direction::Desc)
            .limit(3)
            .build();

        assert_eq!(
            query.sql,
            "SELECT symbol, price FROM stocks WHERE price >= ? AND volume BETWEEN ? AND ? \
             AND symbol IN (?, ?) ORDER BY price DESC LIMIT 3"
        );
        assert_eq!(query.sql.matches('?').count(), query.params.len());
    }

    #[test]
    fn test_empty_in_set_binds_nothing() {
        let query = SelectBuilder::new("stocks").in_set("symbol", vec![]).build();
        assert_eq!(query.sql, "SELECT * FROM stocks WHERE FALSE");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_ilike_binds_pattern() {
        let query = SelectBuilder::new("stocks")
            .ilike("company_name", "%bank%".to_string())
            .build();
        assert_eq!(
            query.sql,
            "SELECT * FROM stocks WHERE company_name ILIKE ? ESCAPE '\\'"
        );
        assert_eq!(query.params, vec![Value::Text("%bank%".into())]);
    }
}
