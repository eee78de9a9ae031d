//! Native renderer - compiled conditions onto the parameterized builder

use duckdb::types::Value;
use stockql_compile::{CompiledQuery, Predicate};
use stockql_ir::{Literal, STOCKS_TABLE};

use crate::builder::{BoundQuery, SelectBuilder};

/// Columns read back for each record, in materialization order
pub const RECORD_COLUMNS: [&str; 10] = [
    "symbol",
    "company_name",
    "sector",
    "industry",
    "price",
    "market_cap",
    "volume",
    "pe_ratio",
    "dividend_yield",
    "created_at",
];

pub fn render_native(query: &CompiledQuery) -> BoundQuery {
    let mut builder = SelectBuilder::new(STOCKS_TABLE);
    builder.columns(&RECORD_COLUMNS);

    for condition in &query.conditions {
        let column = condition.column();
        match &condition.predicate {
            Predicate::Compare(cmp, value) => {
                builder.compare(column, *cmp, to_value(value));
            }
            Predicate::Between(low, high) => {
                builder.between(column, to_value(low), to_value(high));
            }
            Predicate::Contains { pattern } => {
                builder.ilike(condition.target(), pattern.clone());
            }
            Predicate::InSet(values) => {
                builder.in_set(column, values.iter().map(to_value).collect());
            }
        }
    }

    if let Some((field, direction)) = query.order_by {
        builder.order_by(field.column(), direction);
    }

    builder.limit(query.limit).build()
}

pub fn to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Boolean(*b),
        Literal::Int(i) => Value::BigInt(*i),
        Literal::Float(f) => Value::Double(*f),
        Literal::Text(s) => Value::Text(s.clone()),
    }
}
