//! Textual renderer - the SQL string reported back to callers
//!
//! Values are inlined as literals. The output is for display and audit; the
//! executed query binds parameters instead.

use stockql_ir::{Literal, STOCKS_TABLE};

use crate::condition::{CompiledQuery, Condition, Predicate, LIKE_ESCAPE};

/// Render `SELECT * FROM stocks [WHERE ..] [ORDER BY ..] LIMIT n`
pub fn render_text(query: &CompiledQuery) -> String {
    let mut parts = vec![format!("SELECT * FROM {}", STOCKS_TABLE)];

    if !query.conditions.is_empty() {
        let predicates: Vec<String> = query.conditions.iter().map(render_condition).collect();
        parts.push(format!("WHERE {}", predicates.join(" AND ")));
    }

    if let Some((field, direction)) = query.order_by {
        parts.push(format!("ORDER BY {} {}", field.column(), direction.as_sql()));
    }

    parts.push(format!("LIMIT {}", query.limit));

    parts.join(" ")
}

fn render_condition(condition: &Condition) -> String {
    let column = condition.column();
    match &condition.predicate {
        Predicate::Compare(cmp, value) => {
            format!("{} {} {}", column, cmp.as_sql(), sql_literal(value))
        }
        Predicate::Between(low, high) => format!(
            "{} BETWEEN {} AND {}",
            column,
            sql_literal(low),
            sql_literal(high)
        ),
        Predicate::Contains { pattern } => format!(
            "{} ILIKE {} ESCAPE '{}'",
            condition.target(),
            quote(pattern),
            LIKE_ESCAPE
        ),
        Predicate::InSet(values) if values.is_empty() => "FALSE".to_string(),
        Predicate::InSet(values) => {
            let items: Vec<String> = values.iter().map(sql_literal).collect();
            format!("{} IN ({})", column, items.join(", "))
        }
    }
}

/// Numbers bare, strings single-quoted
pub fn sql_literal(value: &Literal) -> String {
    match value {
        Literal::Null => "NULL".to_string(),
        Literal::Bool(true) => "TRUE".to_string(),
        Literal::Bool(false) => "FALSE".to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Text(s) => quote(s),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockql_ir::{Direction, QueryIr};

    fn render(ir: &QueryIr) -> String {
        render_text(&CompiledQuery::from_ir(ir))
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(render(&QueryIr::new()), "SELECT * FROM stocks LIMIT 100");
    }

    #[test]
    fn test_single_comparison() {
        let ir = QueryIr::new().with_filter("price", "gt", json!(100));
        assert_eq!(render(&ir), "SELECT * FROM stocks WHERE price > 100 LIMIT 100");
    }

    #[test]
    fn test_full_query() {
        let ir = QueryIr::new()
            .with_filter("sector", "eq", json!("Technology"))
            .with_filter("volume", "gt", json!(1_000_000))
            .with_filter("price", "between", json!([50, 200.5]))
            .with_order_by("market_cap", Direction::Desc)
            .with_limit(10);

        assert_eq!(
            render(&ir),
            "SELECT * FROM stocks WHERE sector = 'Technology' AND volume > 1000000 \
             AND price BETWEEN 50 AND 200.5 ORDER BY market_cap DESC LIMIT 10"
        );
    }

    #[test]
    fn test_like_and_in() {
        let ir = QueryIr::new()
            .with_filter("company_name", "like", json!("bank"))
            .with_filter("symbol", "in", json!(["JPM", "GS"]));

        assert_eq!(
            render(&ir),
            "SELECT * FROM stocks WHERE company_name ILIKE '%bank%' ESCAPE '\\' \
             AND symbol IN ('JPM', 'GS') LIMIT 100"
        );
    }

    #[test]
    fn test_mismatched_operands_render_coerced() {
        let ir = QueryIr::new()
            .with_filter("price", "like", json!("19"))
            .with_filter("price", "eq", json!("cheap"))
            .with_filter("symbol", "eq", json!(5));

        assert_eq!(
            render(&ir),
            "SELECT * FROM stocks WHERE CAST(price AS VARCHAR) ILIKE '%19%' ESCAPE '\\' \
             AND price = NULL AND symbol = '5' LIMIT 100"
        );
    }

    #[test]
    fn test_empty_in_renders_false() {
        let ir = QueryIr::new().with_filter("symbol", "in", json!([]));
        assert_eq!(render(&ir), "SELECT * FROM stocks WHERE FALSE LIMIT 100");
    }

    #[test]
    fn test_unknown_order_by_omitted() {
        let ir = QueryIr::new().with_order_by("hype", Direction::Desc);
        assert_eq!(render(&ir), "SELECT * FROM stocks LIMIT 100");
    }

    #[test]
    fn test_dropped_clauses_leave_no_trace() {
        let ir = QueryIr::new()
            .with_filter("ebitda", "gt", json!(5))
            .with_filter("price", "between", json!([1]));
        assert_eq!(render(&ir), "SELECT * FROM stocks LIMIT 100");
    }

    #[test]
    fn test_literals() {
        assert_eq!(sql_literal(&Literal::Null), "NULL");
        assert_eq!(sql_literal(&Literal::Bool(true)), "TRUE");
        assert_eq!(sql_literal(&Literal::Float(0.25)), "0.25");
        assert_eq!(sql_literal(&Literal::Text("O'Reilly".into())), "'O''Reilly'");
    }
}
