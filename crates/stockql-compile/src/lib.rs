//! Compiles stockql IR into predicates and renders the audit SQL string
//!
//! The executable form lives in `stockql-duck`, which consumes the same
//! [`CompiledQuery`].

pub mod condition;
pub mod text;

pub use condition::{
    compile, compile_clause, contains_pattern, CompiledQuery, Comparison, Condition, Predicate,
    LIKE_ESCAPE,
};
pub use text::{render_text, sql_literal};

/// Compile an IR and render its audit SQL in one step
pub fn to_sql(ir: &stockql_ir::QueryIr) -> String {
    render_text(&CompiledQuery::from_ir(ir))
}
