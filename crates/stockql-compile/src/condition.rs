//! Condition compiler - IR filter clauses to typed predicates
//!
//! Both renderers consume the output of [`compile`], so the audit string and
//! the executed query can never disagree on which predicates apply.
//!
//! Invalid clauses are dropped rather than reported: an unknown field or
//! operator, or an operand of the wrong shape, simply contributes no condition.

use stockql_ir::{Direction, Field, FilterClause, Literal, Operator, QueryIr};

/// Escape character used for substring patterns
pub const LIKE_ESCAPE: char = '\\';

/// Scalar comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Comparison, Literal),
    Between(Literal, Literal),
    /// Case-insensitive substring match; `pattern` is already escaped and
    /// wrapped in `%` wildcards
    Contains { pattern: String },
    /// Set membership; an empty set matches no rows
    InSet(Vec<Literal>),
}

/// A predicate bound to a recognized field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: Field,
    pub predicate: Predicate,
}

impl Condition {
    pub fn column(&self) -> &'static str {
        self.field.column()
    }

    /// Left-hand side of the predicate: the column, or its text form for
    /// substring matches on numeric columns
    pub fn target(&self) -> &'static str {
        match self.predicate {
            Predicate::Contains { .. } => self.field.search_expr(),
            _ => self.field.column(),
        }
    }
}

/// Everything a renderer needs: conditions, validated sort and bounded limit
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub conditions: Vec<Condition>,
    pub order_by: Option<(Field, Direction)>,
    pub limit: u32,
}

impl CompiledQuery {
    pub fn from_ir(ir: &QueryIr) -> Self {
        Self {
            conditions: compile(&ir.filters),
            order_by: ir.order_by.as_ref().and_then(|o| o.resolve()),
            limit: ir.effective_limit(),
        }
    }
}

/// Compile filter clauses in order, skipping any that do not validate
pub fn compile(filters: &[FilterClause]) -> Vec<Condition> {
    filters
        .iter()
        .filter_map(|clause| {
            let condition = compile_clause(clause);
            if condition.is_none() {
                tracing::debug!(
                    field = %clause.field,
                    operator = %clause.operator,
                    value = %clause.value,
                    "dropping filter clause"
                );
            }
            condition
        })
        .collect()
}

/// Compile one clause. Scalar operands are coerced to the field's value
/// family, so a mismatched value narrows the result instead of failing.
pub fn compile_clause(clause: &FilterClause) -> Option<Condition> {
    let field = Field::from_name(&clause.field)?;
    let operator = Operator::from_name(&clause.operator)?;
    let value = &clause.value;
    let scalar = |v: &serde_json::Value| Literal::from_json(v).map(|l| l.coerce_to(field.kind()));

    let predicate = match operator {
        Operator::Eq => Predicate::Compare(Comparison::Eq, scalar(value)?),
        Operator::Gt => Predicate::Compare(Comparison::Gt, scalar(value)?),
        Operator::Gte => Predicate::Compare(Comparison::Gte, scalar(value)?),
        Operator::Lt => Predicate::Compare(Comparison::Lt, scalar(value)?),
        Operator::Lte => Predicate::Compare(Comparison::Lte, scalar(value)?),
        Operator::Between => match value.as_array().map(Vec::as_slice) {
            Some([low, high]) => Predicate::Between(scalar(low)?, scalar(high)?),
            _ => return None,
        },
        Operator::Like => {
            let text = Literal::from_json(value)?.as_search_text()?;
            Predicate::Contains {
                pattern: contains_pattern(&text),
            }
        }
        Operator::In => {
            let items = value.as_array()?;
            let values = items.iter().map(scalar).collect::<Option<Vec<_>>>()?;
            Predicate::InSet(values)
        }
    };

    Some(Condition { field, predicate })
}

/// `%text%` with `%`, `_` and the escape character itself escaped
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
