//! Fixed catalog of the `stocks` table: queryable fields and filter operators

use serde::{Deserialize, Serialize};

/// Table every query runs against
pub const STOCKS_TABLE: &str = "stocks";

/// Value family of a field, used to describe the schema to the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
        }
    }
}

/// A recognized stock attribute.
///
/// Names coming from the IR are resolved through [`Field::from_name`]; anything
/// that does not resolve is not a field and never reaches SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Symbol,
    CompanyName,
    Sector,
    Industry,
    Price,
    MarketCap,
    Volume,
    PeRatio,
    DividendYield,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Symbol,
        Field::CompanyName,
        Field::Sector,
        Field::Industry,
        Field::Price,
        Field::MarketCap,
        Field::Volume,
        Field::PeRatio,
        Field::DividendYield,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "symbol" => Some(Field::Symbol),
            "company_name" => Some(Field::CompanyName),
            "sector" => Some(Field::Sector),
            "industry" => Some(Field::Industry),
            "price" => Some(Field::Price),
            "market_cap" => Some(Field::MarketCap),
            "volume" => Some(Field::Volume),
            "pe_ratio" => Some(Field::PeRatio),
            "dividend_yield" => Some(Field::DividendYield),
            _ => None,
        }
    }

    /// Name used in the IR
    pub fn name(self) -> &'static str {
        match self {
            Field::Symbol => "symbol",
            Field::CompanyName => "company_name",
            Field::Sector => "sector",
            Field::Industry => "industry",
            Field::Price => "price",
            Field::MarketCap => "market_cap",
            Field::Volume => "volume",
            Field::PeRatio => "pe_ratio",
            Field::DividendYield => "dividend_yield",
        }
    }

    /// Storage column backing this field
    pub fn column(self) -> &'static str {
        match self {
            Field::Symbol => "symbol",
            Field::CompanyName => "company_name",
            Field::Sector => "sector",
            Field::Industry => "industry",
            Field::Price => "price",
            Field::MarketCap => "market_cap",
            Field::Volume => "volume",
            Field::PeRatio => "pe_ratio",
            Field::DividendYield => "dividend_yield",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Symbol | Field::CompanyName | Field::Sector | Field::Industry => FieldKind::Text,
            Field::Volume => FieldKind::Integer,
            Field::Price | Field::MarketCap | Field::PeRatio | Field::DividendYield => {
                FieldKind::Number
            }
        }
    }

    /// Expression substring search runs against; numeric columns are
    /// matched through their text form
    pub fn search_expr(self) -> &'static str {
        match self {
            Field::Price => "CAST(price AS VARCHAR)",
            Field::MarketCap => "CAST(market_cap AS VARCHAR)",
            Field::Volume => "CAST(volume AS VARCHAR)",
            Field::PeRatio => "CAST(pe_ratio AS VARCHAR)",
            Field::DividendYield => "CAST(dividend_yield AS VARCHAR)",
            Field::Symbol | Field::CompanyName | Field::Sector | Field::Industry => self.column(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Field::Symbol => "Stock ticker symbol",
            Field::CompanyName => "Company name",
            Field::Sector => "Business sector",
            Field::Industry => "Industry type",
            Field::Price => "Stock price",
            Field::MarketCap => "Market capitalization",
            Field::Volume => "Trading volume",
            Field::PeRatio => "Price-to-earnings ratio",
            Field::DividendYield => "Dividend yield percentage",
        }
    }
}

/// Filter operators the interpreter may emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Like,
    In,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Between,
        Operator::Like,
        Operator::In,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Operator::Eq),
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            "between" => Some(Operator::Between),
            "like" => Some(Operator::Like),
            "in" => Some(Operator::In),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::Like => "like",
            Operator::In => "in",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operator::Eq => "equals",
            Operator::Gt => "greater than",
            Operator::Gte => "greater than or equal",
            Operator::Lt => "less than",
            Operator::Lte => "less than or equal",
            Operator::Between => "value is between two numbers (use array [min, max])",
            Operator::Like => "contains text (for strings)",
            Operator::In => "value is in a list (use array)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_resolve_back() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("ebitda"), None);
        assert_eq!(Field::from_name("Price"), None);
    }

    #[test]
    fn test_operator_names_resolve_back() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.name()), Some(op));
        }
        assert_eq!(Operator::from_name("ne"), None);
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(Field::Sector.kind(), FieldKind::Text);
        assert_eq!(Field::Volume.kind(), FieldKind::Integer);
        assert_eq!(Field::MarketCap.kind(), FieldKind::Number);
    }

    #[test]
    fn test_search_expr_casts_numeric_columns() {
        assert_eq!(Field::Sector.search_expr(), "sector");
        assert_eq!(Field::Price.search_expr(), "CAST(price AS VARCHAR)");
        for field in Field::ALL {
            assert!(field.search_expr().contains(field.column()));
        }
    }
}
