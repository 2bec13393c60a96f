use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{column, ColumnType};

/// Comparison operators a host query engine may push down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ParseQualError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "=" => Ok(Operator::Eq),
            "<>" | "!=" => Ok(Operator::Ne),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            _ => Err(ParseQualError::UnknownOperator(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualValue {
    String(String),
    Int(i64),
}

impl QualValue {
    /// The string payload, or `None` for non-string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QualValue::String(value) => Some(value),
            QualValue::Int(_) => None,
        }
    }
}

impl From<&str> for QualValue {
    fn from(value: &str) -> Self {
        QualValue::String(value.to_string())
    }
}

impl From<i64> for QualValue {
    fn from(value: i64) -> Self {
        QualValue::Int(value)
    }
}

/// A single predicate supplied for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qual {
    pub operator: Operator,
    pub value: QualValue,
}

impl Qual {
    pub fn new(operator: Operator, value: impl Into<QualValue>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

/// Column name to the predicates supplied for it.
pub type QualMap = BTreeMap<String, Vec<Qual>>;

/// Everything the host engine hands over for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Requested output columns; empty selects every column.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub quals: QualMap,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl QueryContext {
    pub fn with_qual(mut self, column: &str, qual: Qual) -> Self {
        self.quals.entry(column.to_string()).or_default().push(qual);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Value of the first `=` string predicate on `column`, if any.
    pub fn equality_key(&self, column: &str) -> Option<&str> {
        self.quals
            .get(column)?
            .iter()
            .find(|qual| qual.operator == Operator::Eq)
            .and_then(|qual| qual.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseQualError {
    #[error("unknown operator '{0}' (expected =, <>, >= or <=)")]
    UnknownOperator(String),
    #[error("filter '{0}' must look like <column><operator><value>")]
    MissingOperator(String),
    #[error("filter on unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{column}' expects an integer, got '{value}'")]
    InvalidInteger { column: String, value: String },
}

const OPERATOR_TOKENS: [&str; 5] = ["<>", "!=", ">=", "<=", "="];

/// Parse a textual predicate such as `record_state<>ARCHIVED` or
/// `confidence>=80` into a column name and a typed [`Qual`].
pub fn parse_filter_expression(expression: &str) -> Result<(String, Qual), ParseQualError> {
    let (index, token) = expression
        .char_indices()
        .find_map(|(index, _)| {
            OPERATOR_TOKENS
                .iter()
                .find(|token| expression[index..].starts_with(*token))
                .map(|token| (index, *token))
        })
        .ok_or_else(|| ParseQualError::MissingOperator(expression.to_string()))?;

    let name = expression[..index].trim();
    let raw_value = expression[index + token.len()..].trim();
    if name.is_empty() {
        return Err(ParseQualError::MissingOperator(expression.to_string()));
    }

    let definition = column(name).ok_or_else(|| ParseQualError::UnknownColumn(name.to_string()))?;
    let operator = token.parse::<Operator>()?;
    let value = match definition.column_type {
        ColumnType::Int => {
            let parsed = raw_value
                .parse::<i64>()
                .map_err(|_| ParseQualError::InvalidInteger {
                    column: name.to_string(),
                    value: raw_value.to_string(),
                })?;
            QualValue::Int(parsed)
        }
        _ => QualValue::String(raw_value.to_string()),
    };

    Ok((name.to_string(), Qual { operator, value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_not_equal_before_equal() {
        let (name, qual) = parse_filter_expression("record_state<>ARCHIVED").expect("parse");
        assert_eq!(name, "record_state");
        assert_eq!(qual, Qual::new(Operator::Ne, "ARCHIVED"));
    }

    #[test]
    fn numeric_columns_parse_integer_values() {
        let (name, qual) = parse_filter_expression("confidence >= 80").expect("parse");
        assert_eq!(name, "confidence");
        assert_eq!(qual, Qual::new(Operator::Ge, 80));
    }

    #[test]
    fn numeric_columns_reject_text() {
        let error = parse_filter_expression("criticality=high").expect_err("should fail");
        assert!(matches!(error, ParseQualError::InvalidInteger { .. }));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let error = parse_filter_expression("severity_label=HIGH").expect_err("should fail");
        assert_eq!(
            error,
            ParseQualError::UnknownColumn("severity_label".to_string())
        );
    }

    #[test]
    fn expression_without_operator_is_rejected() {
        assert!(matches!(
            parse_filter_expression("title"),
            Err(ParseQualError::MissingOperator(_))
        ));
    }

    #[test]
    fn values_may_contain_operator_characters() {
        let (_, qual) = parse_filter_expression("title=a=b").expect("parse");
        assert_eq!(qual.value, QualValue::from("a=b"));
    }

    #[test]
    fn equality_key_ignores_other_operators() {
        let ctx = QueryContext::default()
            .with_qual("id", Qual::new(Operator::Ne, "skip"))
            .with_qual("id", Qual::new(Operator::Eq, "finding-1"));
        assert_eq!(ctx.equality_key("id"), Some("finding-1"));
        assert_eq!(ctx.equality_key("title"), None);
    }
}
