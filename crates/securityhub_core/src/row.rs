use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Typed value of one output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    String(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::String(value) => Value::String(value.clone()),
            CellValue::Int(value) => Value::from(*value),
            CellValue::Timestamp(value) => {
                Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            CellValue::Json(value) => value.clone(),
        }
    }
}

/// One projected finding, cells in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(&'static str, CellValue)>,
}

impl Row {
    pub fn push(&mut self, column: &'static str, value: CellValue) {
        self.cells.push((column, value));
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// JSON object keyed by column name.
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .cells
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.to_json()))
            .collect();
        Value::Object(object)
    }
}
