//! Raw query rows: one map of field name to cell per record.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A single scalar cell: `{"value": ..., "rendered": ..., "links": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellValue {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl CellValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            rendered: None,
            links: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Numeric reading of the cell. Accepts JSON numbers and numeric strings; NaN and the
    /// infinities are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|v| v.is_finite())
    }

    /// Textual reading of the cell, as used for categories and temporal parsing.
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }
}

/// A row cell: a scalar wrapper, or one wrapper per pivot key when the query is pivoted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Cell {
    Scalar(CellValue),
    Pivoted(IndexMap<String, CellValue>),
}

/// Every entry is itself a cell wrapper, so a pivot key named `value` is not mistaken for a
/// scalar cell.
fn is_pivot_map(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty()
        && map
            .values()
            .all(|v| v.as_object().is_some_and(|o| o.contains_key("value")))
}

impl TryFrom<Value> for Cell {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(format!("expected a cell object, got {value}"));
        };
        if map.contains_key("value") && !is_pivot_map(&map) {
            serde_json::from_value(Value::Object(map))
                .map(Cell::Scalar)
                .map_err(|e| e.to_string())
        } else {
            let mut pivoted = IndexMap::with_capacity(map.len());
            for (key, inner) in map {
                let cell: CellValue = serde_json::from_value(inner)
                    .map_err(|e| format!("pivot key '{key}': {e}"))?;
                pivoted.insert(key, cell);
            }
            Ok(Cell::Pivoted(pivoted))
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Scalar(v) => v.serialize(serializer),
            Cell::Pivoted(map) => map.serialize(serializer),
        }
    }
}

impl Cell {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Cell::Scalar(CellValue::new(value))
    }

    /// Build a pivoted cell from `(pivot key, value)` pairs, preserving order.
    pub fn pivoted<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Cell::Pivoted(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), CellValue::new(v)))
                .collect(),
        )
    }

    pub fn is_pivoted(&self) -> bool {
        matches!(self, Cell::Pivoted(_))
    }
}

/// One tabular record keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(pub IndexMap<String, Cell>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, cell: Cell) -> Self {
        self.0.insert(field.into(), cell);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Cell)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (String, Cell)>>(iter: T) -> Self {
        RawRow(iter.into_iter().collect())
    }
}
