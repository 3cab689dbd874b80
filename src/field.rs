//! Field metadata and query shape as supplied by the BI host.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

static TEMPORAL_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date|time").expect("temporal marker pattern"));

/// One dimension, measure, pivot or table calculation exposed by a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Unique stable identifier, e.g. `orders.created_date`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Semantic value type as reported by the host (`date_date`, `number`, `string`, ...).
    #[serde(rename = "type", default)]
    pub field_type: String,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, label_short: impl Into<String>, field_type: &str) -> Self {
        Self {
            name: name.into(),
            label_short: Some(label_short.into()),
            label: None,
            field_type: field_type.to_string(),
        }
    }

    /// Display name: `label_short`, then `label`, then `name`.
    pub fn display_label(&self) -> &str {
        self.label_short
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(&self.name)
    }

    /// True when the type name carries a date/time marker.
    pub fn is_temporal(&self) -> bool {
        TEMPORAL_MARKER.is_match(&self.field_type)
    }
}

/// Available fields of one query result, partitioned by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryShape {
    #[serde(default)]
    pub dimensions: Vec<FieldMeta>,
    #[serde(default)]
    pub measures: Vec<FieldMeta>,
    /// Absent for unpivoted queries; never an empty list.
    #[serde(
        default,
        deserialize_with = "non_empty_pivots",
        skip_serializing_if = "Option::is_none"
    )]
    pub pivots: Option<Vec<FieldMeta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_calculations: Vec<FieldMeta>,
}

fn non_empty_pivots<'de, D>(deserializer: D) -> Result<Option<Vec<FieldMeta>>, D::Error>
where
    D: Deserializer<'de>,
{
    let pivots: Option<Vec<FieldMeta>> = Option::deserialize(deserializer)?;
    Ok(pivots.filter(|p| !p.is_empty()))
}

impl QueryShape {
    pub fn new(dimensions: Vec<FieldMeta>, measures: Vec<FieldMeta>) -> Self {
        Self {
            dimensions,
            measures,
            pivots: None,
            table_calculations: Vec::new(),
        }
    }

    /// Attach pivot fields. An empty list leaves the shape unpivoted.
    pub fn with_pivots(mut self, pivots: Vec<FieldMeta>) -> Self {
        self.pivots = if pivots.is_empty() { None } else { Some(pivots) };
        self
    }

    pub fn with_table_calculations(mut self, calcs: Vec<FieldMeta>) -> Self {
        self.table_calculations = calcs;
        self
    }

    pub fn is_pivoted(&self) -> bool {
        self.pivots.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn pivot_count(&self) -> usize {
        self.pivots.as_ref().map_or(0, Vec::len)
    }

    /// Measures followed by table calculations. Everything that can feed the value or CI slots.
    pub fn measure_like(&self) -> impl Iterator<Item = &FieldMeta> {
        self.measures.iter().chain(self.table_calculations.iter())
    }

    pub fn measure_like_count(&self) -> usize {
        self.measures.len() + self.table_calculations.len()
    }

    /// Look up a field by name among dimensions and measure-like fields.
    pub fn find(&self, name: &str) -> Option<&FieldMeta> {
        self.dimensions
            .iter()
            .chain(self.measure_like())
            .find(|f| f.name == name)
    }
}
