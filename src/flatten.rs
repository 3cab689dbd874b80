//! Flatten raw query rows into plot points, one per (row, group).

use crate::resolve::{ResolvedFields, NO_PIVOT_GROUP};
use crate::row::{Cell, CellValue, RawRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// X coordinate of a point.
#[derive(Debug, Clone, PartialEq)]
pub enum XValue {
    Instant(NaiveDateTime),
    Number(f64),
    Category(String),
}

impl XValue {
    /// Kind name used in error messages and axis descriptors.
    pub fn kind(&self) -> XKind {
        match self {
            Self::Instant(_) => XKind::Temporal,
            Self::Number(_) => XKind::Numeric,
            Self::Category(_) => XKind::Categorical,
        }
    }
}

/// `%Y-%m-%d` at midnight, `%Y-%m-%dT%H:%M:%S` otherwise.
pub fn format_instant(t: &NaiveDateTime) -> String {
    if t.time() == chrono::NaiveTime::MIN {
        t.format("%Y-%m-%d").to_string()
    } else {
        t.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

impl fmt::Display for XValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(t) => f.write_str(&format_instant(t)),
            Self::Number(n) => write!(f, "{n}"),
            Self::Category(c) => f.write_str(c),
        }
    }
}

impl Serialize for XValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            other => serializer.collect_str(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XKind {
    Temporal,
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: XValue,
    pub y: f64,
    pub ci_left: f64,
    pub ci_right: f64,
    pub group: String,
}

/// Group labels in first-seen order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSet(IndexSet<String>);

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label; returns false if it was already present.
    pub fn insert(&mut self, group: &str) -> bool {
        if self.0.contains(group) {
            return false;
        }
        self.0.insert(group.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for GroupSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlattenError {
    #[error("row {row}: missing value for '{field}'{}", pivot_suffix(.pivot))]
    MissingCell {
        row: usize,
        field: String,
        pivot: Option<String>,
    },

    #[error("row {row}: value '{value}' of '{field}' is not numeric")]
    NonNumeric {
        row: usize,
        field: String,
        value: String,
    },

    #[error("row {row}: '{field}' is {found} where {expected} was expected")]
    UnexpectedCellShape {
        row: usize,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("row {row}: '{value}' of '{field}' is not a recognized date or time")]
    InvalidTemporal {
        row: usize,
        field: String,
        value: String,
    },
}

fn pivot_suffix(pivot: &Option<String>) -> String {
    pivot
        .as_ref()
        .map(|p| format!(" (pivot '{p}')"))
        .unwrap_or_default()
}

impl FlattenError {
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingCell { .. } => "Missing Data",
            Self::NonNumeric { .. } => "Non-Numeric Data",
            Self::UnexpectedCellShape { .. } => "Unexpected Data Shape",
            Self::InvalidTemporal { .. } => "Invalid Date",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Flattened {
    pub points: Vec<PlotPoint>,
    pub groups: GroupSet,
}

/// Parse a host temporal value. Accepts years, year-months, dates, date-times with a space or
/// `T` separator (seconds optional) and RFC 3339 timestamps (converted to UTC).
pub fn parse_temporal(text: &str) -> Option<NaiveDateTime> {
    let s = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    let date = match s.len() {
        4 => s
            .parse::<i32>()
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok(),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
    }?;
    date.and_hms_opt(0, 0, 0)
}

struct RowReader<'a> {
    index: usize,
    row: &'a RawRow,
    fields: &'a ResolvedFields,
}

impl<'a> RowReader<'a> {
    fn cell(&self, field: &str) -> Result<&'a Cell, FlattenError> {
        self.row.get(field).ok_or_else(|| FlattenError::MissingCell {
            row: self.index,
            field: field.to_string(),
            pivot: None,
        })
    }

    fn scalar(&self, field: &str) -> Result<&'a CellValue, FlattenError> {
        match self.cell(field)? {
            Cell::Scalar(v) if v.is_null() => Err(FlattenError::MissingCell {
                row: self.index,
                field: field.to_string(),
                pivot: None,
            }),
            Cell::Scalar(v) => Ok(v),
            Cell::Pivoted(_) => Err(self.shape_error(field, "a single value", "pivoted")),
        }
    }

    fn pivoted(
        &self,
        field: &str,
    ) -> Result<&'a indexmap::IndexMap<String, CellValue>, FlattenError> {
        match self.cell(field)? {
            Cell::Pivoted(map) => Ok(map),
            Cell::Scalar(_) => Err(self.shape_error(field, "pivoted values", "a single value")),
        }
    }

    /// Value of `field` under `pivot`, or the scalar value when `pivot` is None.
    fn value(&self, field: &str, pivot: Option<&str>) -> Result<&'a CellValue, FlattenError> {
        let Some(key) = pivot else {
            return self.scalar(field);
        };
        match self.pivoted(field)?.get(key) {
            Some(v) if !v.is_null() => Ok(v),
            _ => Err(FlattenError::MissingCell {
                row: self.index,
                field: field.to_string(),
                pivot: Some(key.to_string()),
            }),
        }
    }

    fn number(&self, field: &str, pivot: Option<&str>) -> Result<f64, FlattenError> {
        let cell = self.value(field, pivot)?;
        cell.as_f64().ok_or_else(|| FlattenError::NonNumeric {
            row: self.index,
            field: field.to_string(),
            value: cell.as_text().unwrap_or_default(),
        })
    }

    fn x(&self, pivot: Option<&str>) -> Result<XValue, FlattenError> {
        let field = self.fields.x.as_str();
        // A dimension X is a plain cell even in pivoted rows; a measure X follows the pivot.
        let pivot = match self.cell(field)? {
            Cell::Pivoted(_) => pivot,
            Cell::Scalar(_) => None,
        };
        let cell = self.value(field, pivot)?;

        if self.fields.x_is_temporal {
            let text = cell.as_text().unwrap_or_default();
            return parse_temporal(&text).map(XValue::Instant).ok_or_else(|| {
                FlattenError::InvalidTemporal {
                    row: self.index,
                    field: field.to_string(),
                    value: text,
                }
            });
        }
        if cell.value.is_number() {
            if let Some(n) = cell.as_f64() {
                return Ok(XValue::Number(n));
            }
        }
        Ok(XValue::Category(cell.as_text().unwrap_or_default()))
    }

    fn point(&self, pivot: Option<&str>) -> Result<PlotPoint, FlattenError> {
        Ok(PlotPoint {
            x: self.x(pivot)?,
            y: self.number(&self.fields.y, pivot)?,
            ci_left: self.number(&self.fields.ci_lower, pivot)?,
            ci_right: self.number(&self.fields.ci_upper, pivot)?,
            group: pivot.unwrap_or(NO_PIVOT_GROUP).to_string(),
        })
    }

    fn shape_error(
        &self,
        field: &str,
        expected: &'static str,
        found: &'static str,
    ) -> FlattenError {
        FlattenError::UnexpectedCellShape {
            row: self.index,
            field: field.to_string(),
            expected,
            found,
        }
    }
}

/// Produce one point per row (unpivoted) or per row and pivot key of the Y cell (pivoted).
///
/// An unpivoted query always has the single `NONE` group, even with no rows. The first missing
/// or unreadable cell halts the pass; no partial output is returned.
pub fn flatten(rows: &[RawRow], fields: &ResolvedFields) -> Result<Flattened, FlattenError> {
    let mut out = Flattened::default();
    if !fields.pivoted {
        out.groups.insert(NO_PIVOT_GROUP);
    }

    for (index, row) in rows.iter().enumerate() {
        let reader = RowReader { index, row, fields };

        if !fields.pivoted {
            out.points.push(reader.point(None)?);
            continue;
        }

        for key in reader.pivoted(&fields.y)?.keys() {
            out.points.push(reader.point(Some(key))?);
            out.groups.insert(key);
        }
    }

    tracing::debug!(
        rows = rows.len(),
        points = out.points.len(),
        groups = out.groups.len(),
        "flattened rows"
    );
    Ok(out)
}
