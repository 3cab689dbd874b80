#![allow(dead_code)]

use ciband::{Cell, FieldMeta, QueryShape, RawRow, UserConfig};
use serde_json::{json, Value};

pub fn date_dim() -> FieldMeta {
    FieldMeta::new("orders.created_date", "Created Date", "date_date")
}

pub fn measures() -> Vec<FieldMeta> {
    vec![
        FieldMeta::new("orders.avg_value", "Avg Value", "average"),
        FieldMeta::new("orders.ci_low", "CI Low", "number"),
        FieldMeta::new("orders.ci_high", "CI High", "number"),
    ]
}

/// One date dimension and the three band measures, unpivoted.
pub fn basic_shape() -> QueryShape {
    QueryShape::new(vec![date_dim()], measures())
}

/// Same as [`basic_shape`], pivoted on region.
pub fn pivoted_shape() -> QueryShape {
    basic_shape().with_pivots(vec![FieldMeta::new("orders.region", "Region", "string")])
}

pub fn row(date: &str, value: f64, low: f64, high: f64) -> RawRow {
    RawRow::new()
        .with("orders.created_date", Cell::scalar(date))
        .with("orders.avg_value", Cell::scalar(value))
        .with("orders.ci_low", Cell::scalar(low))
        .with("orders.ci_high", Cell::scalar(high))
}

/// A pivoted row; each entry is `(group, value, low, high)`.
pub fn pivoted_row(date: &str, entries: &[(&str, f64, f64, f64)]) -> RawRow {
    RawRow::new()
        .with("orders.created_date", Cell::scalar(date))
        .with(
            "orders.avg_value",
            Cell::pivoted(entries.iter().map(|(g, v, _, _)| (*g, *v))),
        )
        .with(
            "orders.ci_low",
            Cell::pivoted(entries.iter().map(|(g, _, l, _)| (*g, *l))),
        )
        .with(
            "orders.ci_high",
            Cell::pivoted(entries.iter().map(|(g, _, _, h)| (*g, *h))),
        )
}

/// Settings selecting every field explicitly.
pub fn full_config() -> UserConfig {
    UserConfig {
        field_x: Some("orders.created_date".into()),
        field_y: Some("orders.avg_value".into()),
        ci_lower: Some("orders.ci_low".into()),
        ci_upper: Some("orders.ci_high".into()),
        ..Default::default()
    }
}

/// A host payload as it arrives on the wire.
pub fn request_json() -> Value {
    json!({
        "fields": {
            "dimensions": [
                {"name": "orders.created_date", "label_short": "Created Date", "type": "date_date"}
            ],
            "measures": [
                {"name": "orders.avg_value", "label_short": "Avg Value", "type": "average"},
                {"name": "orders.ci_low", "label": "Orders CI Low", "type": "number"},
                {"name": "orders.ci_high", "type": "number"}
            ],
            "pivots": [
                {"name": "orders.region", "label_short": "Region", "type": "string"}
            ],
            "table_calculations": []
        },
        "data": [
            {
                "orders.created_date": {"value": "2024-01-01"},
                "orders.avg_value": {"West": {"value": 10}, "East": {"value": 20, "rendered": "20"}},
                "orders.ci_low": {"West": {"value": 8}, "East": {"value": 18}},
                "orders.ci_high": {"West": {"value": 12}, "East": {"value": 22}}
            },
            {
                "orders.created_date": {"value": "2024-01-02"},
                "orders.avg_value": {"East": {"value": 21}, "North": {"value": "5.5"}},
                "orders.ci_low": {"East": {"value": 19}, "North": {"value": 4}},
                "orders.ci_high": {"East": {"value": 23}, "North": {"value": 7}}
            }
        ],
        "config": {
            "field_x": "",
            "color_North": "#000000"
        }
    })
}
