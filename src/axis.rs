//! Axis domains and tick derivation from flattened points.

use crate::flatten::{format_instant, PlotPoint, XKind, XValue};
use crate::format::format_value;
use crate::resolve::{DisplaySettings, ResolvedFields};
use chrono::NaiveDateTime;
use indexmap::IndexSet;
use serde::{Serialize, Serializer};

pub const DEFAULT_TICK_COUNT: usize = 5;

/// `[floor(min ci_left), ceil(max ci_right)]` over all points, or None when there are none.
///
/// Derived from the confidence band only; `y` never widens the domain.
pub fn y_domain(points: &[PlotPoint]) -> Option<[f64; 2]> {
    let lo = points.iter().map(|p| p.ci_left).reduce(f64::min)?;
    let hi = points.iter().map(|p| p.ci_right).reduce(f64::max)?;
    Some([lo.floor(), hi.ceil()])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum XDomain {
    Temporal {
        #[serde(serialize_with = "serialize_instant")]
        min: NaiveDateTime,
        #[serde(serialize_with = "serialize_instant")]
        max: NaiveDateTime,
    },
    Numeric {
        min: f64,
        max: f64,
    },
    Categorical {
        categories: Vec<String>,
    },
}

/// Same text as temporal point coordinates.
fn serialize_instant<S>(t: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_instant(t))
}

/// X extent of the points: min/max for instants and numbers, distinct values in first-seen
/// order for categories. Mixed kinds fall back to categories over the display text.
pub fn x_domain(points: &[PlotPoint]) -> Option<XDomain> {
    let first = points.first()?.x.kind();
    let uniform = points.iter().all(|p| p.x.kind() == first);

    if uniform {
        match first {
            XKind::Temporal => {
                let instants = points.iter().filter_map(|p| match p.x {
                    XValue::Instant(t) => Some(t),
                    _ => None,
                });
                let min = instants.clone().min()?;
                let max = instants.max()?;
                return Some(XDomain::Temporal { min, max });
            }
            XKind::Numeric => {
                let numbers = points.iter().filter_map(|p| match p.x {
                    XValue::Number(n) => Some(n),
                    _ => None,
                });
                let min = numbers.clone().reduce(f64::min)?;
                let max = numbers.reduce(f64::max)?;
                return Some(XDomain::Numeric { min, max });
            }
            XKind::Categorical => {}
        }
    }

    let categories: IndexSet<String> = points.iter().map(|p| p.x.to_string()).collect();
    Some(XDomain::Categorical {
        categories: categories.into_iter().collect(),
    })
}

/// Roughly `count` evenly spaced round values inside `[start, stop]`.
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let (i1, i2, inc) = tick_spec(lo, hi, count as f64);
    if i2 < i1 {
        return Vec::new();
    }

    let mut ticks: Vec<f64> = (0..=(i2 - i1) as i64)
        .map(|i| {
            let k = i1 + i as f64;
            if inc < 0.0 {
                k / -inc
            } else {
                k * inc
            }
        })
        .collect();
    if reverse {
        ticks.reverse();
    }
    ticks
}

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        i1 = (start * scale).round();
        i2 = (stop * scale).round();
        if i1 / scale < start {
            i1 += 1.0;
        }
        if i2 / scale > stop {
            i2 -= 1.0;
        }
        inc = -scale;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Powers of ten inside a positive domain. Falls back to linear ticks when fewer than two fit.
pub fn log_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let (lo, hi) = if stop < start {
        (stop, start)
    } else {
        (start, stop)
    };
    if lo <= 0.0 {
        return nice_ticks(start, stop, count);
    }
    let ticks: Vec<f64> = (lo.log10().floor() as i32..=hi.log10().ceil() as i32)
        .map(|p| 10f64.powi(p))
        .filter(|v| *v >= lo && *v <= hi)
        .collect();
    if ticks.len() < 2 {
        return nice_ticks(start, stop, count);
    }
    ticks
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAxis {
    pub label: String,
    pub domain: Option<XDomain>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YAxis {
    pub label: String,
    /// Domain of the confidence band in the data.
    pub data_domain: Option<[f64; 2]>,
    /// Domain to draw: the data domain with any configured bound substituted, unchanged even
    /// when inverted.
    pub domain: Option<[f64; 2]>,
    pub log_scale: bool,
    pub ticks: Vec<Tick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisConfig {
    pub x: XAxis,
    pub y: YAxis,
    pub show_grid: bool,
}

impl AxisConfig {
    pub fn derive(
        points: &[PlotPoint],
        fields: &ResolvedFields,
        display: &DisplaySettings,
        tick_count: usize,
    ) -> Self {
        let data_domain = y_domain(points);
        let domain = match (
            display.y_min.or(data_domain.map(|d| d[0])),
            display.y_max.or(data_domain.map(|d| d[1])),
        ) {
            (Some(lo), Some(hi)) => Some([lo, hi]),
            _ => None,
        };

        let ticks = domain
            .map(|[lo, hi]| {
                if display.log_scale {
                    log_ticks(lo, hi, tick_count)
                } else {
                    nice_ticks(lo, hi, tick_count)
                }
            })
            .unwrap_or_default()
            .into_iter()
            .map(|value| Tick {
                value,
                label: format_value(value, display.value_format.as_ref()),
            })
            .collect();

        Self {
            x: XAxis {
                label: fields.x_label.clone(),
                domain: x_domain(points),
            },
            y: YAxis {
                label: fields.y_label.clone(),
                data_domain,
                domain,
                log_scale: display.log_scale,
                ticks,
            },
            show_grid: display.show_grid,
        }
    }
}
