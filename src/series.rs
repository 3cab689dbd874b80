//! Per-group series with resolved colors.

use crate::color::Rgb;
use crate::flatten::{Flattened, PlotPoint};
use crate::options::ColorOption;
use crate::resolve::DisplaySettings;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub group: String,
    /// Line color, `#rrggbb`.
    pub color: String,
    /// Confidence band fill, `rgba(...)` at the configured opacity.
    pub band_color: String,
    pub points: Vec<PlotPoint>,
}

/// Palette color for the group at `index`, unless the group has an override.
pub fn group_color(display: &DisplaySettings, group: &str, index: usize) -> Rgb {
    if let Some(c) = display.group_colors.get(group) {
        return *c;
    }
    match display.palette.len() {
        0 => Rgb::new(0, 0, 0),
        n => display.palette[index % n],
    }
}

/// One series per group, in group order.
pub fn build_series(flattened: &Flattened, display: &DisplaySettings) -> Vec<Series> {
    let mut by_group: IndexMap<&str, Vec<PlotPoint>> =
        flattened.groups.iter().map(|g| (g, Vec::new())).collect();
    for p in &flattened.points {
        if let Some(points) = by_group.get_mut(p.group.as_str()) {
            points.push(p.clone());
        }
    }

    by_group
        .into_iter()
        .enumerate()
        .map(|(i, (group, points))| {
            let color = group_color(display, group, i);
            Series {
                group: group.to_string(),
                color: color.to_hex(),
                band_color: color.to_rgba(display.band_opacity),
                points,
            }
        })
        .collect()
}

/// Color options for every observed group, defaulting to the palette color it would get.
pub fn group_color_options(
    flattened: &Flattened,
    display: &DisplaySettings,
) -> IndexMap<String, ColorOption> {
    flattened
        .groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let default = match display.palette.len() {
                0 => Rgb::new(0, 0, 0),
                n => display.palette[i % n],
            };
            (
                group.to_string(),
                ColorOption::for_group(group, default.to_hex()),
            )
        })
        .collect()
}
