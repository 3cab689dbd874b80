//! Field resolution: turn the user's (possibly incomplete) selections into the concrete
//! fields and display settings for one render pass.

use crate::color::{Rgb, DEFAULT_PALETTE};
use crate::diagnostics::{groups, Diagnostic};
use crate::field::{FieldMeta, QueryShape};
use crate::format::ValueFormat;
use crate::options::OptionsDescriptor;
use crate::settings::{keys, UserConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Group label used when the query is not pivoted.
pub const NO_PIVOT_GROUP: &str = "NONE";

const DEFAULT_BAND_OPACITY: f64 = 0.25;

/// How unset field selections are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Every field must be selected; otherwise the pass halts.
    Strict,
    /// Unset fields default to the first dimension and the first three measures.
    #[default]
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `warnings` holds what resolution found before halting.
    #[error("chart fields not configured: {}", .missing.join(", "))]
    Incomplete {
        missing: Vec<&'static str>,
        warnings: Vec<ConfigWarning>,
    },
}

impl ConfigError {
    pub fn warnings(&self) -> &[ConfigWarning] {
        match self {
            Self::Incomplete { warnings, .. } => warnings,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Incomplete { missing, .. } => Diagnostic::error(
                groups::CONFIG,
                "Incomplete Configuration",
                format!("Select a field for: {}", missing.join(", ")),
            ),
        }
    }
}

/// Non-fatal configuration problems. The pass continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigWarning {
    #[error("minimum value {min} is not below maximum value {max}")]
    InvalidYBounds { min: f64, max: f64 },

    #[error("log scale cannot show the bound {bound}, which is not positive")]
    NonPositiveLogBound { bound: f64 },

    #[error("field '{name}' selected for {key} is not in the query")]
    UnknownField { key: &'static str, name: String },

    #[error("field '{name}' cannot be used for {key}")]
    InvalidChoice { key: &'static str, name: String },

    #[error("color '{value}' for {target} is not a valid color")]
    InvalidColor { target: String, value: String },

    #[error("value format '{format}' is not supported")]
    InvalidFormat { format: String },
}

impl ConfigWarning {
    pub fn group(&self) -> &'static str {
        match self {
            Self::InvalidYBounds { .. } => groups::Y_BOUNDS,
            Self::NonPositiveLogBound { .. } => groups::LOG_SCALE,
            Self::UnknownField { .. } | Self::InvalidChoice { .. } => groups::FIELDS,
            Self::InvalidColor { .. } => groups::COLORS,
            Self::InvalidFormat { .. } => groups::FORMAT,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidYBounds { .. } => "Invalid Y Axis Bounds",
            Self::NonPositiveLogBound { .. } => "Invalid Log Scale Bound",
            Self::UnknownField { .. } => "Unknown Field",
            Self::InvalidChoice { .. } => "Invalid Field Choice",
            Self::InvalidColor { .. } => "Invalid Color",
            Self::InvalidFormat { .. } => "Invalid Value Format",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(self.group(), self.title(), self.to_string())
    }
}

/// The concrete fields used for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFields {
    pub x: String,
    pub y: String,
    pub ci_lower: String,
    pub ci_upper: String,
    pub x_is_temporal: bool,
    pub pivoted: bool,
    pub x_label: String,
    pub y_label: String,
}

/// Display settings after defaults and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub log_scale: bool,
    pub show_grid: bool,
    pub value_format: Option<ValueFormat>,
    pub band_opacity: f64,
    pub palette: Vec<Rgb>,
    /// Valid color overrides keyed by group label.
    pub group_colors: IndexMap<String, Rgb>,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub fields: ResolvedFields,
    pub display: DisplaySettings,
    pub options: OptionsDescriptor,
    pub warnings: Vec<ConfigWarning>,
}

/// One chart slot to fill: its option key, the user's choice, and the lenient default.
struct Slot<'a> {
    key: &'static str,
    selected: Option<&'a str>,
    candidates: Vec<&'a FieldMeta>,
    default_index: usize,
}

fn resolve_slot(
    slot: Slot<'_>,
    shape: &QueryShape,
    policy: FieldPolicy,
    missing: &mut Vec<&'static str>,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<String> {
    let default = slot
        .candidates
        .get(slot.default_index)
        .map(|f| f.name.clone());

    match slot.selected {
        Some(name) if slot.candidates.iter().any(|f| f.name == name) => Some(name.to_string()),
        Some(name) => {
            let key = slot.key;
            let name_owned = name.to_string();
            warnings.push(if shape.find(name).is_some() {
                ConfigWarning::InvalidChoice {
                    key,
                    name: name_owned,
                }
            } else {
                ConfigWarning::UnknownField {
                    key,
                    name: name_owned,
                }
            });
            match policy {
                FieldPolicy::Strict => Some(name.to_string()),
                FieldPolicy::Lenient => {
                    if default.is_none() {
                        missing.push(slot.key);
                    }
                    default
                }
            }
        }
        None => match policy {
            FieldPolicy::Strict => {
                missing.push(slot.key);
                None
            }
            FieldPolicy::Lenient => {
                if default.is_none() {
                    missing.push(slot.key);
                }
                default
            }
        },
    }
}

fn resolve_display(config: &UserConfig, warnings: &mut Vec<ConfigWarning>) -> DisplaySettings {
    let log_scale = config.log_scale.unwrap_or(false);

    if let (Some(min), Some(max)) = (config.y_bound_min, config.y_bound_max) {
        if min >= max {
            warnings.push(ConfigWarning::InvalidYBounds { min, max });
        }
    }
    if log_scale {
        if let Some(bound) = [config.y_bound_min, config.y_bound_max]
            .into_iter()
            .flatten()
            .find(|b| *b <= 0.0)
        {
            warnings.push(ConfigWarning::NonPositiveLogBound { bound });
        }
    }

    let value_format = config
        .value_format()
        .and_then(|pattern| match ValueFormat::parse(pattern) {
            Ok(f) => Some(f),
            Err(_) => {
                warnings.push(ConfigWarning::InvalidFormat {
                    format: pattern.to_string(),
                });
                None
            }
        });

    let mut palette = Vec::new();
    for value in config.palette.iter().flatten() {
        match Rgb::parse(value) {
            Ok(c) => palette.push(c),
            Err(_) => warnings.push(ConfigWarning::InvalidColor {
                target: keys::PALETTE.to_string(),
                value: value.clone(),
            }),
        }
    }
    if palette.is_empty() {
        palette = DEFAULT_PALETTE
            .iter()
            .filter_map(|c| Rgb::parse(c).ok())
            .collect();
    }

    let mut group_colors = IndexMap::new();
    for group in config.overridden_groups() {
        let Some(value) = config.group_color(&group) else {
            continue;
        };
        match Rgb::parse(value) {
            Ok(c) => {
                group_colors.insert(group, c);
            }
            Err(_) => warnings.push(ConfigWarning::InvalidColor {
                target: format!("group '{group}'"),
                value: value.to_string(),
            }),
        }
    }

    DisplaySettings {
        y_min: config.y_bound_min,
        y_max: config.y_bound_max,
        log_scale,
        show_grid: config.show_grid.unwrap_or(true),
        value_format,
        band_opacity: config
            .band_opacity
            .unwrap_or(DEFAULT_BAND_OPACITY)
            .clamp(0.0, 1.0),
        palette,
        group_colors,
    }
}

/// Resolve the chart fields and display settings for one pass.
///
/// Fails only with [`ConfigError::Incomplete`]: under [`FieldPolicy::Strict`] when any field is
/// unset, under [`FieldPolicy::Lenient`] when the shape has no candidate for an unset slot. A
/// selection that is not in the query warns with `UnknownField`; one that is in the query but
/// not allowed for its slot (a dimension as Y, say) warns with `InvalidChoice`.
pub fn resolve_fields(
    shape: &QueryShape,
    config: &UserConfig,
    policy: FieldPolicy,
) -> Result<Resolution, ConfigError> {
    let options = OptionsDescriptor::for_shape(shape);
    let mut warnings = Vec::new();
    let mut missing = Vec::new();

    let x_candidates: Vec<&FieldMeta> = shape
        .dimensions
        .iter()
        .chain(shape.measure_like())
        .collect();
    let measure_candidates: Vec<&FieldMeta> = shape.measure_like().collect();

    // The X default is the first dimension specifically, not the first X choice.
    let x_default_index = if shape.dimensions.is_empty() {
        usize::MAX
    } else {
        0
    };

    let slots = [
        Slot {
            key: keys::FIELD_X,
            selected: config.field_x(),
            candidates: x_candidates,
            default_index: x_default_index,
        },
        Slot {
            key: keys::FIELD_Y,
            selected: config.field_y(),
            candidates: measure_candidates.clone(),
            default_index: 0,
        },
        Slot {
            key: keys::CI_LOWER,
            selected: config.ci_lower(),
            candidates: measure_candidates.clone(),
            default_index: 1,
        },
        Slot {
            key: keys::CI_UPPER,
            selected: config.ci_upper(),
            candidates: measure_candidates,
            default_index: 2,
        },
    ];

    let [x, y, ci_lower, ci_upper] =
        slots.map(|slot| resolve_slot(slot, shape, policy, &mut missing, &mut warnings));

    let display = resolve_display(config, &mut warnings);

    // A slot resolves to None exactly when it was pushed onto `missing`.
    let (Some(x), Some(y), Some(ci_lower), Some(ci_upper)) = (x, y, ci_lower, ci_upper) else {
        return Err(ConfigError::Incomplete { missing, warnings });
    };

    let x_meta = shape.find(&x);
    let y_meta = shape.find(&y);
    let fields = ResolvedFields {
        x_is_temporal: x_meta.is_some_and(FieldMeta::is_temporal),
        pivoted: shape.is_pivoted(),
        x_label: config
            .x_label
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| x_meta.map_or(x.clone(), |f| f.display_label().to_string())),
        y_label: config
            .y_label
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| y_meta.map_or(y.clone(), |f| f.display_label().to_string())),
        x,
        y,
        ci_lower,
        ci_upper,
    };

    Ok(Resolution {
        fields,
        display,
        options,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> QueryShape {
        QueryShape::new(
            vec![
                FieldMeta::new("date", "Date", "date_date"),
                FieldMeta::new("region", "Region", "string"),
            ],
            vec![
                FieldMeta::new("val", "Value", "number"),
                FieldMeta::new("lo", "Lower", "number"),
                FieldMeta::new("hi", "Upper", "number"),
            ],
        )
    }

    #[test]
    fn lenient_defaults_everything() {
        let r = resolve_fields(&shape(), &UserConfig::default(), FieldPolicy::Lenient).unwrap();
        assert_eq!(r.fields.x, "date");
        assert_eq!(r.fields.y, "val");
        assert_eq!(r.fields.ci_lower, "lo");
        assert_eq!(r.fields.ci_upper, "hi");
        assert!(r.fields.x_is_temporal);
        assert!(!r.fields.pivoted);
        assert_eq!(r.fields.x_label, "Date");
        assert_eq!(r.fields.y_label, "Value");
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn strict_reports_all_missing_slots() {
        let config = UserConfig {
            field_x: Some("date".into()),
            ..Default::default()
        };
        let err = resolve_fields(&shape(), &config, FieldPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Incomplete {
                missing: vec![keys::FIELD_Y, keys::CI_LOWER, keys::CI_UPPER],
                warnings: vec![],
            }
        );
        assert_eq!(err.to_diagnostic().group, groups::CONFIG);
    }

    #[test]
    fn lenient_without_enough_measures_is_incomplete() {
        let shape = QueryShape::new(
            vec![FieldMeta::new("date", "Date", "date_date")],
            vec![FieldMeta::new("val", "Value", "number")],
        );
        let err = resolve_fields(&shape, &UserConfig::default(), FieldPolicy::Lenient).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Incomplete {
                missing: vec![keys::CI_LOWER, keys::CI_UPPER],
                warnings: vec![],
            }
        );
    }

    #[test]
    fn incomplete_keeps_warnings_found_so_far() {
        let config = UserConfig {
            field_x: Some("gone".into()),
            value_format: Some("abc".into()),
            ..Default::default()
        };
        let err = resolve_fields(&shape(), &config, FieldPolicy::Strict).unwrap_err();
        assert_eq!(
            err.warnings()[0],
            ConfigWarning::UnknownField {
                key: keys::FIELD_X,
                name: "gone".into()
            }
        );
        assert_eq!(err.warnings().len(), 2);
    }

    #[test]
    fn dimension_as_y_is_an_invalid_choice() {
        let config = UserConfig {
            field_y: Some("region".into()),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert_eq!(r.fields.y, "val");
        assert_eq!(
            r.warnings,
            vec![ConfigWarning::InvalidChoice {
                key: keys::FIELD_Y,
                name: "region".into()
            }]
        );
        assert_eq!(r.warnings[0].group(), groups::FIELDS);
        assert!(r.warnings[0].to_string().contains("cannot be used for"));
    }

    #[test]
    fn x_on_a_measure_is_not_temporal() {
        let config = UserConfig {
            field_x: Some("region".into()),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert_eq!(r.fields.x, "region");
        assert!(!r.fields.x_is_temporal);
    }

    #[test]
    fn unknown_field_warns_and_defaults_when_lenient() {
        let config = UserConfig {
            field_y: Some("gone".into()),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert_eq!(r.fields.y, "val");
        assert_eq!(
            r.warnings,
            vec![ConfigWarning::UnknownField {
                key: keys::FIELD_Y,
                name: "gone".into()
            }]
        );
    }

    #[test]
    fn unknown_field_is_kept_when_strict() {
        let config = UserConfig {
            field_x: Some("date".into()),
            field_y: Some("gone".into()),
            ci_lower: Some("lo".into()),
            ci_upper: Some("hi".into()),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Strict).unwrap();
        assert_eq!(r.fields.y, "gone");
        assert_eq!(r.fields.y_label, "gone");
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn inverted_bounds_warn_but_pass_through() {
        let config = UserConfig {
            y_bound_min: Some(10.0),
            y_bound_max: Some(5.0),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert_eq!(r.display.y_min, Some(10.0));
        assert_eq!(r.display.y_max, Some(5.0));
        assert_eq!(
            r.warnings,
            vec![ConfigWarning::InvalidYBounds {
                min: 10.0,
                max: 5.0
            }]
        );
        assert_eq!(r.warnings[0].to_diagnostic().group, groups::Y_BOUNDS);
    }

    #[test]
    fn equal_bounds_warn() {
        let config = UserConfig {
            y_bound_min: Some(3.0),
            y_bound_max: Some(3.0),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn log_scale_with_zero_bound_warns() {
        let config = UserConfig {
            log_scale: Some(true),
            y_bound_min: Some(0.0),
            y_bound_max: Some(100.0),
            ..Default::default()
        };
        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert_eq!(
            r.warnings,
            vec![ConfigWarning::NonPositiveLogBound { bound: 0.0 }]
        );
    }

    #[test]
    fn bad_colors_and_format_are_dropped_with_warnings() {
        let mut config = UserConfig {
            value_format: Some("abc".into()),
            palette: Some(vec!["#ff0000".into(), "nope".into()]),
            ..Default::default()
        };
        config.group_colors.insert("A".into(), "#00ff00".into());
        config.group_colors.insert("B".into(), "not-a-color".into());

        let r = resolve_fields(&shape(), &config, FieldPolicy::Lenient).unwrap();
        assert!(r.display.value_format.is_none());
        assert_eq!(r.display.palette, vec![Rgb::new(255, 0, 0)]);
        assert_eq!(r.display.group_colors.len(), 1);
        assert_eq!(r.display.group_colors["A"], Rgb::new(0, 255, 0));
        assert_eq!(r.warnings.len(), 3);
    }

    #[test]
    fn display_defaults() {
        let r = resolve_fields(&shape(), &UserConfig::default(), FieldPolicy::Lenient).unwrap();
        assert!(!r.display.log_scale);
        assert!(r.display.show_grid);
        assert_eq!(r.display.band_opacity, DEFAULT_BAND_OPACITY);
        assert_eq!(r.display.palette.len(), DEFAULT_PALETTE.len());
    }
}
