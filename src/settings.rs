//! Per-visualization settings chosen by the user in the host UI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Option keys the host stores settings under.
pub mod keys {
    pub const FIELD_X: &str = "field_x";
    pub const FIELD_Y: &str = "field_y";
    pub const CI_LOWER: &str = "ci_lower";
    pub const CI_UPPER: &str = "ci_upper";
    pub const Y_BOUND_MIN: &str = "y_bound_min";
    pub const Y_BOUND_MAX: &str = "y_bound_max";
    pub const LOG_SCALE: &str = "log_scale";
    pub const SHOW_GRID: &str = "show_grid";
    pub const VALUE_FORMAT: &str = "value_format";
    pub const X_LABEL: &str = "x_label";
    pub const Y_LABEL: &str = "y_label";
    pub const BAND_OPACITY: &str = "band_opacity";
    pub const PALETTE: &str = "palette";
    /// Prefix of the per-group color keys, `color_<group>`.
    pub const GROUP_COLOR_PREFIX: &str = "color_";
}

/// The user's visualization settings. Every field is optional; unset fields are defaulted
/// or reported by the field resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub field_x: Option<String>,
    pub field_y: Option<String>,
    pub ci_lower: Option<String>,
    pub ci_upper: Option<String>,
    pub y_bound_min: Option<f64>,
    pub y_bound_max: Option<f64>,
    pub log_scale: Option<bool>,
    pub show_grid: Option<bool>,
    pub value_format: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Fill opacity of the confidence band, 0.0 to 1.0.
    pub band_opacity: Option<f64>,
    pub palette: Option<Vec<String>>,
    /// Color overrides keyed by pivot group label.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub group_colors: IndexMap<String, String>,
    /// Anything else the host sent, including flat `color_<group>` keys.
    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, Value>,
}

/// Treat the empty string the host sends for a cleared select box as unset.
fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl UserConfig {
    pub fn field_x(&self) -> Option<&str> {
        selected(&self.field_x)
    }

    pub fn field_y(&self) -> Option<&str> {
        selected(&self.field_y)
    }

    pub fn ci_lower(&self) -> Option<&str> {
        selected(&self.ci_lower)
    }

    pub fn ci_upper(&self) -> Option<&str> {
        selected(&self.ci_upper)
    }

    pub fn value_format(&self) -> Option<&str> {
        selected(&self.value_format)
    }

    /// Color override for a group: `group_colors[group]`, else a flat `color_<group>` key.
    pub fn group_color(&self, group: &str) -> Option<&str> {
        if let Some(c) = self.group_colors.get(group) {
            return Some(c.as_str()).filter(|s| !s.trim().is_empty());
        }
        self.extra
            .get(&format!("{}{}", keys::GROUP_COLOR_PREFIX, group))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Every group that has a color override, from either spelling.
    pub fn overridden_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self.group_colors.keys().cloned().collect();
        for key in self.extra.keys() {
            if let Some(group) = key.strip_prefix(keys::GROUP_COLOR_PREFIX) {
                if !groups.iter().any(|g| g == group) {
                    groups.push(group.to_string());
                }
            }
        }
        groups
    }

    /// Merge another settings layer into this one (other takes precedence).
    pub fn merge(&mut self, other: UserConfig) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            field_x,
            field_y,
            ci_lower,
            ci_upper,
            y_bound_min,
            y_bound_max,
            log_scale,
            show_grid,
            value_format,
            x_label,
            y_label,
            band_opacity,
            palette
        );
        self.group_colors.extend(other.group_colors);
        self.extra.extend(other.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_selection_is_unset() {
        let config: UserConfig =
            serde_json::from_value(json!({"field_x": "", "field_y": "  ", "ci_lower": "lo"}))
                .unwrap();
        assert_eq!(config.field_x(), None);
        assert_eq!(config.field_y(), None);
        assert_eq!(config.ci_lower(), Some("lo"));
        assert_eq!(config.ci_upper(), None);
    }

    #[test]
    fn flat_color_keys_are_group_overrides() {
        let config: UserConfig = serde_json::from_value(json!({
            "group_colors": {"A": "#ff0000"},
            "color_B": "#00ff00",
            "unrelated": 3
        }))
        .unwrap();
        assert_eq!(config.group_color("A"), Some("#ff0000"));
        assert_eq!(config.group_color("B"), Some("#00ff00"));
        assert_eq!(config.group_color("C"), None);
        assert_eq!(config.overridden_groups(), vec!["A", "B"]);
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = UserConfig {
            field_x: Some("date".into()),
            show_grid: Some(true),
            ..Default::default()
        };
        base.merge(UserConfig {
            field_x: Some("week".into()),
            log_scale: Some(true),
            ..Default::default()
        });
        assert_eq!(base.field_x(), Some("week"));
        assert_eq!(base.show_grid, Some(true));
        assert_eq!(base.log_scale, Some(true));
    }

    #[test]
    fn toml_settings_parse() {
        let config: UserConfig = toml::from_str(
            r##"
field_x = "date"
y_bound_min = 0.0
log_scale = false

[group_colors]
A = "#123456"
"##,
        )
        .unwrap();
        assert_eq!(config.field_x(), Some("date"));
        assert_eq!(config.y_bound_min, Some(0.0));
        assert_eq!(config.group_color("A"), Some("#123456"));
    }
}
