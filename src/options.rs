//! The option descriptor echoed to the host on every render pass.
//!
//! The static schema lists the recognized option keys. Field choices depend on the current
//! query shape, so the descriptor is rebuilt per pass. Per-group color options live in a
//! separate map next to it.

use crate::color::DEFAULT_PALETTE;
use crate::field::{FieldMeta, QueryShape};
use crate::settings::keys;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    String,
    Boolean,
    Number,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayHint {
    Select,
    Text,
    Number,
    Color,
    Colors,
}

/// One selectable field, serialized the way the host expects: `{"<label_short>": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChoice {
    pub label: String,
    pub value: String,
}

impl OptionChoice {
    fn from_field(field: &FieldMeta) -> Self {
        Self {
            label: field.display_label().to_string(),
            value: field.name.clone(),
        }
    }
}

impl Serialize for OptionChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    pub label: String,
    pub section: &'static str,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<OptionChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub order: usize,
}

impl OptionSpec {
    fn new(label: &str, section: &'static str, option_type: OptionType, order: usize) -> Self {
        Self {
            label: label.to_string(),
            section,
            option_type,
            display: None,
            values: None,
            default: None,
            order,
        }
    }

    fn display(mut self, hint: DisplayHint) -> Self {
        self.display = Some(hint);
        self
    }

    fn choices(mut self, values: Vec<OptionChoice>) -> Self {
        self.display = Some(DisplayHint::Select);
        self.values = Some(values);
        self
    }

    fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Color option generated for one observed pivot group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorOption {
    /// Host option key, `color_<group>`.
    pub key: String,
    pub label: String,
    pub section: &'static str,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub display: DisplayHint,
    pub default: String,
}

impl ColorOption {
    pub fn for_group(group: &str, default: impl Into<String>) -> Self {
        Self {
            key: format!("{}{}", keys::GROUP_COLOR_PREFIX, group),
            label: format!("{group} Color"),
            section: SECTION_SERIES,
            option_type: OptionType::String,
            display: DisplayHint::Color,
            default: default.into(),
        }
    }
}

pub const SECTION_DATA: &str = "Data";
pub const SECTION_Y_AXIS: &str = "Y Axis";
pub const SECTION_STYLE: &str = "Style";
pub const SECTION_SERIES: &str = "Series";

/// Ordered mapping option key → spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionsDescriptor {
    options: IndexMap<String, OptionSpec>,
}

impl OptionsDescriptor {
    /// Build the full schema with field choices taken from `shape`.
    pub fn for_shape(shape: &QueryShape) -> Self {
        let x_choices: Vec<OptionChoice> = shape
            .dimensions
            .iter()
            .chain(shape.measure_like())
            .map(OptionChoice::from_field)
            .collect();
        let measure_choices: Vec<OptionChoice> =
            shape.measure_like().map(OptionChoice::from_field).collect();

        let mut options = IndexMap::new();
        let mut add = |key: &str, spec: OptionSpec| {
            options.insert(key.to_string(), spec);
        };

        add(
            keys::FIELD_X,
            OptionSpec::new("X Field", SECTION_DATA, OptionType::String, 1).choices(x_choices),
        );
        add(
            keys::FIELD_Y,
            OptionSpec::new("Value Field", SECTION_DATA, OptionType::String, 2)
                .choices(measure_choices.clone()),
        );
        add(
            keys::CI_LOWER,
            OptionSpec::new("CI Lower Field", SECTION_DATA, OptionType::String, 3)
                .choices(measure_choices.clone()),
        );
        add(
            keys::CI_UPPER,
            OptionSpec::new("CI Upper Field", SECTION_DATA, OptionType::String, 4)
                .choices(measure_choices),
        );
        add(
            keys::Y_BOUND_MIN,
            OptionSpec::new("Minimum Value", SECTION_Y_AXIS, OptionType::Number, 1)
                .display(DisplayHint::Number),
        );
        add(
            keys::Y_BOUND_MAX,
            OptionSpec::new("Maximum Value", SECTION_Y_AXIS, OptionType::Number, 2)
                .display(DisplayHint::Number),
        );
        add(
            keys::LOG_SCALE,
            OptionSpec::new("Log Scale", SECTION_Y_AXIS, OptionType::Boolean, 3)
                .default_value(json!(false)),
        );
        add(
            keys::VALUE_FORMAT,
            OptionSpec::new("Value Format", SECTION_Y_AXIS, OptionType::String, 4)
                .display(DisplayHint::Text),
        );
        add(
            keys::Y_LABEL,
            OptionSpec::new("Y Axis Label", SECTION_Y_AXIS, OptionType::String, 5)
                .display(DisplayHint::Text),
        );
        add(
            keys::X_LABEL,
            OptionSpec::new("X Axis Label", SECTION_STYLE, OptionType::String, 1)
                .display(DisplayHint::Text),
        );
        add(
            keys::SHOW_GRID,
            OptionSpec::new("Show Grid", SECTION_STYLE, OptionType::Boolean, 2)
                .default_value(json!(true)),
        );
        add(
            keys::BAND_OPACITY,
            OptionSpec::new("Band Opacity", SECTION_STYLE, OptionType::Number, 3)
                .display(DisplayHint::Number)
                .default_value(json!(0.25)),
        );
        add(
            keys::PALETTE,
            OptionSpec::new("Palette", SECTION_SERIES, OptionType::Array, 1)
                .display(DisplayHint::Colors)
                .default_value(json!(DEFAULT_PALETTE)),
        );

        Self { options }
    }

    pub fn get(&self, key: &str) -> Option<&OptionSpec> {
        self.options.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Choice values (field names) offered for a select option.
    pub fn choice_values(&self, key: &str) -> Vec<&str> {
        self.options
            .get(key)
            .and_then(|spec| spec.values.as_ref())
            .map(|values| values.iter().map(|c| c.value.as_str()).collect())
            .unwrap_or_default()
    }
}
