use crate::color::{Rgb, DEFAULT_PALETTE};
use crate::format::ValueFormat;
use crate::resolve::FieldPolicy;
use crate::settings::UserConfig;
use crate::validation::{Generation, Requirements};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "config.toml";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration template, every setting commented out
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write the default template to `config.toml`, refusing to overwrite unless `force`
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read and parse `config.toml`; a missing file yields the defaults
    pub fn read_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,
    pub fields: FieldsConfig,
    pub validation: ValidationConfig,
    pub chart: ChartConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    pub policy: FieldPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub generation: Generation,
    pub min_dimensions: Option<usize>,
    pub max_dimensions: Option<usize>,
    pub min_measures: Option<usize>,
    pub max_measures: Option<usize>,
    pub min_pivots: Option<usize>,
    pub max_pivots: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub palette: Vec<String>,
    pub show_grid: bool,
    pub log_scale: bool,
    pub value_format: Option<String>,
    pub band_opacity: f64,
    pub y_tick_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            fields: FieldsConfig::default(),
            validation: ValidationConfig::default(),
            chart: ChartConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            show_grid: true,
            log_scale: false,
            value_format: None,
            band_opacity: 0.25,
            y_tick_count: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load from a specific config directory (default → `<dir>/config.toml`)
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(manager.read_config()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.fields.merge(other.fields);
        self.validation.merge(other.validation);
        self.chart.merge(other.chart);
        self.logging.merge(other.logging);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        self.validation.validate()?;
        self.chart.validate()?;

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" | "off" => {}
            _ => {
                return Err(eyre!(
                    "Invalid logging level: {}. Must be 'error', 'warn', 'info', 'debug', 'trace' or 'off'",
                    self.logging.level
                ))
            }
        }

        Ok(())
    }

    /// Requirements of the configured generation with any per-limit overrides applied
    pub fn requirements(&self) -> Requirements {
        self.validation.requirements()
    }

    /// Chart defaults as the lowest visualization settings layer
    pub fn chart_defaults(&self) -> UserConfig {
        UserConfig {
            show_grid: Some(self.chart.show_grid),
            log_scale: Some(self.chart.log_scale),
            value_format: self.chart.value_format.clone(),
            band_opacity: Some(self.chart.band_opacity),
            palette: Some(self.chart.palette.clone()),
            ..Default::default()
        }
    }
}

// Merge implementations for each config section
impl FieldsConfig {
    pub fn merge(&mut self, other: Self) {
        if other.policy != FieldPolicy::default() {
            self.policy = other.policy;
        }
    }
}

impl ValidationConfig {
    pub fn merge(&mut self, other: Self) {
        if other.generation != Generation::default() {
            self.generation = other.generation;
        }
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            min_dimensions,
            max_dimensions,
            min_measures,
            max_measures,
            min_pivots,
            max_pivots
        );
    }

    pub fn requirements(&self) -> Requirements {
        let mut req = Requirements::for_generation(self.generation);
        if let Some(v) = self.min_dimensions {
            req.min_dimensions = v;
        }
        if self.max_dimensions.is_some() {
            req.max_dimensions = self.max_dimensions;
        }
        if let Some(v) = self.min_measures {
            req.min_measures = v;
        }
        if self.max_measures.is_some() {
            req.max_measures = self.max_measures;
        }
        if let Some(v) = self.min_pivots {
            req.min_pivots = v;
        }
        if self.max_pivots.is_some() {
            req.max_pivots = self.max_pivots;
        }
        req
    }

    fn validate(&self) -> Result<()> {
        let req = self.requirements();
        let limits = [
            ("dimensions", req.min_dimensions, req.max_dimensions),
            ("measures", req.min_measures, req.max_measures),
            ("pivots", req.min_pivots, req.max_pivots),
        ];
        for (kind, min, max) in limits {
            if let Some(max) = max {
                if max < min {
                    return Err(eyre!(
                        "max_{} ({}) must not be less than min_{} ({})",
                        kind,
                        max,
                        kind,
                        min
                    ));
                }
            }
        }
        Ok(())
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.palette != default.palette {
            self.palette = other.palette;
        }
        if other.show_grid != default.show_grid {
            self.show_grid = other.show_grid;
        }
        if other.log_scale != default.log_scale {
            self.log_scale = other.log_scale;
        }
        if other.value_format.is_some() {
            self.value_format = other.value_format;
        }
        if other.band_opacity != default.band_opacity {
            self.band_opacity = other.band_opacity;
        }
        if other.y_tick_count != default.y_tick_count {
            self.y_tick_count = other.y_tick_count;
        }
    }

    /// Validate palette colors, the value format and numeric ranges
    fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            return Err(eyre!("chart.palette must contain at least one color"));
        }
        for color in &self.palette {
            Rgb::parse(color).map_err(|e| eyre!("Invalid color in chart.palette: {}", e))?;
        }
        if let Some(format) = &self.value_format {
            ValueFormat::parse(format).map_err(|e| eyre!("Invalid chart.value_format: {}", e))?;
        }
        if !(0.0..=1.0).contains(&self.band_opacity) {
            return Err(eyre!(
                "band_opacity must be between 0.0 and 1.0, got {}",
                self.band_opacity
            ));
        }
        if self.y_tick_count == 0 {
            return Err(eyre!("y_tick_count must be greater than 0"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LoggingConfig::default();
        if other.level != default.level {
            self.level = other.level;
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
