use ciband::config::{AppConfig, ConfigManager};
use ciband::{FieldPolicy, Generation, Transformer};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.fields.policy, FieldPolicy::Lenient);
    assert_eq!(config.validation.generation, Generation::Declarative);
    assert!(config.validation.max_measures.is_none());

    assert_eq!(config.chart.palette.len(), 12);
    assert!(config.chart.show_grid);
    assert!(!config.chart.log_scale);
    assert_eq!(config.chart.band_opacity, 0.25);
    assert_eq!(config.chart.y_tick_count, 5);

    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    assert!(template.contains("[fields]"));
    assert!(template.contains("[validation]"));
    assert!(template.contains("[chart]"));
    assert!(template.contains("[logging]"));
    assert!(template.contains("version = \"0.1\""));
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());
    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[chart]"));
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager
        .write_default_config(false)
        .expect("First write should succeed");

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn test_write_config_with_force_overwrites() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let first_path = config_manager
        .write_default_config(false)
        .expect("First write should succeed");
    let second_path = config_manager
        .write_default_config(true)
        .expect("Second write with force should succeed");

    assert_eq!(first_path, second_path);
    assert!(first_path.exists());
}

#[test]
fn test_load_with_no_file_gives_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).expect("Should load default config");
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_load_written_template_gives_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.write_default_config(false).unwrap();
    let config = AppConfig::load_from(&config_manager).expect("Template should load");
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_load_and_parse_minimal_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager
        .ensure_config_dir()
        .expect("Failed to create config dir");

    let minimal_config = r##"
version = "0.1"

[fields]
policy = "strict"

[validation]
generation = "classic"
max_dimensions = 2

[chart]
palette = ["#111111", "#222222"]
value_format = "0.0"
"##;
    fs::write(config_manager.config_path("config.toml"), minimal_config)
        .expect("Failed to write minimal config");

    let config = AppConfig::load_from(&config_manager).expect("Failed to load config");

    assert_eq!(config.fields.policy, FieldPolicy::Strict);
    assert_eq!(config.validation.generation, Generation::Classic);
    assert_eq!(config.requirements().max_dimensions, Some(2));
    assert_eq!(config.requirements().min_measures, 0);
    assert_eq!(config.chart.palette, vec!["#111111", "#222222"]);
    assert_eq!(config.chart.value_format.as_deref(), Some("0.0"));

    // Unspecified values keep their defaults
    assert!(config.chart.show_grid);
    assert_eq!(config.logging.level, "warn");

    let transformer = Transformer::from_config(&config);
    assert_eq!(transformer.policy(), FieldPolicy::Strict);
    assert_eq!(transformer.requirements().max_dimensions, Some(2));
}

#[test]
fn test_malformed_config_reports_path() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(config_manager.config_path("config.toml"), "[chart\n").unwrap();

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_merge_configs() {
    let mut base = AppConfig::default();
    let mut override_config = AppConfig::default();

    override_config.chart.log_scale = true;
    override_config.chart.y_tick_count = 8;
    override_config.logging.level = "debug".to_string();

    base.merge(override_config);

    assert!(base.chart.log_scale);
    assert_eq!(base.chart.y_tick_count, 8);
    assert_eq!(base.logging.level, "debug");

    // Unmodified values remain default
    assert!(base.chart.show_grid);
    assert_eq!(base.fields.policy, FieldPolicy::Lenient);
}

#[test]
fn test_validate_config_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_config_invalid_version() {
    let config = AppConfig {
        version: "1.0".to_string(),
        ..Default::default()
    };
    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Unsupported config version"));
}

#[test]
fn test_validate_config_invalid_palette_color() {
    let mut config = AppConfig::default();
    config.chart.palette = vec!["#3EB0D5".to_string(), "not-a-color".to_string()];
    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("chart.palette"));
}

#[test]
fn test_validate_config_invalid_opacity_and_level() {
    let mut config = AppConfig::default();
    config.chart.band_opacity = 1.5;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}
