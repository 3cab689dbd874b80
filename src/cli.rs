//! Glue between the command-line definitions in `ciband-cli` and the library types.

use crate::resolve::FieldPolicy;
use crate::settings::UserConfig;
use crate::validation::Generation;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::Path;

pub use ciband_cli::{Args, FieldPolicyArg, GenerationArg, SettingsFormat};

impl From<GenerationArg> for Generation {
    fn from(arg: GenerationArg) -> Self {
        match arg {
            GenerationArg::Classic => Generation::Classic,
            GenerationArg::Declarative => Generation::Declarative,
        }
    }
}

impl From<FieldPolicyArg> for FieldPolicy {
    fn from(arg: FieldPolicyArg) -> Self {
        match arg {
            FieldPolicyArg::Strict => FieldPolicy::Strict,
            FieldPolicyArg::Lenient => FieldPolicy::Lenient,
        }
    }
}

/// Read a visualization settings file given with `--config`.
pub fn load_settings(path: &Path) -> Result<UserConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre!("Failed to read settings file at {}: {}", path.display(), e))?;

    match SettingsFormat::from_path(path) {
        SettingsFormat::Toml => toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse settings file at {}: {}", path.display(), e)),
        SettingsFormat::Json => serde_json::from_str(&content)
            .map_err(|e| eyre!("Failed to parse settings file at {}: {}", path.display(), e)),
    }
}
