use crate::diagnostics::{groups, Diagnostic};
use crate::flatten::FlattenError;
use crate::resolve::ConfigError;
use crate::validation::{Requirements, ValidationError};
use thiserror::Error;

/// A fatal render failure. No chart output is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

impl RenderError {
    pub fn group(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.group(),
            Self::Config(_) => groups::CONFIG,
            Self::Flatten(_) => groups::DATA,
        }
    }

    pub fn to_diagnostic(&self, requirements: &Requirements) -> Diagnostic {
        match self {
            Self::Validation(e) => e.to_diagnostic(requirements),
            Self::Config(e) => e.to_diagnostic(),
            Self::Flatten(e) => Diagnostic::error(groups::DATA, e.title(), e.to_string()),
        }
    }
}
