//! Data preparation for confidence-interval line charts.
//!
//! A BI host hands over a query result (field metadata plus rows) and the user's visualization
//! settings. [`Transformer::render`] validates the shape, resolves which fields feed the line and
//! its confidence band, flattens the rows into plot points (one per pivot group when the query is
//! pivoted) and derives the axis and series configuration a renderer draws from.

pub mod axis;
pub mod cli;
pub mod color;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod flatten;
pub mod format;
pub mod options;
pub mod pipeline;
pub mod resolve;
pub mod row;
pub mod series;
pub mod settings;
pub mod validation;

pub use axis::{x_domain, y_domain, AxisConfig, XDomain};
pub use cli::Args;
pub use config::{AppConfig, ConfigManager};
pub use diagnostics::{Diagnostic, Diagnostics, ErrorSink, Severity};
pub use error::RenderError;
pub use field::{FieldMeta, QueryShape};
pub use flatten::{flatten, FlattenError, Flattened, GroupSet, PlotPoint, XValue};
pub use options::{ColorOption, OptionsDescriptor};
pub use pipeline::{RenderOutput, RenderRequest, Transformer};
pub use resolve::{
    resolve_fields, ConfigError, ConfigWarning, FieldPolicy, ResolvedFields, NO_PIVOT_GROUP,
};
pub use row::{Cell, CellValue, RawRow};
pub use settings::UserConfig;
pub use validation::{validate, Generation, Requirements, ValidationError};

/// Application name used for the config directory
pub const APP_NAME: &str = "ciband";
