//! Shape validation: reject query results the chart cannot be drawn from.

use crate::diagnostics::{groups, Diagnostic, ErrorSink};
use crate::field::QueryShape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which chart generation's requirements apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// d3 renderers: at least one dimension, measures unchecked.
    Classic,
    /// Chart-library renderers: at least one dimension and three measures.
    #[default]
    Declarative,
}

/// Inclusive bounds on the number of pivots, dimensions and measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub min_pivots: usize,
    pub max_pivots: Option<usize>,
    pub min_dimensions: usize,
    pub max_dimensions: Option<usize>,
    pub min_measures: usize,
    pub max_measures: Option<usize>,
}

impl Requirements {
    pub fn for_generation(generation: Generation) -> Self {
        match generation {
            Generation::Classic => Self {
                min_pivots: 0,
                max_pivots: None,
                min_dimensions: 1,
                max_dimensions: None,
                min_measures: 0,
                max_measures: None,
            },
            Generation::Declarative => Self {
                min_pivots: 0,
                max_pivots: None,
                min_dimensions: 1,
                max_dimensions: None,
                min_measures: 3,
                max_measures: None,
            },
        }
    }
}

impl Default for Requirements {
    fn default() -> Self {
        Self::for_generation(Generation::default())
    }
}

impl From<Generation> for Requirements {
    fn from(generation: Generation) -> Self {
        Self::for_generation(generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the query has no dimensions")]
    NoDimensions,

    #[error("the query has {found} measures, at least {required} are required")]
    InsufficientMeasures { required: usize, found: usize },

    #[error("the query has {found} measures, at most {max} are allowed")]
    TooManyMeasures { max: usize, found: usize },

    #[error("the query has {found} dimensions, expected {}", count_range(.min, .max))]
    DimensionCount {
        min: usize,
        max: Option<usize>,
        found: usize,
    },

    #[error("the query has {found} pivots, expected {}", count_range(.min, .max))]
    PivotCount {
        min: usize,
        max: Option<usize>,
        found: usize,
    },
}

fn count_range(min: &usize, max: &Option<usize>) -> String {
    match max {
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    }
}

/// "You need 1 to 2 dimensions", "You need 3 measures".
fn message_from_limits(min: usize, max: Option<usize>, kind: &str) -> String {
    let mut message = format!("You need {min}");
    if let Some(max) = max {
        message.push_str(&format!(" to {max}"));
    }
    message.push(' ');
    message.push_str(kind);
    message
}

impl ValidationError {
    /// Error group the host uses to clear this class of problem.
    pub fn group(&self) -> &'static str {
        match self {
            Self::PivotCount { .. } => groups::PIVOTS,
            Self::NoDimensions | Self::DimensionCount { .. } => groups::DIMENSIONS,
            Self::InsufficientMeasures { .. } | Self::TooManyMeasures { .. } => groups::MEASURES,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PivotCount { .. } => "Incompatible Pivot Data",
            Self::NoDimensions | Self::DimensionCount { .. } => "Incompatible Dimension Data",
            Self::InsufficientMeasures { .. } | Self::TooManyMeasures { .. } => {
                "Incompatible Measure Data"
            }
        }
    }

    pub fn to_diagnostic(&self, requirements: &Requirements) -> Diagnostic {
        let message = match self {
            Self::PivotCount { .. } => {
                message_from_limits(requirements.min_pivots, requirements.max_pivots, "pivots")
            }
            Self::NoDimensions | Self::DimensionCount { .. } => message_from_limits(
                requirements.min_dimensions.max(1),
                requirements.max_dimensions,
                "dimensions",
            ),
            Self::InsufficientMeasures { .. } | Self::TooManyMeasures { .. } => {
                message_from_limits(
                    requirements.min_measures,
                    requirements.max_measures,
                    "measures",
                )
            }
        };
        Diagnostic::error(self.group(), self.title(), message)
    }
}

fn check_pivots(shape: &QueryShape, req: &Requirements) -> Result<(), ValidationError> {
    let found = shape.pivot_count();
    if found < req.min_pivots || req.max_pivots.is_some_and(|max| found > max) {
        return Err(ValidationError::PivotCount {
            min: req.min_pivots,
            max: req.max_pivots,
            found,
        });
    }
    Ok(())
}

fn check_dimensions(shape: &QueryShape, req: &Requirements) -> Result<(), ValidationError> {
    let found = shape.dimensions.len();
    if found == 0 && req.min_dimensions > 0 {
        return Err(ValidationError::NoDimensions);
    }
    if found < req.min_dimensions || req.max_dimensions.is_some_and(|max| found > max) {
        return Err(ValidationError::DimensionCount {
            min: req.min_dimensions,
            max: req.max_dimensions,
            found,
        });
    }
    Ok(())
}

fn check_measures(shape: &QueryShape, req: &Requirements) -> Result<(), ValidationError> {
    let found = shape.measure_like_count();
    if found < req.min_measures {
        return Err(ValidationError::InsufficientMeasures {
            required: req.min_measures,
            found,
        });
    }
    if let Some(max) = req.max_measures {
        if found > max {
            return Err(ValidationError::TooManyMeasures { max, found });
        }
    }
    Ok(())
}

/// Check pivots, then dimensions, then measures. Returns the first failure.
pub fn validate(shape: &QueryShape, requirements: &Requirements) -> Result<(), ValidationError> {
    check_pivots(shape, requirements)?;
    check_dimensions(shape, requirements)?;
    check_measures(shape, requirements)
}

/// Run [`validate`] against a sink: each passing check clears its own group, the first failing
/// check reports and stops. Later groups are left as they were.
pub fn check(
    shape: &QueryShape,
    requirements: &Requirements,
    sink: &mut dyn ErrorSink,
) -> Result<(), ValidationError> {
    let checks: [(&str, fn(&QueryShape, &Requirements) -> Result<(), ValidationError>); 3] = [
        (groups::PIVOTS, check_pivots),
        (groups::DIMENSIONS, check_dimensions),
        (groups::MEASURES, check_measures),
    ];
    for (group, run) in checks {
        match run(shape, requirements) {
            Ok(()) => sink.clear_errors(group),
            Err(e) => {
                sink.add_error(e.to_diagnostic(requirements));
                return Err(e);
            }
        }
    }
    Ok(())
}
