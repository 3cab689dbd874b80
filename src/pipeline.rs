//! One render pass: validation, field resolution, flattening, then axis and series derivation.

use crate::axis::{AxisConfig, DEFAULT_TICK_COUNT};
use crate::config::AppConfig;
use crate::diagnostics::{groups, Diagnostic, ErrorSink};
use crate::error::RenderError;
use crate::field::QueryShape;
use crate::flatten::{flatten, GroupSet, PlotPoint};
use crate::options::{ColorOption, OptionsDescriptor};
use crate::resolve::{resolve_fields, ConfigWarning, FieldPolicy, ResolvedFields};
use crate::row::RawRow;
use crate::series::{build_series, group_color_options, Series};
use crate::settings::UserConfig;
use crate::validation::{self, Requirements};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Host payload: query shape, rows and the visualization settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub fields: QueryShape,
    #[serde(default)]
    pub data: Vec<RawRow>,
    #[serde(default)]
    pub config: UserConfig,
}

/// Everything the renderer needs for one chart.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub options: OptionsDescriptor,
    pub group_colors: IndexMap<String, ColorOption>,
    pub fields: ResolvedFields,
    pub points: Vec<PlotPoint>,
    pub groups: GroupSet,
    pub axes: AxisConfig,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone)]
pub struct Transformer {
    requirements: Requirements,
    policy: FieldPolicy,
    tick_count: usize,
    /// Lowest settings layer; the user's settings are merged over it.
    defaults: UserConfig,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            requirements: Requirements::default(),
            policy: FieldPolicy::default(),
            tick_count: DEFAULT_TICK_COUNT,
            defaults: UserConfig::default(),
        }
    }
}

impl Transformer {
    pub fn new(requirements: Requirements, policy: FieldPolicy) -> Self {
        Self {
            requirements,
            policy,
            ..Default::default()
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            requirements: config.requirements(),
            policy: config.fields.policy,
            tick_count: config.chart.y_tick_count,
            defaults: config.chart_defaults(),
        }
    }

    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Run one pass. Fatal errors are reported to `sink` under their group and returned; warnings
    /// are reported and the pass continues. Groups of passing phases are cleared.
    pub fn render(
        &self,
        shape: &QueryShape,
        rows: &[RawRow],
        config: &UserConfig,
        sink: &mut dyn ErrorSink,
    ) -> Result<RenderOutput, RenderError> {
        debug!(
            dimensions = shape.dimensions.len(),
            measures = shape.measure_like_count(),
            pivots = shape.pivot_count(),
            rows = rows.len(),
            "render pass"
        );

        validation::check(shape, &self.requirements, sink)?;

        let mut effective = self.defaults.clone();
        effective.merge(config.clone());

        let resolution = match resolve_fields(shape, &effective, self.policy) {
            Ok(r) => r,
            Err(e) => {
                report_warnings(e.warnings(), sink);
                return Err(self.fail(e.into(), sink));
            }
        };
        sink.clear_errors(groups::CONFIG);
        report_warnings(&resolution.warnings, sink);
        debug!(
            x = %resolution.fields.x,
            y = %resolution.fields.y,
            ci_lower = %resolution.fields.ci_lower,
            ci_upper = %resolution.fields.ci_upper,
            temporal = resolution.fields.x_is_temporal,
            pivoted = resolution.fields.pivoted,
            "resolved fields"
        );

        let flattened = match flatten(rows, &resolution.fields) {
            Ok(f) => f,
            Err(e) => return Err(self.fail(e.into(), sink)),
        };
        sink.clear_errors(groups::DATA);

        let axes = AxisConfig::derive(
            &flattened.points,
            &resolution.fields,
            &resolution.display,
            self.tick_count,
        );
        let series = build_series(&flattened, &resolution.display);
        let group_colors = group_color_options(&flattened, &resolution.display);

        Ok(RenderOutput {
            options: resolution.options,
            group_colors,
            fields: resolution.fields,
            points: flattened.points,
            groups: flattened.groups,
            axes,
            series,
        })
    }

    fn fail(&self, error: RenderError, sink: &mut dyn ErrorSink) -> RenderError {
        warn!(group = error.group(), "render failed: {}", error);
        sink.add_error(error.to_diagnostic(&self.requirements));
        error
    }
}

/// One descriptor per warning group, messages joined. Groups without warnings are cleared.
fn report_warnings(warnings: &[ConfigWarning], sink: &mut dyn ErrorSink) {
    let mut by_group: IndexMap<&'static str, (&'static str, Vec<String>)> = IndexMap::new();
    for w in warnings {
        warn!(group = w.group(), "{}", w);
        by_group
            .entry(w.group())
            .or_insert_with(|| (w.title(), Vec::new()))
            .1
            .push(w.to_string());
    }

    for group in groups::WARNINGS {
        match by_group.get(group) {
            Some((title, messages)) => {
                sink.add_error(Diagnostic::warning(group, *title, messages.join("; ")))
            }
            None => sink.clear_errors(group),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::field::FieldMeta;
    use crate::row::Cell;

    fn shape() -> QueryShape {
        QueryShape::new(
            vec![FieldMeta::new("d", "Day", "date_date")],
            vec![
                FieldMeta::new("v", "Value", "number"),
                FieldMeta::new("lo", "Lower", "number"),
                FieldMeta::new("hi", "Upper", "number"),
            ],
        )
    }

    fn row(d: &str, v: f64, lo: f64, hi: f64) -> RawRow {
        RawRow::new()
            .with("d", Cell::scalar(d))
            .with("v", Cell::scalar(v))
            .with("lo", Cell::scalar(lo))
            .with("hi", Cell::scalar(hi))
    }

    #[test]
    fn warnings_are_grouped_and_cleared() {
        let mut sink = Diagnostics::new();
        report_warnings(
            &[
                ConfigWarning::InvalidColor {
                    target: "palette".into(),
                    value: "x".into(),
                },
                ConfigWarning::InvalidColor {
                    target: "palette".into(),
                    value: "y".into(),
                },
            ],
            &mut sink,
        );
        let colors = sink.get(groups::COLORS).unwrap();
        assert!(colors.message.contains("'x'") && colors.message.contains("'y'"));
        assert!(!colors.is_error());

        report_warnings(&[], &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn config_error_reaches_sink_and_clears_on_success() {
        let transformer = Transformer::default().with_policy(FieldPolicy::Strict);
        let mut sink = Diagnostics::new();
        let rows = vec![row("2024-01-01", 10.0, 8.0, 12.0)];

        let err = transformer
            .render(&shape(), &rows, &UserConfig::default(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
        assert!(sink.get(groups::CONFIG).is_some());

        let config = UserConfig {
            field_x: Some("d".into()),
            field_y: Some("v".into()),
            ci_lower: Some("lo".into()),
            ci_upper: Some("hi".into()),
            ..Default::default()
        };
        transformer
            .render(&shape(), &rows, &config, &mut sink)
            .unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn app_defaults_sit_under_user_settings() {
        let mut app = AppConfig::default();
        app.chart.show_grid = false;
        app.chart.palette = vec!["#000000".into()];
        let transformer = Transformer::from_config(&app);

        let mut sink = Diagnostics::new();
        let config = UserConfig {
            show_grid: Some(true),
            ..Default::default()
        };
        let out = transformer
            .render(
                &shape(),
                &[row("2024-01-01", 10.0, 8.0, 12.0)],
                &config,
                &mut sink,
            )
            .unwrap();
        assert!(out.axes.show_grid);
        assert_eq!(out.series[0].color, "#000000");
    }
}
