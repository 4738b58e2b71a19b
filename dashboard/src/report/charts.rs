//! @ai:module:intent Bar chart of zero-score percentages
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartRenderer, ChartRendererTrait
//! @ai:module:stateless true

use crate::i18n::{Locale, LocalizationStore};
use crate::metrics::{
    AggregationResult, Severity, TaskAggregate, CONCERNING_THRESHOLD, CRITICAL_THRESHOLD,
    MONITOR_THRESHOLD,
};
use crate::report::ReportError;
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// @ai:intent Trait for chart rendering
pub trait ChartRendererTrait: Send + Sync {
    /// @ai:intent Render the chart as a PNG file at `output_path`
    fn render(
        &self,
        result: &AggregationResult,
        locale: Locale,
        output_path: &Path,
    ) -> Result<(), ReportError>;
}

/// @ai:intent Draws a horizontal bar chart sorted by ascending percentage
pub struct ChartRenderer {
    store: Arc<dyn LocalizationStore>,
    size: (u32, u32),
}

fn bar_color(severity: Severity) -> RGBColor {
    match severity {
        Severity::Critical => RGBColor(220, 20, 60),
        Severity::Concerning => RGBColor(255, 140, 0),
        Severity::Monitor => RGBColor(255, 215, 0),
        Severity::Acceptable => RGBColor(46, 139, 87),
    }
}

impl ChartRenderer {
    /// @ai:intent Create a renderer using localized titles
    /// @ai:effects pure
    pub fn new(store: Arc<dyn LocalizationStore>) -> Self {
        Self {
            store,
            size: (1000, 600),
        }
    }

    /// @ai:effects fs:write
    fn draw(&self, bars: &[&TaskAggregate], locale: Locale, output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let title = self.store.get(
            locale,
            "zero_scores_chart_title",
            "Percentage of Students with Zero Scores by Task",
        );
        let x_desc = self
            .store
            .get(locale, "percentage_column", "Percentage of Zero Scores");

        let max_pct = bars.iter().map(|a| a.zero_percentage).fold(0.0, f64::max);
        let x_max = (max_pct.max(CRITICAL_THRESHOLD) + 10.0).min(105.0);
        let rows = bars.len() as i32;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(260)
            .build_cartesian_2d(0f64..x_max, (0..rows).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(x_desc)
            .y_labels(bars.len())
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => bars
                    .get(*i as usize)
                    .map(|a| a.display_name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, agg)| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (agg.zero_percentage, SegmentValue::Exact(i + 1)),
                ],
                bar_color(agg.severity()).filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))?;

        chart.draw_series(bars.iter().enumerate().map(|(i, agg)| {
            Text::new(
                format!("{:.1}%", agg.zero_percentage),
                (agg.zero_percentage + 0.5, SegmentValue::CenterOf(i as i32)),
                ("sans-serif", 14),
            )
        }))?;

        for (threshold, color) in [
            (MONITOR_THRESHOLD, bar_color(Severity::Monitor)),
            (CONCERNING_THRESHOLD, bar_color(Severity::Concerning)),
            (CRITICAL_THRESHOLD, bar_color(Severity::Critical)),
        ] {
            chart.draw_series(DashedLineSeries::new(
                vec![
                    (threshold, SegmentValue::Exact(0)),
                    (threshold, SegmentValue::Exact(rows)),
                ],
                8,
                6,
                color.stroke_width(2),
            ))?;
        }

        root.present()?;
        Ok(())
    }
}

impl ChartRendererTrait for ChartRenderer {
    /// @ai:pre result has at least one aggregate
    /// @ai:effects fs:write
    fn render(
        &self,
        result: &AggregationResult,
        locale: Locale,
        output_path: &Path,
    ) -> Result<(), ReportError> {
        if result.is_empty() {
            return Err(ReportError::Chart("no aggregates to plot".to_string()));
        }

        let mut bars: Vec<&TaskAggregate> = result.aggregates.iter().collect();
        bars.sort_by(|a, b| a.zero_percentage.total_cmp(&b.zero_percentage));

        self.draw(&bars, locale, output_path)
            .map_err(|e| ReportError::Chart(format!("{:#}", e)))?;

        tracing::info!("Chart written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use tempfile::TempDir;

    fn renderer() -> ChartRenderer {
        ChartRenderer::new(Arc::new(Catalog::builtin().unwrap()))
    }

    fn result() -> AggregationResult {
        AggregationResult {
            aggregates: vec![
                TaskAggregate {
                    task_id: "orf".to_string(),
                    display_name: "Oral Reading Fluency".to_string(),
                    zero_count: 7,
                    total_count: 20,
                    zero_percentage: 35.0,
                },
                TaskAggregate {
                    task_id: "addition".to_string(),
                    display_name: "Addition".to_string(),
                    zero_count: 1,
                    total_count: 20,
                    zero_percentage: 5.0,
                },
            ],
            selection: vec!["orf".to_string(), "addition".to_string()],
            skipped: vec![],
        }
    }

    #[test]
    fn test_empty_result_is_rejected() {
        let temp = TempDir::new().unwrap();
        let empty = AggregationResult {
            aggregates: vec![],
            selection: vec![],
            skipped: vec![],
        };

        let err = renderer()
            .render(&empty, Locale::En, &temp.path().join("chart.png"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Chart(_)));
    }

    #[test]
    fn test_render_writes_decodable_png_or_reports_chart_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chart.png");

        // Text rendering depends on system fonts; a headless host may lack them.
        match renderer().render(&result(), Locale::En, &path) {
            Ok(()) => {
                let bytes = std::fs::read(&path).unwrap();
                assert!(image::load_from_memory(&bytes).is_ok());
            }
            Err(e) => assert!(matches!(e, ReportError::Chart(_))),
        }
    }

    #[test]
    fn test_bar_colors_follow_severity() {
        let critical = bar_color(Severity::Critical);
        assert_eq!((critical.0, critical.1, critical.2), (220, 20, 60));
        let concerning = bar_color(Severity::Concerning);
        assert_eq!((concerning.0, concerning.1, concerning.2), (255, 140, 0));
    }
}
