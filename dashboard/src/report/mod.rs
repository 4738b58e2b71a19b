//! @ai:module:intent Report generation for zero-score results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, ReportSynthesizer, ReportSpec, ReportError

pub mod charts;
pub mod document;
pub mod docx_writer;
pub mod json_report;
pub mod markdown_report;
pub mod synthesizer;

pub use charts::{ChartRenderer, ChartRendererTrait};
pub use document::{Block, ReportDocument};
pub use docx_writer::DocxWriter;
pub use json_report::{JsonReport, JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};
pub use synthesizer::{ReportSpec, ReportSynthesizer};

use crate::config::CreditsConfig;
use crate::i18n::{Locale, LocalizationStore};
use crate::metrics::AggregationResult;
use crate::narrative::NarrativeOutcome;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const DOCX_FILE: &str = "zero_scores_report.docx";
pub const MARKDOWN_FILE: &str = "zero_scores_report.md";
pub const JSON_FILE: &str = "zero_scores_results.json";
pub const CHART_FILE: &str = "zero_scores_chart.png";

/// @ai:intent Failures that abort report output
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to package document: {0}")]
    Package(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

/// @ai:intent Paths of the files written by one run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReports {
    pub docx: PathBuf,
    pub markdown: PathBuf,
    pub json: PathBuf,
    pub chart: Option<PathBuf>,
}

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    synthesizer: ReportSynthesizer,
    writer: DocxWriter,
    markdown: MarkdownReporter,
    json: JsonReporter,
    charts: ChartRenderer,
}

impl ReportGenerator {
    /// @ai:intent Create a generator sharing one localization store
    /// @ai:effects pure
    pub fn new(store: Arc<dyn LocalizationStore>, credits: Option<CreditsConfig>) -> Self {
        Self {
            synthesizer: ReportSynthesizer::new(store.clone(), credits),
            writer: DocxWriter::new(),
            markdown: MarkdownReporter::new(CHART_FILE),
            json: JsonReporter::new(),
            charts: ChartRenderer::new(store),
        }
    }

    /// @ai:intent Render the chart, then write the DOCX, Markdown and JSON reports
    /// @ai:post a chart failure degrades to a placeholder; other write failures are returned
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        result: &AggregationResult,
        outcome: &NarrativeOutcome,
        locale: Locale,
        generated_at: NaiveDateTime,
        output_dir: &Path,
    ) -> Result<GeneratedReports, ReportError> {
        std::fs::create_dir_all(output_dir).map_err(|source| ReportError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let chart_path = output_dir.join(CHART_FILE);
        let chart = match self.render_chart(result, locale, &chart_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Continuing without chart: {}", e);
                let _ = std::fs::remove_file(&chart_path);
                None
            }
        };
        let chart_written = chart.is_some();

        let spec = ReportSpec {
            result: result.clone(),
            narrative: outcome.text().map(str::to_string),
            chart,
            locale,
            generated_at,
        };
        let document = self.synthesizer.build_document(&spec);

        let docx_path = output_dir.join(DOCX_FILE);
        let bytes = self.writer.write(&document)?;
        std::fs::write(&docx_path, bytes).map_err(|source| ReportError::Io {
            path: docx_path.clone(),
            source,
        })?;

        let markdown_path = output_dir.join(MARKDOWN_FILE);
        self.markdown.generate(&document, &markdown_path)?;

        let json_path = output_dir.join(JSON_FILE);
        self.json.generate(
            &JsonReport::new(result, outcome, locale, generated_at),
            &json_path,
        )?;

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(GeneratedReports {
            docx: docx_path,
            markdown: markdown_path,
            json: json_path,
            chart: chart_written.then_some(chart_path),
        })
    }

    /// @ai:effects fs:write
    fn render_chart(
        &self,
        result: &AggregationResult,
        locale: Locale,
        path: &Path,
    ) -> Result<Vec<u8>, ReportError> {
        self.charts.render(result, locale, path)?;
        std::fs::read(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
