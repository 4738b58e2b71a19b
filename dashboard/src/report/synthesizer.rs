//! @ai:module:intent Assemble the localized report sections into a document and DOCX bytes
//! @ai:module:layer application
//! @ai:module:public_api ReportSynthesizer, ReportSpec, narrative_blocks, format_timestamp
//! @ai:module:stateless true

use crate::config::CreditsConfig;
use crate::i18n::{Locale, LocalizationStore};
use crate::metrics::{AggregationResult, ExecutiveSummary, Severity};
use crate::report::document::{
    severity_color, Alignment, Block, ReportDocument, TableBlock, TableCellText, TextRun,
};
use crate::report::docx_writer::DocxWriter;
use crate::report::ReportError;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use std::sync::Arc;

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// @ai:intent Everything one report is built from
#[derive(Debug, Clone)]
pub struct ReportSpec {
    pub result: AggregationResult,
    pub narrative: Option<String>,
    /// Encoded chart image; validated before embedding.
    pub chart: Option<Vec<u8>>,
    pub locale: Locale,
    pub generated_at: NaiveDateTime,
}

/// @ai:intent Format a timestamp with a strftime pattern, falling back on invalid patterns
/// @ai:effects pure
pub fn format_timestamp(timestamp: &NaiveDateTime, pattern: &str) -> String {
    let items: Vec<Item> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        tracing::warn!("Invalid date format '{}', using {}", pattern, FALLBACK_DATE_FORMAT);
        return timestamp.format(FALLBACK_DATE_FORMAT).to_string();
    }
    timestamp.format_with_items(items.into_iter()).to_string()
}

/// @ai:intent Map line-oriented Markdown narrative text to blocks
/// @ai:effects pure
pub fn narrative_blocks(text: &str) -> Vec<Block> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('#') {
                let hashes = line.chars().take_while(|c| *c == '#').count();
                let level = if hashes >= 3 { 3 } else { 2 };
                Block::heading(level, line.trim_start_matches('#').trim())
            } else if line.len() > 4 && line.starts_with("**") && line.ends_with("**") {
                Block::Paragraph {
                    runs: vec![TextRun::bold(line.replace("**", "").trim())],
                    align: Alignment::Left,
                }
            } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                Block::Bullet(inline_runs(item.trim()))
            } else {
                Block::Paragraph {
                    runs: inline_runs(line),
                    align: Alignment::Left,
                }
            }
        })
        .collect()
}

/// Splits `**bold**` spans out of a line. Unbalanced markers are kept as text.
fn inline_runs(line: &str) -> Vec<TextRun> {
    if line.matches("**").count() % 2 != 0 {
        return vec![TextRun::plain(line)];
    }

    line.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                TextRun::bold(part)
            } else {
                TextRun::plain(part)
            }
        })
        .collect()
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

struct Labels<'a> {
    store: &'a dyn LocalizationStore,
    locale: Locale,
}

impl Labels<'_> {
    fn get(&self, key: &str, default: &str) -> String {
        self.store.get(self.locale, key, default)
    }
}

/// @ai:intent Builds the fixed section sequence and serializes it to DOCX
pub struct ReportSynthesizer {
    store: Arc<dyn LocalizationStore>,
    credits: Option<CreditsConfig>,
    writer: DocxWriter,
}

impl ReportSynthesizer {
    /// @ai:intent Create a synthesizer; the credits page is emitted only when `credits` is set
    /// @ai:effects pure
    pub fn new(store: Arc<dyn LocalizationStore>, credits: Option<CreditsConfig>) -> Self {
        Self {
            store,
            credits,
            writer: DocxWriter::new(),
        }
    }

    /// @ai:intent Build and serialize the report
    /// @ai:post only packaging failures are returned; section failures become placeholders
    /// @ai:effects pure
    pub fn build_report(&self, spec: &ReportSpec) -> Result<Vec<u8>, ReportError> {
        let document = self.build_document(spec);
        self.writer.write(&document)
    }

    /// @ai:intent Build the report sections in their fixed order
    /// @ai:effects pure
    pub fn build_document(&self, spec: &ReportSpec) -> ReportDocument {
        let labels = Labels {
            store: self.store.as_ref(),
            locale: spec.locale,
        };
        let timestamp = format_timestamp(
            &spec.generated_at,
            &self.store.date_format(spec.locale),
        );

        let mut document = ReportDocument::new();
        document.extend(Self::cover(&labels, &timestamp));
        document.extend(Self::executive_summary(&labels, &spec.result));
        document.extend(Self::results_table(&labels, &spec.result));
        document.extend(Self::visualization(&labels, spec.chart.as_deref()));

        match spec.narrative.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(narrative) => document.extend(Self::interpretation(&labels, narrative)),
            None => document.extend(Self::recommendations(&labels, &spec.result)),
        }

        document.push(Block::PageBreak);
        document.extend(Self::methodology(&labels));
        document.push(Self::footer(&labels, &timestamp));

        if let Some(credits) = &self.credits {
            document.push(Block::PageBreak);
            document.extend(Self::credits(&labels, credits));
        }

        document
    }

    fn cover(labels: &Labels, timestamp: &str) -> Vec<Block> {
        vec![
            Block::heading(0, labels.get("title_zero_scores", "Zero Scores Analysis")),
            Block::centered(vec![
                TextRun::bold(format!("{}: ", labels.get("report_date", "Report date"))),
                TextRun::plain(timestamp),
            ]),
        ]
    }

    fn executive_summary(labels: &Labels, result: &AggregationResult) -> Vec<Block> {
        let summary = ExecutiveSummary::from_result(result);
        let intro = labels
            .get("summary_intro", "This report analyses {total} assessment tasks.")
            .replace("{total}", &summary.total_tasks.to_string());

        let mut blocks = vec![
            Block::heading(1, labels.get("executive_summary", "Executive Summary")),
            Block::paragraph(intro),
            Block::Paragraph {
                runs: vec![TextRun::bold(labels.get("key_statistics", "Key statistics:"))],
                align: Alignment::Left,
            },
            Block::bullet(format!(
                "{}: {}",
                labels.get("avg_zero_percentage", "Average percentage of zero scores"),
                percent(summary.avg_percentage)
            )),
            Block::bullet(format!(
                "{}: {}",
                labels.get("critical_tasks_label", "Critical tasks"),
                summary.critical_count
            )),
            Block::bullet(format!(
                "{}: {}",
                labels.get("concerning_tasks_label", "Concerning tasks"),
                summary.concerning_count
            )),
            Block::paragraph(labels.get("zero_meaning", "")),
        ];

        if !result.skipped.is_empty() {
            blocks.push(Block::paragraph(format!(
                "{}: {}",
                labels.get("skipped_tasks", "Tasks without any recorded score (excluded)"),
                result.skipped.join(", ")
            )));
        }

        blocks
    }

    fn results_table(labels: &Labels, result: &AggregationResult) -> Vec<Block> {
        let header = vec![
            labels.get("task_column", "Task"),
            labels.get("count_column", "Count of Zeros"),
            labels.get("percentage_column", "Percentage of Zero Scores"),
            labels.get("severity_column", "Level"),
        ];

        let rows = result
            .aggregates
            .iter()
            .map(|agg| {
                let severity = agg.severity();
                let color = severity_color(severity);
                vec![
                    TableCellText::plain(agg.display_name.as_str()),
                    TableCellText::plain(agg.zero_count.to_string()),
                    TableCellText::colored(format!("{:.2}%", agg.zero_percentage), color),
                    TableCellText::colored(labels.get(severity.label_key(), ""), color),
                ]
            })
            .collect();

        vec![
            Block::heading(1, labels.get("table_zero_scores", "Proportion of Students with Zero Scores")),
            Block::Table(TableBlock { header, rows }),
        ]
    }

    fn visualization(labels: &Labels, chart: Option<&[u8]>) -> Vec<Block> {
        let unavailable = labels.get("chart_unavailable", "Chart not available");
        let mut blocks = vec![Block::heading(1, labels.get("visualization_title", "Visualization"))];

        let Some(bytes) = chart else {
            blocks.push(Block::Placeholder(unavailable));
            return blocks;
        };

        match image::load_from_memory(bytes) {
            Ok(decoded) => blocks.push(Block::Image {
                bytes: bytes.to_vec(),
                width_px: decoded.width(),
                height_px: decoded.height(),
                caption: labels.get("zero_scores_chart_title", ""),
            }),
            Err(e) => {
                tracing::warn!("Chart could not be decoded, using placeholder: {}", e);
                blocks.push(Block::Placeholder(format!("{}: {}", unavailable, e)));
            }
        }

        blocks
    }

    fn interpretation(labels: &Labels, narrative: &str) -> Vec<Block> {
        let mut blocks = vec![
            Block::heading(1, labels.get("interpretation_title", "Educational Interpretation")),
            Block::Paragraph {
                runs: vec![TextRun::italic(labels.get("ai_notice", ""))],
                align: Alignment::Left,
            },
        ];
        blocks.extend(narrative_blocks(narrative));
        blocks
    }

    fn recommendations(labels: &Labels, result: &AggregationResult) -> Vec<Block> {
        let mut blocks = vec![Block::heading(1, labels.get("recommendations_title", "Recommendations"))];

        let tiers = [
            (Severity::Critical, "critical_areas", "critical_intro"),
            (Severity::Concerning, "concerning_areas", "concerning_intro"),
        ];

        let mut any_priority = false;
        for (severity, title_key, intro_key) in tiers {
            let tasks: Vec<_> = result.with_severity(severity).collect();
            if tasks.is_empty() {
                continue;
            }
            any_priority = true;

            blocks.push(Block::heading(2, labels.get(title_key, "")));
            blocks.push(Block::paragraph(labels.get(intro_key, "")));
            blocks.extend(tasks.iter().map(|agg| {
                Block::Bullet(vec![
                    TextRun::bold(format!("{}: ", agg.display_name)),
                    TextRun::plain(percent(agg.zero_percentage)),
                ])
            }));
        }

        if !any_priority {
            blocks.push(Block::paragraph(labels.get("no_priority_areas", "")));
        }

        blocks.push(Block::heading(2, labels.get("general_strategies", "General Intervention Strategies")));
        blocks.extend((1..=5).map(|n| Block::numbered(labels.get(&format!("strategy_{}", n), ""))));
        blocks
    }

    fn methodology(labels: &Labels) -> Vec<Block> {
        let mut blocks = vec![
            Block::heading(1, labels.get("methodology_title", "Methodological Notes")),
            Block::paragraph(labels.get("methodology_intro", "")),
            Block::Paragraph {
                runs: vec![TextRun::bold(labels.get("thresholds_title", "Interpretation thresholds:"))],
                align: Alignment::Left,
            },
        ];
        blocks.extend(
            ["tier_acceptable", "tier_monitor", "tier_concerning", "tier_critical"]
                .iter()
                .map(|key| Block::bullet(labels.get(key, ""))),
        );
        blocks.push(Block::paragraph(labels.get("methodology_meaning", "")));
        blocks.push(Block::paragraph(labels.get("methodology_basis", "")));
        blocks
    }

    fn footer(labels: &Labels, timestamp: &str) -> Block {
        Block::centered(vec![TextRun::italic(format!(
            "{} | {}",
            labels.get("footer_text", "Report generated by Datavizir Analytics"),
            timestamp
        ))])
    }

    fn credits(labels: &Labels, credits: &CreditsConfig) -> Vec<Block> {
        let line = |key: &str, default: &str, value: &str| Block::Paragraph {
            runs: vec![
                TextRun::bold(format!("{}: ", labels.get(key, default))),
                TextRun::plain(value),
            ],
            align: Alignment::Left,
        };

        let mut blocks = vec![
            Block::heading(1, labels.get("credits_title", "Credits and Information")),
            Block::heading(2, credits.project_name.as_str()),
            line("credits_developed_by", "Developed by", &credits.author),
        ];

        let optional = [
            ("credits_managed_by", "Managed by", &credits.organization),
            ("credits_website", "Website", &credits.website),
            ("credits_version", "Version", &credits.version),
            ("credits_license", "License", &credits.license),
        ];
        for (key, default, value) in optional {
            if let Some(value) = value {
                blocks.push(line(key, default, value));
            }
        }

        blocks.push(line(
            "credits_note",
            "Note",
            &labels.get("credits_attribution_note", ""),
        ));
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::metrics::TaskAggregate;
    use crate::report::document::{CONCERNING_COLOR, CRITICAL_COLOR};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn aggregate(task_id: &str, name: &str, zeros: u32, total: u32, pct: f64) -> TaskAggregate {
        TaskAggregate {
            task_id: task_id.to_string(),
            display_name: name.to_string(),
            zero_count: zeros,
            total_count: total,
            zero_percentage: pct,
        }
    }

    fn spec(narrative: Option<&str>, chart: Option<Vec<u8>>) -> ReportSpec {
        ReportSpec {
            result: AggregationResult {
                aggregates: vec![
                    aggregate("orf", "Oral Reading Fluency", 7, 20, 35.0),
                    aggregate("clpm", "Correct Letters Per Minute", 11, 50, 22.0),
                    aggregate("addition", "Addition", 1, 20, 5.0),
                ],
                selection: vec!["orf".into(), "clpm".into(), "addition".into()],
                skipped: vec![],
            },
            narrative: narrative.map(str::to_string),
            chart,
            locale: Locale::En,
            generated_at: NaiveDate::from_ymd_opt(2026, 3, 14)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    fn synthesizer(credits: Option<CreditsConfig>) -> ReportSynthesizer {
        ReportSynthesizer::new(Arc::new(Catalog::builtin().unwrap()), credits)
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 4));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageOutputFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_rule_based_report_flags_priority_tasks() {
        let doc = synthesizer(None).build_document(&spec(None, None));
        let text = doc.plain_text();

        assert!(text.contains("Critical tasks (≥30% zero scores): 1"));
        assert!(text.contains("Concerning tasks (20-30% zero scores): 1"));
        assert!(text.contains("Oral Reading Fluency: 35.0%"));
        assert!(text.contains("Correct Letters Per Minute: 22.0%"));
        assert!(!text.contains("Addition: 5.0%"));

        assert_eq!(
            doc.headings(2),
            vec![
                "Critical Areas (≥30% zero scores)",
                "Concerning Areas (20-30% zero scores)",
                "General Intervention Strategies",
            ]
        );
        let numbered = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::Numbered(_)))
            .count();
        assert_eq!(numbered, 5);
    }

    #[test]
    fn test_results_table_colors_by_severity() {
        let doc = synthesizer(None).build_document(&spec(None, None));
        let table = doc.tables().next().unwrap();

        assert_eq!(table.header[0], "Task");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][2].text, "35.00%");
        assert_eq!(table.rows[0][2].color, Some(CRITICAL_COLOR));
        assert_eq!(table.rows[1][2].color, Some(CONCERNING_COLOR));
        assert_eq!(table.rows[2][2].color, None);
        assert_eq!(table.rows[2][3].text, "Acceptable");
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let doc = synthesizer(None).build_document(&spec(None, None));
        assert_eq!(doc.headings(0), vec!["Zero Scores Analysis"]);
        assert_eq!(
            doc.headings(1),
            vec![
                "Executive Summary",
                "Proportion of Students with Zero Scores",
                "Visualization",
                "Recommendations",
                "Methodological Notes",
            ]
        );
        assert!(doc.plain_text().contains("March 14, 2026 09:30"));
    }

    #[test]
    fn test_undecodable_chart_becomes_placeholder() {
        let synth = synthesizer(None);
        let spec = spec(None, Some(b"not an image".to_vec()));

        let doc = synth.build_document(&spec);
        assert!(!doc.has_image());
        let placeholders = doc.placeholders();
        assert_eq!(placeholders.len(), 1);
        assert!(placeholders[0].starts_with("Chart not available: "));
        assert_eq!(doc.headings(1).len(), 5);

        let bytes = synth.build_report(&spec).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_valid_chart_is_embedded() {
        let synth = synthesizer(None);
        let spec = spec(None, Some(png_bytes()));

        let doc = synth.build_document(&spec);
        assert!(doc.has_image());
        assert!(doc.placeholders().is_empty());

        let bytes = synth.build_report(&spec).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_narrative_replaces_rule_based_recommendations() {
        let narrative = "## 1. Pedagogical Interpretation\n\
                         **Summary:**\n\
                         Fluency is **weak** overall.\n\
                         - Reading practice\n\
                         * Phonics drills\n\
                         ### Sources\n";
        let doc = synthesizer(None).build_document(&spec(Some(narrative), None));

        assert!(doc.headings(1).contains(&"Educational Interpretation"));
        assert!(!doc.headings(1).contains(&"Recommendations"));
        assert_eq!(doc.headings(2), vec!["1. Pedagogical Interpretation"]);
        assert_eq!(doc.headings(3), vec!["Sources"]);
        assert!(doc
            .plain_text()
            .contains("This interpretation was generated by artificial intelligence."));
    }

    #[test]
    fn test_blank_narrative_falls_back_to_rules() {
        let doc = synthesizer(None).build_document(&spec(Some("  \n "), None));
        assert!(doc.headings(1).contains(&"Recommendations"));
    }

    #[test]
    fn test_narrative_blocks_mapping() {
        let blocks = narrative_blocks("## Title\n\n**Bold line**\n- item\nplain **mid** end\n");
        assert_eq!(
            blocks,
            vec![
                Block::heading(2, "Title"),
                Block::Paragraph {
                    runs: vec![TextRun::bold("Bold line")],
                    align: Alignment::Left,
                },
                Block::Bullet(vec![TextRun::plain("item")]),
                Block::Paragraph {
                    runs: vec![
                        TextRun::plain("plain "),
                        TextRun::bold("mid"),
                        TextRun::plain(" end"),
                    ],
                    align: Alignment::Left,
                },
            ]
        );
    }

    #[test]
    fn test_bold_line_with_inner_markers_drops_every_marker() {
        let blocks = narrative_blocks("**Summary:** reading is **weak**");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                runs: vec![TextRun::bold("Summary: reading is weak")],
                align: Alignment::Left,
            }]
        );
    }

    #[test]
    fn test_unbalanced_bold_markers_kept_as_text() {
        assert_eq!(inline_runs("a ** b"), vec![TextRun::plain("a ** b")]);
    }

    #[test]
    fn test_no_priority_areas_message() {
        let mut spec = spec(None, None);
        spec.result.aggregates.retain(|a| a.zero_percentage < 20.0);

        let text = synthesizer(None).build_document(&spec).plain_text();
        assert!(text.contains("No task reaches the concerning threshold"));
        assert!(text.contains("Critical tasks (≥30% zero scores): 0"));
    }

    #[test]
    fn test_credits_page_only_when_configured() {
        let credits = CreditsConfig {
            project_name: "Reading Baseline 2026".to_string(),
            author: "Field Team".to_string(),
            organization: Some("Ministry of Education".to_string()),
            website: None,
            version: Some("1.2".to_string()),
            license: None,
        };

        let without = synthesizer(None).build_document(&spec(None, None));
        assert!(!without.headings(1).contains(&"Credits and Information"));

        let with = synthesizer(Some(credits)).build_document(&spec(None, None));
        let text = with.plain_text();
        assert!(with.headings(1).contains(&"Credits and Information"));
        assert!(text.contains("Developed by: Field Team"));
        assert!(text.contains("Managed by: Ministry of Education"));
        assert!(text.contains("Version: 1.2"));
        assert!(!text.contains("Website:"));
    }

    #[test]
    fn test_french_labels() {
        let mut spec = spec(None, None);
        spec.locale = Locale::Fr;
        let doc = synthesizer(None).build_document(&spec);

        assert_eq!(doc.tables().next().unwrap().header[0], "Tâche");
        assert!(doc.plain_text().contains("14/03/2026 09:30"));
    }

    #[test]
    fn test_format_timestamp_rejects_bad_pattern() {
        let ts = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 0)
            .unwrap();
        assert_eq!(format_timestamp(&ts, "%Q"), "2026-01-02 03:04");
        assert_eq!(format_timestamp(&ts, "%d/%m/%Y"), "02/01/2026");
    }
}
