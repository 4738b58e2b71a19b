//! @ai:module:intent Markdown rendering of a report document
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter, MarkdownReporterTrait
//! @ai:module:stateless true

use crate::narrative::prompt::escape_cell;
use crate::report::document::{Block, ReportDocument, TableBlock, TextRun};
use crate::report::ReportError;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Write the document as Markdown
    fn generate(&self, document: &ReportDocument, output_path: &Path) -> Result<(), ReportError>;
}

/// @ai:intent Renders report blocks as GitHub-flavoured Markdown
pub struct MarkdownReporter {
    chart_file: String,
}

impl MarkdownReporter {
    /// @ai:intent Create a reporter linking images to `chart_file`
    /// @ai:effects pure
    pub fn new(chart_file: impl Into<String>) -> Self {
        Self {
            chart_file: chart_file.into(),
        }
    }

    fn runs(runs: &[TextRun]) -> String {
        runs.iter()
            .map(|r| {
                let text = r.text.as_str();
                match (r.bold, r.italic) {
                    (true, _) => format!("**{}**", text.trim_end()) + &text[text.trim_end().len()..],
                    (false, true) => format!("*{}*", text),
                    (false, false) => text.to_string(),
                }
            })
            .collect()
    }

    fn table(table: &TableBlock) -> String {
        let header: Vec<String> = table.header.iter().map(|h| escape_cell(h)).collect();
        let mut output = format!("| {} |\n", header.join(" | "));
        output.push_str(&format!("|{}\n", "---|".repeat(table.header.len())));
        for row in &table.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|c| {
                    let text = escape_cell(&c.text);
                    if c.color.is_some() {
                        format!("**{}**", text)
                    } else {
                        text
                    }
                })
                .collect();
            output.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        output
    }

    /// @ai:intent Render the document to a Markdown string
    /// @ai:effects pure
    pub fn render(&self, document: &ReportDocument) -> String {
        let mut output = String::new();
        let mut number = 0;
        let mut in_list = false;

        for block in &document.blocks {
            let is_list = matches!(block, Block::Bullet(_) | Block::Numbered(_));
            if in_list && !is_list {
                output.push('\n');
            }
            if !matches!(block, Block::Numbered(_)) {
                number = 0;
            }

            let rendered = match block {
                Block::Heading { level, text } => {
                    format!("{} {}\n\n", "#".repeat(usize::from(*level) + 1), text)
                }
                Block::Paragraph { runs, .. } => format!("{}\n\n", Self::runs(runs)),
                Block::Bullet(runs) => format!("- {}\n", Self::runs(runs)),
                Block::Numbered(runs) => {
                    number += 1;
                    format!("{}. {}\n", number, Self::runs(runs))
                }
                Block::Table(table) => format!("{}\n", Self::table(table)),
                Block::Image { caption, .. } => {
                    format!("![{}]({})\n\n", caption, self.chart_file)
                }
                Block::Placeholder(text) => format!("> {}\n\n", text),
                Block::PageBreak => "---\n\n".to_string(),
            };

            output.push_str(&rendered);
            in_list = is_list;
        }

        if in_list {
            output.push('\n');
        }

        output
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:effects fs:write
    fn generate(&self, document: &ReportDocument, output_path: &Path) -> Result<(), ReportError> {
        std::fs::write(output_path, self.render(document)).map_err(|source| ReportError::Io {
            path: output_path.to_path_buf(),
            source,
        })
    }
}
