//! @ai:module:intent Render aggregation results into a narrative prompt
//! @ai:module:layer application
//! @ai:module:public_api NarrativeRequest, markdown_table
//! @ai:module:stateless true

use crate::i18n::{Locale, LocalizationStore};
use crate::metrics::AggregationResult;

pub const TABLE_PLACEHOLDER: &str = "{{TABLE}}";

/// @ai:intent Everything needed to ask for one narrative
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub markdown_table: String,
    pub prompt_template: String,
    pub language: Locale,
}

impl NarrativeRequest {
    /// @ai:intent Build a request using the locale's headers and prompt template
    /// @ai:effects pure
    pub fn build(result: &AggregationResult, language: Locale, store: &dyn LocalizationStore) -> Self {
        let headers = [
            store.get(language, "task_column", "Task"),
            store.get(language, "count_column", "Count of Zeros"),
            store.get(language, "percentage_column", "Percentage of Zero Scores"),
        ];

        Self {
            markdown_table: markdown_table(result, &headers),
            prompt_template: store.prompt_template(language),
            language,
        }
    }

    /// @ai:intent Substitute the table into the template
    /// @ai:effects pure
    pub fn prompt(&self) -> String {
        self.prompt_template
            .replace(TABLE_PLACEHOLDER, self.markdown_table.trim_end())
    }
}

/// @ai:intent Three-column Markdown table: display name, zero count, zero percentage
/// @ai:effects pure
pub fn markdown_table(result: &AggregationResult, headers: &[String; 3]) -> String {
    let mut markdown = format!("| {} |\n", headers.join(" | "));
    markdown.push_str("|---|---|---|\n");

    for agg in &result.aggregates {
        markdown.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&agg.display_name),
            agg.zero_count,
            agg.zero_percentage
        ));
    }

    markdown
}

pub(crate) fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
