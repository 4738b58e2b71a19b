//! @ai:module:intent Configuration structs for the dashboard
//! @ai:module:layer infrastructure
//! @ai:module:public_api DashboardConfig, ApiConfig, RetryConfig, ReportConfig, CreditsConfig
//! @ai:module:stateless true

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// @ai:intent Main configuration for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// Attribution page appended to generated documents
    #[serde(default)]
    pub credits: Option<CreditsConfig>,
}

/// @ai:intent Text-generation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable (or `.env` entry) holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// @ai:intent Retry policy for narrative requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    /// Wall-clock ceiling for the whole request including backoff
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

/// @ai:intent Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Replaces the built-in prompt; must contain `{{TABLE}}`
    #[serde(default)]
    pub prompt_template_file: Option<PathBuf>,
}

/// @ai:intent Attribution details for the credits page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditsConfig {
    pub project_name: String,
    pub author: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay_secs(),
            deadline_secs: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            output_dir: default_output_dir(),
            prompt_template_file: None,
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    8000
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_secs() -> u64 {
    20
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl DashboardConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Read the prompt override file if one is configured
    /// @ai:effects fs:read
    pub fn load_prompt_override(&self) -> anyhow::Result<Option<String>> {
        let Some(ref path) = self.report.prompt_template_file else {
            return Ok(None);
        };

        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
        if !template.contains("{{TABLE}}") {
            anyhow::bail!(
                "Prompt template {} has no {{{{TABLE}}}} placeholder",
                path.display()
            );
        }
        Ok(Some(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay(), Duration::from_secs(20));
        assert!(config.retry.deadline().is_none());
        assert_eq!(config.api.max_output_tokens, 8000);
        assert_eq!(config.report.locale, "en");
        assert!(config.credits.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [retry]
            deadline_secs = 300

            [credits]
            project_name = "Datavizir Analytics"
            author = "Evaluation Team"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.deadline(), Some(Duration::from_secs(300)));
        assert_eq!(config.retry.max_attempts, 3);
        let credits = config.credits.unwrap();
        assert_eq!(credits.author, "Evaluation Team");
        assert!(credits.license.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dashboard.toml");

        let mut config = DashboardConfig::default();
        config.report.locale = "fr".to_string();
        config.save(&path).unwrap();

        let loaded = DashboardConfig::load(&path).unwrap();
        assert_eq!(loaded.report.locale, "fr");
        assert_eq!(loaded.api.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_prompt_override_requires_placeholder() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prompt.md");
        std::fs::write(&path, "Analyse these results").unwrap();

        let mut config = DashboardConfig::default();
        config.report.prompt_template_file = Some(path.clone());
        assert!(config.load_prompt_override().is_err());

        std::fs::write(&path, "Analyse:\n{{TABLE}}").unwrap();
        assert_eq!(
            config.load_prompt_override().unwrap().as_deref(),
            Some("Analyse:\n{{TABLE}}")
        );
    }
}
