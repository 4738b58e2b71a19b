//! @ai:module:intent Narrative retrieval with rate-limit aware retry
//! @ai:module:layer application
//! @ai:module:public_api NarrativePipeline, NarrativeOutcome, RetryPolicy, Sleeper, TokioSleeper
//! @ai:module:stateless false

use crate::config::RetryConfig;
use crate::i18n::{Locale, LocalizationStore};
use crate::metrics::AggregationResult;
use crate::narrative::client::{GenerationError, TextGenerator};
use crate::narrative::prompt::NarrativeRequest;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// @ai:intent Terminal state of a narrative request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeOutcome {
    Success { text: String },
    /// No text-generation client is configured; nothing was sent.
    Unavailable { reason: String },
    QuotaExceeded,
    Failed { message: String },
}

impl NarrativeOutcome {
    /// @ai:intent Narrative text when the request succeeded
    /// @ai:effects pure
    pub fn text(&self) -> Option<&str> {
        match self {
            NarrativeOutcome::Success { text } => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            NarrativeOutcome::Success { text } => Some(text),
            _ => None,
        }
    }
}

/// @ai:intent Retry limits for one narrative request
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: config.initial_delay(),
            deadline: config.deadline(),
        }
    }
}

/// @ai:intent Trait for waiting between attempts
pub trait Sleeper: Send + Sync {
    /// @ai:intent Wait for the given duration
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// @ai:intent Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    /// @ai:effects time
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// @ai:intent Formats results into a prompt and retrieves a narrative from an optional client
pub struct NarrativePipeline<G: TextGenerator, S: Sleeper = TokioSleeper> {
    client: Option<G>,
    store: Arc<dyn LocalizationStore>,
    policy: RetryPolicy,
    sleeper: S,
}

impl<G: TextGenerator> NarrativePipeline<G, TokioSleeper> {
    /// @ai:intent Create a pipeline; `client` is resolved once by the caller
    /// @ai:effects pure
    pub fn new(client: Option<G>, store: Arc<dyn LocalizationStore>, policy: RetryPolicy) -> Self {
        Self {
            client,
            store,
            policy,
            sleeper: TokioSleeper,
        }
    }
}

impl<G: TextGenerator, S: Sleeper> NarrativePipeline<G, S> {
    /// @ai:intent Replace the sleeper (for testing)
    /// @ai:effects pure
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> NarrativePipeline<G, T> {
        NarrativePipeline {
            client: self.client,
            store: self.store,
            policy: self.policy,
            sleeper,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// @ai:intent Request a narrative interpretation of the results
    /// @ai:post never fails; every failure class resolves to a NarrativeOutcome
    /// @ai:effects network, time
    pub async fn request_narrative(
        &self,
        result: &AggregationResult,
        language: Locale,
    ) -> NarrativeOutcome {
        let Some(ref client) = self.client else {
            return NarrativeOutcome::Unavailable {
                reason: "no text-generation client configured".to_string(),
            };
        };

        let request = NarrativeRequest::build(result, language, self.store.as_ref());
        let prompt = request.prompt();

        let outcome = match self.policy.deadline {
            Some(limit) => {
                match tokio::time::timeout(limit, self.attempt_all(client, &prompt)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!("Narrative request exceeded its {:?} deadline", limit);
                        NarrativeOutcome::Failed {
                            message: format!("deadline of {}s exceeded", limit.as_secs()),
                        }
                    }
                }
            }
            None => self.attempt_all(client, &prompt).await,
        };

        match &outcome {
            NarrativeOutcome::Success { text } => {
                tracing::info!("Narrative received ({} chars)", text.len())
            }
            other => tracing::warn!("No narrative: {:?}", other),
        }
        outcome
    }

    /// @ai:intent Call the client until success or the attempt limit
    /// @ai:effects network, time
    async fn attempt_all(&self, client: &G, prompt: &str) -> NarrativeOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::info!("Requesting narrative (attempt {}/{})", attempt, max_attempts);

            let error = match client.generate(prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    return NarrativeOutcome::Success {
                        text: text.trim().to_string(),
                    };
                }
                Ok(_) => GenerationError::EmptyResponse,
                Err(e) => e,
            };

            let rate_limited = error.is_rate_limit();

            if attempt >= max_attempts {
                return if rate_limited {
                    NarrativeOutcome::QuotaExceeded
                } else {
                    NarrativeOutcome::Failed {
                        message: error.to_string(),
                    }
                };
            }

            tracing::warn!(
                "Attempt {} failed ({}); retrying in {}s",
                attempt,
                error,
                delay.as_secs()
            );
            self.sleeper.sleep(delay).await;

            // Only rate limits back off exponentially
            if rate_limited {
                delay *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::metrics::TaskAggregate;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, GenerationError>>>,
        fallback: Result<String, GenerationError>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<Result<String, GenerationError>>) -> Self {
            Self::with_fallback(script, Err(GenerationError::EmptyResponse))
        }

        fn with_fallback(
            script: Vec<Result<String, GenerationError>>,
            fallback: Result<String, GenerationError>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }

    impl TextGenerator for Arc<ScriptedGenerator> {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.as_ref().generate(prompt).await
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for Arc<RecordingSleeper> {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    struct StalledGenerator;

    impl TextGenerator for StalledGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            std::future::pending().await
        }
    }

    fn rate_limited() -> GenerationError {
        GenerationError::Http {
            status: 429,
            message: "Too Many Requests".to_string(),
        }
    }

    fn server_error() -> GenerationError {
        GenerationError::Http {
            status: 500,
            message: "backend unavailable".to_string(),
        }
    }

    fn result() -> AggregationResult {
        AggregationResult {
            aggregates: vec![TaskAggregate {
                task_id: "orf".to_string(),
                display_name: "Oral Reading Fluency".to_string(),
                zero_count: 7,
                total_count: 20,
                zero_percentage: 35.0,
            }],
            selection: vec!["orf".to_string()],
            skipped: vec![],
        }
    }

    fn store() -> Arc<dyn LocalizationStore> {
        Arc::new(Catalog::builtin().unwrap())
    }

    fn pipeline(
        generator: &Arc<ScriptedGenerator>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> NarrativePipeline<Arc<ScriptedGenerator>, Arc<RecordingSleeper>> {
        NarrativePipeline::new(Some(generator.clone()), store(), RetryPolicy::default())
            .with_sleeper(sleeper.clone())
    }

    #[tokio::test]
    async fn test_rate_limit_backs_off_exponentially() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Ok("third response".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let outcome = pipeline(&generator, &sleeper)
            .request_narrative(&result(), Locale::En)
            .await;

        assert_eq!(
            outcome,
            NarrativeOutcome::Success {
                text: "third response".to_string()
            }
        );
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(20), Duration::from_secs(40)]
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_generic_errors_use_constant_delay() {
        let generator = Arc::new(ScriptedGenerator::with_fallback(vec![], Err(server_error())));
        let sleeper = Arc::new(RecordingSleeper::default());

        let outcome = pipeline(&generator, &sleeper)
            .request_narrative(&result(), Locale::En)
            .await;

        assert_eq!(
            outcome,
            NarrativeOutcome::Failed {
                message: "API error (500): backend unavailable".to_string()
            }
        );
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(20), Duration::from_secs(20)]
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_is_quota_exceeded() {
        let generator = Arc::new(ScriptedGenerator::with_fallback(
            vec![],
            Err(GenerationError::Transport("quota exhausted".to_string())),
        ));
        let sleeper = Arc::new(RecordingSleeper::default());

        let outcome = pipeline(&generator, &sleeper)
            .request_narrative(&result(), Locale::En)
            .await;

        assert_eq!(outcome, NarrativeOutcome::QuotaExceeded);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_generic_error_after_rate_limit_keeps_current_delay() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(rate_limited()),
            Err(server_error()),
            Ok("done".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let outcome = pipeline(&generator, &sleeper)
            .request_narrative(&result(), Locale::En)
            .await;

        assert_eq!(outcome.text(), Some("done"));
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(20), Duration::from_secs(40)]
        );
    }

    #[tokio::test]
    async fn test_blank_response_is_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("   ".to_string()),
            Ok("  narrative  ".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let outcome = pipeline(&generator, &sleeper)
            .request_narrative(&result(), Locale::En)
            .await;

        assert_eq!(outcome.into_text().as_deref(), Some("narrative"));
        assert_eq!(sleeper.delays.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_client_is_unavailable() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let pipeline: NarrativePipeline<Arc<ScriptedGenerator>, _> =
            NarrativePipeline::new(None, store(), RetryPolicy::default())
                .with_sleeper(sleeper.clone());

        assert!(!pipeline.is_available());
        let outcome = pipeline.request_narrative(&result(), Locale::En).await;

        assert!(matches!(outcome, NarrativeOutcome::Unavailable { .. }));
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_contains_localized_table() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("ok".to_string())]));
        let sleeper = Arc::new(RecordingSleeper::default());

        pipeline(&generator, &sleeper)
            .request_narrative(&result(), Locale::Fr)
            .await;

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("| Tâche |"));
        assert!(prompts[0].contains("| Oral Reading Fluency | 7 | 35 |"));
    }

    #[tokio::test]
    async fn test_deadline_preempts_stalled_request() {
        let policy = RetryPolicy {
            deadline: Some(Duration::from_millis(50)),
            ..RetryPolicy::default()
        };
        let pipeline = NarrativePipeline::new(Some(StalledGenerator), store(), policy);

        let outcome = pipeline.request_narrative(&result(), Locale::En).await;
        assert!(matches!(outcome, NarrativeOutcome::Failed { ref message } if message.contains("deadline")));
    }

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_attempts: 0,
            initial_delay_secs: 5,
            deadline_secs: Some(60),
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_delay, Duration::from_secs(5));
        assert_eq!(policy.deadline, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(NarrativeOutcome::QuotaExceeded).unwrap();
        assert_eq!(json["kind"], "quota_exceeded");
    }
}
