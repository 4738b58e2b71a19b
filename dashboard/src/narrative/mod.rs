//! @ai:module:intent Narrative interpretation of zero-score results via a text-generation service
//! @ai:module:layer application
//! @ai:module:public_api NarrativePipeline, NarrativeOutcome, TextGenerator, GeminiClient

pub mod api_key;
pub mod client;
pub mod gemini;
pub mod pipeline;
pub mod prompt;

pub use client::{GenerationError, MockTextGenerator, TextGenerator};
pub use gemini::GeminiClient;
pub use pipeline::{NarrativeOutcome, NarrativePipeline, RetryPolicy, Sleeper, TokioSleeper};
pub use prompt::{markdown_table, NarrativeRequest};
