//! Newsdesk Extractor
//!
//! Turns a raw newsletter email into a validated, structured insight record
//! using a two-pass reasoning protocol over an interchangeable LLM backend.
//!
//! # Overview
//!
//! Pass 1 lets the model reason freely about the email; Pass 2 replays that
//! analysis as conversation history and forces it into a JSON record. The
//! protocol tolerates non-conformant model output: JSON-shape failures are
//! recovered or absorbed into a recognized degraded record shape, never
//! raised.
//!
//! # Architecture
//!
//! ```text
//! Email text → Pass 1 (analysis) → Pass 2 (structuring) → JSON recovery
//!            → Extraction record (+ _metadata, _raw_reasoning)
//! ```
//!
//! # Key Features
//!
//! - **Two-Pass Protocol**: Free reasoning, then forced structuring with
//!   explicit history replay
//! - **Provider Agnostic**: Works with any `newsdesk-llm` backend
//! - **Configurable Prompts**: Optional TOML config overrides prompts and
//!   the output schema, with silent fallback to defaults
//! - **Graceful Degradation**: Unparseable structuring output becomes a
//!   degraded record carrying the raw text, never an error
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use newsdesk_extractor::AgenticExtractor;
//! use newsdesk_llm::ProviderFactory;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ProviderFactory::create("anthropic", "api-key", None)?;
//! let extractor = AgenticExtractor::new(Arc::from(provider))
//!     .with_progress(|msg| println!("{}", msg));
//!
//! let record = extractor.extract_file("newsletter.eml").await?;
//!
//! if record.is_degraded() {
//!     eprintln!("Model did not produce JSON");
//! } else {
//!     println!("{} stories", record.stories().len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;


pub use config::{ExtractionConfig, SchemaSpec};
pub use error::ExtractorError;
pub use extractor::{AgenticExtractor, ProgressCallback, MAX_EMAIL_CHARS};
pub use parser::{recover_record, PARSE_ERROR_KEY};
pub use prompt::{
    render_schema, render_structuring_prompt, PromptSet, TaskTemplate,
    DEFAULT_ANALYSIS_SYSTEM_PROMPT, DEFAULT_ANALYSIS_TASK_PROMPT,
};
pub use types::{
    Extraction, ExtractionMetadata, Story, TrendSignal, METADATA_KEY, RAW_REASONING_KEY,
};
