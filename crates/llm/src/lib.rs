//! LLM Evidence Enrichment
//!
//! Features:
//! - OpenAI-compatible chat completions backend (DeepSeek, OpenAI, vLLM)
//! - Extraction prompt asking for a JSON evidence object
//! - Lenient parsing of model output into an [`honeypot_core::EvidenceRecord`]

pub mod backend;
pub mod enrichment;
pub mod prompt;

pub use backend::{FinishReason, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig};
pub use enrichment::{parse_evidence, LlmEnrichmentOracle};
pub use prompt::{Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for honeypot_core::Error {
    fn from(err: LlmError) -> Self {
        honeypot_core::Error::Enrichment(err.to_string())
    }
}
