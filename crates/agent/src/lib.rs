//! Honeypot Agent
//!
//! Features:
//! - Per-turn pipeline: extraction, optional enrichment, classification
//! - Cumulative per-session conversation state
//! - Persona reply templates that probe for missing evidence

pub mod processing;
pub mod responder;
pub mod state;

pub use processing::{AgentConfig, EnrichmentOutcome, HoneypotAgent, TurnOutcome};
pub use responder::TemplateReplyGenerator;
pub use state::{ConversationState, SessionSnapshot};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Reply error: {0}")]
    Reply(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout")]
    Timeout,
}

impl From<honeypot_core::Error> for AgentError {
    fn from(err: honeypot_core::Error) -> Self {
        match err {
            honeypot_core::Error::Reply(msg) => AgentError::Reply(msg),
            honeypot_core::Error::Enrichment(msg) => AgentError::Enrichment(msg),
            honeypot_core::Error::InvalidInput(msg) => AgentError::InvalidInput(msg),
            honeypot_core::Error::Timeout(_) => AgentError::Timeout,
            other => AgentError::Reply(other.to_string()),
        }
    }
}

impl From<AgentError> for honeypot_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Reply(msg) => honeypot_core::Error::Reply(msg),
            AgentError::Enrichment(msg) => honeypot_core::Error::Enrichment(msg),
            AgentError::InvalidInput(msg) => honeypot_core::Error::InvalidInput(msg),
            AgentError::Timeout => honeypot_core::Error::Timeout(0),
        }
    }
}
