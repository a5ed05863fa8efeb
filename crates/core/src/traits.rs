//! Traits for pluggable collaborators
//!
//! The turn pipeline depends only on these seams:
//! - [`EnrichmentOracle`] supplies a second evidence record for the same text
//! - [`ReplyGenerator`] turns the current analysis into a reply string

use async_trait::async_trait;

use crate::{EvidenceRecord, FraudCategory, Result};

/// Optional, fallible source of extra evidence.
///
/// Callers bound every call with a timeout and discard failures, so
/// implementations may simply return `Err` on any problem.
#[async_trait]
pub trait EnrichmentOracle: Send + Sync {
    /// Extract evidence from raw text
    async fn enrich(&self, text: &str) -> Result<EvidenceRecord>;

    /// Oracle name for logging
    fn name(&self) -> &str;
}

/// Inputs available to a reply generator
#[derive(Debug, Clone, Copy)]
pub struct ReplyContext<'a> {
    /// 1-based turn number within the session
    pub turn: u32,
    pub category: FraudCategory,
    /// Current inbound message text
    pub message: &'a str,
    /// Cumulative evidence so far
    pub evidence: &'a EvidenceRecord,
}

/// Produces the honeypot's reply for a turn
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, context: ReplyContext<'_>) -> Result<String>;

    fn name(&self) -> &str;
}
