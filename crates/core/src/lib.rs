//! Core traits and types for the fraud honeypot
//!
//! This crate provides foundational types used across all other crates:
//! - Evidence records and the cross-turn merge
//! - Fraud categories and classification results
//! - Conversation turns parsed from inbound history
//! - Engagement scoring policy
//! - Traits for pluggable enrichment and reply generation
//! - Error types

pub mod classification;
pub mod conversation;
pub mod engagement;
pub mod error;
pub mod evidence;
pub mod traits;

pub use classification::{ClassificationResult, FraudCategory};
pub use conversation::{counterparty_texts, parse_history, Sender, Turn};
pub use engagement::{EngagementMetrics, EngagementPolicy};
pub use error::{Error, Result};
pub use evidence::{EvidenceCategory, EvidenceRecord};
pub use traits::{EnrichmentOracle, ReplyContext, ReplyGenerator};
