//! Conversation turns
//!
//! History entries arrive as loosely-shaped JSON. They are parsed once at the
//! boundary into [`Turn`]; entries that don't fit are skipped.

use serde::{Deserialize, Serialize};

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The suspected fraudster
    Scammer,
    /// The honeypot persona
    User,
    #[serde(other)]
    Unknown,
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
    /// Opaque client timestamp (string or epoch number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

impl Turn {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: None,
        }
    }

    /// Convenience constructor for a counterparty turn
    pub fn scammer(text: impl Into<String>) -> Self {
        Self::new(Sender::Scammer, text)
    }

    /// Whether this turn was written by the counterparty
    pub fn is_counterparty(&self) -> bool {
        self.sender == Sender::Scammer
    }
}

/// Parse raw history entries into turns, skipping malformed ones
pub fn parse_history(entries: &[serde_json::Value]) -> Vec<Turn> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match Turn::deserialize(entry) {
            Ok(turn) => Some(turn),
            Err(e) => {
                tracing::debug!(index, error = %e, "Skipping malformed history entry");
                None
            }
        })
        .collect()
}

/// Texts of counterparty turns, in order
pub fn counterparty_texts(history: &[Turn]) -> impl Iterator<Item = &str> {
    history
        .iter()
        .filter(|t| t.is_counterparty())
        .map(|t| t.text.as_str())
}
