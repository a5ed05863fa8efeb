//! Fraud categories and classification results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraud category.
///
/// Declaration order is significant: when two categories score equally the
/// one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FraudCategory {
    BankFraud,
    UpiFraud,
    Phishing,
    InvestmentScam,
    LotteryScam,
    /// Default low-severity category
    #[default]
    GenericScam,
}

impl FraudCategory {
    /// All categories in declaration order
    pub const ALL: [FraudCategory; 6] = [
        FraudCategory::BankFraud,
        FraudCategory::UpiFraud,
        FraudCategory::Phishing,
        FraudCategory::InvestmentScam,
        FraudCategory::LotteryScam,
        FraudCategory::GenericScam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankFraud => "bank_fraud",
            Self::UpiFraud => "upi_fraud",
            Self::Phishing => "phishing",
            Self::InvestmentScam => "investment_scam",
            Self::LotteryScam => "lottery_scam",
            Self::GenericScam => "generic_scam",
        }
    }
}

impl fmt::Display for FraudCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence floor for any classification
pub const MIN_CONFIDENCE: f64 = 0.6;
/// Confidence ceiling for any classification
pub const MAX_CONFIDENCE: f64 = 0.99;
/// Urgency signal cap
pub const MAX_URGENCY: u8 = 5;

/// Point-in-time classification of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: FraudCategory,
    /// Heuristic severity score in `[0.6, 0.99]`, not a probability
    pub confidence: f64,
    /// Matched indicators in evaluation order, at most 10
    pub indicators: Vec<String>,
    /// Number of urgency phrases matched, capped at 5
    pub urgency_signal: u8,
}

impl ClassificationResult {
    /// True when any keyword or urgency phrase matched
    pub fn has_signal(&self) -> bool {
        !self.indicators.is_empty()
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            category: FraudCategory::GenericScam,
            confidence: MIN_CONFIDENCE,
            indicators: Vec::new(),
            urgency_signal: 0,
        }
    }
}
