//! Fraud Classification
//!
//! Weighted keyword scoring over an analysis window made of the current
//! message plus every counterparty-authored history turn.
//!
//! Each category owns a keyword set and a weight. Every keyword that matches
//! (case-insensitive, word-bounded) adds the weight to that category and
//! records an indicator. Urgency phrases are scored separately.
//!
//! ```text
//! confidence = min(0.99, 0.6 + 0.05 * (best_score + urgency_count))
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use honeypot_core::classification::{MAX_CONFIDENCE, MAX_URGENCY, MIN_CONFIDENCE};
use honeypot_core::{ClassificationResult, FraudCategory};

/// Indicators kept per classification
pub const MAX_INDICATORS: usize = 10;

/// Confidence added per matched keyword weight or urgency phrase
const CONFIDENCE_STEP: f64 = 0.05;

/// A compiled keyword with the label used in indicators
#[derive(Debug)]
struct Keyword {
    label: String,
    pattern: Regex,
}

impl Keyword {
    /// Whole-word, case-insensitive match of a literal phrase
    fn word(phrase: &str) -> Self {
        Self {
            label: phrase.to_lowercase(),
            pattern: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase))).unwrap(),
        }
    }

    /// Raw pattern (no implicit word boundaries)
    fn raw(label: &str, pattern: &str) -> Self {
        Self {
            label: label.to_string(),
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    fn words(phrases: &[&str]) -> Vec<Self> {
        phrases.iter().map(|p| Self::word(p)).collect()
    }
}

#[derive(Debug)]
struct CategoryRule {
    category: FraudCategory,
    weight: f64,
    keywords: Vec<Keyword>,
}

/// Category rules in declaration order (ties resolve to the earlier entry)
static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    vec![
        CategoryRule {
            category: FraudCategory::BankFraud,
            weight: 1.0,
            keywords: Keyword::words(&[
                "account", "bank", "blocked", "compromised", "otp", "debit", "credit",
                "transaction", "unauthorized", "suspend", "freeze", "kyc", "verify", "sbi",
                "hdfc", "icici", "axis", "pnb", "rbi", "reserve bank", "atm", "pin", "cvv",
                "card number", "netbanking", "password", "deactivat", "closed", "locked",
                "security alert", "fraud department",
            ]),
        },
        CategoryRule {
            category: FraudCategory::UpiFraud,
            weight: 1.0,
            keywords: Keyword::words(&[
                "upi", "gpay", "phonepe", "paytm", "google pay", "bhim", "cashback", "refund",
                "payment", "transfer", "collect request", "upi id", "upi pin", "send money",
                "receive money", "qr code", "vpa", "wallet", "recharge",
            ]),
        },
        CategoryRule {
            category: FraudCategory::Phishing,
            weight: 1.0,
            keywords: {
                let mut keywords = Keyword::words(&[
                    "click", "link", "url", "offer", "deal", "discount", "coupon", "amazon",
                    "flipkart", "prize", "claim", "congratulations", "selected", "gift",
                    "voucher", "free", "limited time", "expire", "act now", "login",
                    "update your", "verify your", "confirm your", "subscribe",
                ]);
                keywords.push(Keyword::raw("https?://", r"(?i)https?://"));
                keywords.push(Keyword::raw(".com", r"(?i)\.com\b"));
                keywords
            },
        },
        CategoryRule {
            category: FraudCategory::InvestmentScam,
            weight: 0.9,
            keywords: Keyword::words(&[
                "invest", "return", "profit", "guaranteed", "double", "triple", "stock",
                "trading", "crypto", "bitcoin", "mutual fund", "scheme", "high return",
                "risk free", "monthly income", "passive income", "forex", "binary option",
            ]),
        },
        CategoryRule {
            category: FraudCategory::LotteryScam,
            weight: 0.9,
            keywords: Keyword::words(&[
                "lottery", "won", "winner", "prize", "lucky", "draw", "jackpot", "million",
                "crore", "lakh", "claim your", "winner notification", "sweepstakes", "raffle",
            ]),
        },
        CategoryRule {
            category: FraudCategory::GenericScam,
            weight: 0.5,
            keywords: Keyword::words(&[
                "police", "customs", "delivery", "fbi", "interpol", "arrest", "warrant", "fine",
                "penalty", "package", "parcel", "held", "tax", "irs", "revenue", "department",
                "social security",
            ]),
        },
    ]
});

/// Pressure and threat phrases, scored independently of category
static URGENCY_KEYWORDS: Lazy<Vec<Keyword>> = Lazy::new(|| {
    Keyword::words(&[
        "urgent", "immediately", "right now", "asap", "hurry", "quickly", "within hours",
        "last chance", "don't delay", "act fast", "time sensitive", "expiring", "deadline",
        "final warning", "last warning",
    ])
});

/// Heuristic fraud classifier. Stateless and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FraudClassifier;

impl FraudClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `text` widened with counterparty history texts
    pub fn classify<'a, I>(&self, text: &str, counterparty_history: I) -> ClassificationResult
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut window = String::from(text);
        for turn in counterparty_history {
            window.push(' ');
            window.push_str(turn);
        }
        self.classify_window(&window)
    }

    /// Classify a prepared analysis window
    pub fn classify_window(&self, window: &str) -> ClassificationResult {
        let mut indicators = Vec::new();
        let mut best: Option<(FraudCategory, f64)> = None;

        for rule in CATEGORY_RULES.iter() {
            let mut score = 0.0;
            for keyword in &rule.keywords {
                if keyword.pattern.is_match(window) {
                    score += rule.weight;
                    indicators.push(format!("{}: '{}'", rule.category, keyword.label));
                }
            }

            // Strictly greater, so earlier categories win ties
            if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((rule.category, score));
            }
        }

        let mut urgency = 0u32;
        for keyword in URGENCY_KEYWORDS.iter() {
            if keyword.pattern.is_match(window) {
                urgency += 1;
                indicators.push(format!("urgency: '{}'", keyword.label));
            }
        }

        let (category, best_score) = best.unwrap_or((FraudCategory::GenericScam, 0.0));
        let raw = MIN_CONFIDENCE + CONFIDENCE_STEP * (best_score + f64::from(urgency));
        let confidence = (raw.min(MAX_CONFIDENCE) * 100.0).round() / 100.0;

        indicators.truncate(MAX_INDICATORS);

        tracing::trace!(
            category = %category,
            score = best_score,
            urgency,
            "Classified analysis window"
        );

        ClassificationResult {
            category,
            confidence,
            indicators,
            urgency_signal: urgency.min(u32::from(MAX_URGENCY)) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ClassificationResult {
        FraudClassifier::new().classify(text, std::iter::empty())
    }

    #[test]
    fn test_bank_fraud_with_urgency() {
        let result = classify(
            "URGENT: your account will be blocked, share your account number 1234567890123456 now",
        );
        assert_eq!(result.category, FraudCategory::BankFraud);
        assert!(result.confidence >= 0.6);
        assert!(result.urgency_signal >= 1);
        assert!(result.indicators.contains(&"bank_fraud: 'account'".to_string()));
        assert!(result.indicators.contains(&"urgency: 'urgent'".to_string()));
        // account + blocked, one urgency phrase
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn test_no_signal_defaults_to_generic() {
        let result = classify("hello, how are you today?");
        assert_eq!(result.category, FraudCategory::GenericScam);
        assert_eq!(result.confidence, 0.6);
        assert!(result.indicators.is_empty());
        assert_eq!(result.urgency_signal, 0);
    }

    #[test]
    fn test_empty_text() {
        let result = classify("");
        assert_eq!(result.category, FraudCategory::GenericScam);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_word_boundaries() {
        // "pin" must not fire inside "spinning", "won" not inside "wonder"
        let result = classify("I wonder about spinning wheels");
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        // one bank keyword vs one upi keyword
        let result = classify("bank upi");
        assert_eq!(result.category, FraudCategory::BankFraud);

        let result = classify("wallet");
        assert_eq!(result.category, FraudCategory::UpiFraud);
    }

    #[test]
    fn test_phishing_raw_patterns() {
        let result = classify("visit https://fake.example.com for details");
        assert_eq!(result.category, FraudCategory::Phishing);
        assert!(result.indicators.contains(&"phishing: 'https?://'".to_string()));
        assert!(result.indicators.contains(&"phishing: '.com'".to_string()));
    }

    #[test]
    fn test_history_widens_window() {
        let classifier = FraudClassifier::new();
        let history = ["You have won the lottery jackpot", "Claim your prize now"];
        let result = classifier.classify("Send the fee", history.iter().copied());
        assert_eq!(result.category, FraudCategory::LotteryScam);
    }

    #[test]
    fn test_confidence_monotonic_and_capped() {
        let phrases = [
            "account", "blocked", "otp", "kyc", "verify", "urgent", "immediately", "asap",
            "hurry", "deadline", "final warning", "cvv", "atm", "pin", "password",
        ];
        let mut text = String::new();
        let mut last = 0.0;
        for phrase in phrases {
            text.push_str(phrase);
            text.push(' ');
            let result = classify(&text);
            assert!(result.confidence >= last, "confidence dropped at {}", phrase);
            assert!((0.6..=0.99).contains(&result.confidence));
            last = result.confidence;
        }
        assert_eq!(last, 0.99);
    }

    #[test]
    fn test_indicator_and_urgency_caps() {
        let text = "account bank blocked otp debit credit kyc verify sbi hdfc icici \
                    urgent immediately asap hurry quickly deadline final warning";
        let result = classify(text);
        assert_eq!(result.indicators.len(), MAX_INDICATORS);
        assert_eq!(result.urgency_signal, MAX_URGENCY);
        // Evaluation order: category indicators first
        assert_eq!(result.indicators[0], "bank_fraud: 'account'");
    }

    #[test]
    fn test_weighted_categories() {
        // Two investment keywords (1.8) beat one bank keyword (1.0)
        let result = classify("guaranteed profit on your bank deposit");
        assert_eq!(result.category, FraudCategory::InvestmentScam);
        assert_eq!(result.confidence, 0.69);
    }
}
