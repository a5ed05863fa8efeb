//! Fraud Artifact Extraction
//!
//! Extracts identifying artifacts from counterparty messages:
//! - Phone numbers (Indian mobile, `+91` prefixed, international)
//! - Bank account numbers
//! - Payment handles (`name@provider`)
//! - Links (with scheme, or bare `www.` hosts)
//! - Email addresses
//! - Case / reference, policy and order identifiers
//!
//! # Precedence
//!
//! The same substring can fit more than one category. Conflicts are resolved
//! inside a single call, with no global state:
//! - phone numbers are extracted first; a digit run that equals an accepted
//!   phone number or overlaps its span is never reported as a bank account
//! - a `name@host` whose host continues with `.tld` or `-part` is an email,
//!   never a payment handle
//!
//! # Example
//!
//! ```ignore
//! use honeypot_text_processing::entities::EntityExtractor;
//!
//! let extractor = EntityExtractor::new();
//! let evidence = extractor.extract_all("send to scammer.fraud@fakebank or call +91-9876543210");
//!
//! assert_eq!(evidence.payment_handles, vec!["scammer.fraud@fakebank"]);
//! assert_eq!(evidence.phone_numbers, vec!["+91-9876543210"]);
//! ```

mod scan;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

use honeypot_core::EvidenceRecord;
use scan::{digits_of, overlaps, BoundedPattern, Edge};

/// Phone formats, tried in order. Separator class is `[-.·\s]`.
///
/// No format may stop in the middle of a digit run.
static PHONE_PATTERNS: Lazy<Vec<BoundedPattern>> = Lazy::new(|| {
    vec![
        // +91-98765-43210, +91 98765 43210
        BoundedPattern::new(r"\+91[-.·\s]?[0-9]{5}[-.·\s]?[0-9]{5}", Edge::Any, Edge::NotDigit),
        // +91-9876543210, +919876543210
        BoundedPattern::new(r"\+91[-.·\s]?[0-9]{10}", Edge::Any, Edge::NotDigit),
        // 91-98765-43210 (no plus)
        BoundedPattern::new(r"91[-.·\s][0-9]{5}[-.·\s]?[0-9]{5}", Edge::NotDigit, Edge::NotDigit),
        BoundedPattern::new(r"91[-.·\s][0-9]{10}", Edge::NotDigit, Edge::NotDigit),
        // +1-234-567-8901, +44 (20) 7946 0958
        BoundedPattern::new(
            r"\+[0-9]{1,3}[-.·\s]?\(?[0-9]{1,5}\)?[-.·\s]?[0-9]{3,5}[-.·\s]?[0-9]{3,5}",
            Edge::Any,
            Edge::NotDigit,
        ),
        // Bare Indian mobile
        BoundedPattern::new(r"[6-9][0-9]{9}", Edge::NotDigit, Edge::NotDigit),
        // 98765-43210, 98765 43210
        BoundedPattern::new(r"[0-9]{5}[-.·\s][0-9]{5}", Edge::NotDigit, Edge::NotDigit),
    ]
});

/// "account number 1234567890", "a/c: 12345678901234"
static BANK_CONTEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:account|a/c|acct|acc)[.\s#:_-]*(?:no|number|num|#)?[.\s#:_-]*([0-9]{10,18})")
        .unwrap()
});

/// Maximal ASCII digit runs
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Vocabulary that makes a bare 10-11 digit run plausible as an account
const BANKING_VOCABULARY: &[&str] = &[
    "account",
    "a/c",
    "bank",
    "deposit",
    "transfer",
    "balance",
    "acct",
    "blocked",
    "unauthorized",
];

/// Known payment providers, then a generic short-alphabetic fallback
static PAYMENT_HANDLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let providers = [
        "upi", "ybl", "paytm", "oksbi", "okicici", "okaxis", "okhdfcbank", "okbizaxis",
        "apl", "ibl", "sbi", "icici", "hdfc", "axis", "kotak", "bob", "pnb", "canara", "union",
        "boi", "uco", "idbi", "indian", "central", "baroda", "dbs", "rbl", "indus", "yes",
        "citi", "sc", "freecharge", "mobikwik", "jio", "airtel", "phonepe", "gpay",
        "amazonpay", "axisbank", "hdfcbank", "sbibank", "icicibank", "kotakbank", "fakebank",
        "fakeupi", "testbank", "demobank", "scam", "fraud", "fake", "[a-z]{2,15}",
    ];
    Regex::new(&format!(r"(?i)[\w][\w.-]*@(?:{})\b", providers.join("|"))).unwrap()
});

static LINK_PATTERNS: Lazy<Vec<BoundedPattern>> = Lazy::new(|| {
    vec![
        BoundedPattern::plain(r#"(?i)https?://[^\s,)"'<>\]]+"#),
        BoundedPattern::new(r#"(?i)www\.[^\s,)"'<>\]]+"#, Edge::Whitespace, Edge::Any),
    ]
});

const LINK_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"', '>'];
const MIN_LINK_LEN: usize = 9;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-zA-Z0-9][a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b").unwrap()
});

static EMAIL_TLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\.(?:com|org|net|in|co|io|gov|edu|info|biz|me|xyz|online|site|tech|app|dev|cloud|mail|email|store|shop|pro|name|mobi|tel|asia|us|uk|ca|au|de|fr|jp|ru|br|za|ng|ke)$",
    )
    .unwrap()
});

/// Keyword, optional filler words ("ID", "no", "number", "is"), then a 5-20
/// character alphanumeric/dash value.
fn reference_pattern(keywords: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)\b(?:{})\b(?:[.\s#:_-]*(?:id|no|number|num|is)\b)*[.\s#:_-]*([a-z0-9][a-z0-9-]{{4,19}})\b",
        keywords
    ))
    .unwrap()
}

static CASE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| reference_pattern("case|reference|ref|ticket"));
static POLICY_PATTERN: Lazy<Regex> = Lazy::new(|| reference_pattern("policy"));
static ORDER_PATTERN: Lazy<Regex> = Lazy::new(|| reference_pattern("order"));

/// A phone number accepted in one extraction call
#[derive(Debug, Clone)]
struct PhoneHit {
    value: String,
    digits: String,
    span: Range<usize>,
}

/// Seen-set for a single category within one call
#[derive(Default)]
struct Distinct {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl Distinct {
    fn push_keyed(&mut self, key: String, value: &str) -> bool {
        if self.seen.insert(key) {
            self.values.push(value.to_string());
            true
        } else {
            false
        }
    }

    fn push(&mut self, value: &str) -> bool {
        self.push_keyed(value.to_lowercase(), value)
    }
}

/// Multi-pattern artifact extractor.
///
/// Stateless apart from its vocabulary; safe to share across tasks.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    banking_vocabulary: Vec<String>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            banking_vocabulary: BANKING_VOCABULARY.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the words that unlock 10-11 digit bank account candidates
    pub fn with_banking_vocabulary(words: Vec<String>) -> Self {
        Self {
            banking_vocabulary: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Extract every category. Empty input yields an empty record.
    pub fn extract_all(&self, text: &str) -> EvidenceRecord {
        if text.trim().is_empty() {
            return EvidenceRecord::default();
        }

        let phones = self.phone_hits(text);
        let bank_accounts = self.bank_accounts_excluding(text, &phones);

        EvidenceRecord {
            phone_numbers: phones.into_iter().map(|p| p.value).collect(),
            bank_accounts,
            payment_handles: self.extract_payment_handles(text),
            links: self.extract_links(text),
            email_addresses: self.extract_emails(text),
            case_ids: self.extract_case_ids(text),
            policy_numbers: self.extract_policy_numbers(text),
            order_numbers: self.extract_order_numbers(text),
        }
    }

    /// Phone numbers in first-match order
    pub fn extract_phone_numbers(&self, text: &str) -> Vec<String> {
        self.phone_hits(text).into_iter().map(|p| p.value).collect()
    }

    fn phone_hits(&self, text: &str) -> Vec<PhoneHit> {
        let mut hits: Vec<PhoneHit> = Vec::new();

        for pattern in PHONE_PATTERNS.iter() {
            for m in pattern.find_all(text) {
                let value = m.as_str().trim();
                let digits = digits_of(value);

                if !(10..=15).contains(&digits.len()) {
                    continue;
                }
                if hits.iter().any(|h| h.digits == digits) {
                    continue;
                }
                // A shorter format inside an accepted number is the same number
                if hits.iter().any(|h| overlaps(&h.span, &m.range())) {
                    continue;
                }

                hits.push(PhoneHit {
                    value: value.to_string(),
                    digits,
                    span: m.range(),
                });
            }
        }

        hits
    }

    /// Bank account numbers, digit-only, phone numbers excluded
    pub fn extract_bank_accounts(&self, text: &str) -> Vec<String> {
        let phones = self.phone_hits(text);
        self.bank_accounts_excluding(text, &phones)
    }

    fn bank_accounts_excluding(&self, text: &str, phones: &[PhoneHit]) -> Vec<String> {
        let mut accounts = Distinct::default();
        let claimed_by_phone = |digits: &str, span: &Range<usize>| {
            phones
                .iter()
                .any(|p| p.digits == digits || overlaps(&p.span, span))
        };

        let mut consider = |digits: &str, span: Range<usize>| {
            if !claimed_by_phone(digits, &span) {
                accounts.push_keyed(digits.to_string(), digits);
            }
        };

        // Explicit context first; a run longer than 18 digits is not an account
        for caps in BANK_CONTEXT_PATTERN.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                if text[m.end()..].starts_with(|c: char| c.is_ascii_digit()) {
                    continue;
                }
                consider(m.as_str(), m.range());
            }
        }

        let runs: Vec<_> = DIGIT_RUN.find_iter(text).collect();

        // 13-18 digits are almost always accounts, then exactly 12
        for m in runs.iter().filter(|m| (13..=18).contains(&m.len())) {
            consider(m.as_str(), m.range());
        }
        for m in runs.iter().filter(|m| m.len() == 12) {
            consider(m.as_str(), m.range());
        }

        // 10-11 digits only with banking vocabulary around
        if self.has_banking_context(text) {
            for m in runs.iter().filter(|m| (10..=11).contains(&m.len())) {
                consider(m.as_str(), m.range());
            }
        }

        accounts.values
    }

    fn has_banking_context(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.banking_vocabulary.iter().any(|w| lower.contains(w.as_str()))
    }

    /// Payment handles such as `name@ybl`
    pub fn extract_payment_handles(&self, text: &str) -> Vec<String> {
        let mut handles = Distinct::default();

        for m in PAYMENT_HANDLE_PATTERN.find_iter(text) {
            let value = m.as_str().trim();

            let host = value.split_once('@').map_or("", |(_, h)| h);
            if host.contains('.') {
                continue;
            }
            // fraud@fake-bank.com: the host keeps going, so this is an email
            if host_continues(&text[m.end()..]) {
                continue;
            }

            handles.push(value);
        }

        handles.values
    }

    /// URLs with a scheme and bare `www.` hosts
    pub fn extract_links(&self, text: &str) -> Vec<String> {
        let mut links = Distinct::default();

        for pattern in LINK_PATTERNS.iter() {
            for m in pattern.find_all(text) {
                let cleaned = m.as_str().trim_end_matches(LINK_TRAILING);
                if cleaned.chars().count() >= MIN_LINK_LEN {
                    links.push(cleaned);
                }
            }
        }

        links.values
    }

    /// Email addresses with a recognised top-level domain
    pub fn extract_emails(&self, text: &str) -> Vec<String> {
        let mut emails = Distinct::default();

        for m in EMAIL_PATTERN.find_iter(text) {
            let cleaned = m.as_str().trim().trim_end_matches('.');
            if EMAIL_TLD.is_match(cleaned) {
                emails.push(cleaned);
            }
        }

        emails.values
    }

    /// Case / reference / ticket identifiers
    pub fn extract_case_ids(&self, text: &str) -> Vec<String> {
        extract_references(&CASE_ID_PATTERN, text)
    }

    pub fn extract_policy_numbers(&self, text: &str) -> Vec<String> {
        extract_references(&POLICY_PATTERN, text)
    }

    pub fn extract_order_numbers(&self, text: &str) -> Vec<String> {
        extract_references(&ORDER_PATTERN, text)
    }
}

/// True when `rest` starts with `.` or `-` followed by an alphanumeric
fn host_continues(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('.' | '-'), Some(c)) if c.is_alphanumeric()
    )
}

/// Keyword-prefixed identifiers. A value without any digit (an ordinary word
/// such as "reference") is skipped and the search resumes just after the
/// keyword's first character, so a later keyword can still match.
fn extract_references(pattern: &Regex, text: &str) -> Vec<String> {
    let mut refs = Distinct::default();
    let mut start = 0;

    while start < text.len() {
        let Some(caps) = pattern.captures_at(text, start) else {
            break;
        };
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            break;
        };

        if value.as_str().chars().any(|c| c.is_ascii_digit()) {
            refs.push(value.as_str());
            start = whole.end();
        } else {
            start = whole.start()
                + text[whole.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
    }

    refs.values
}
