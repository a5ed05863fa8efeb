//! Evidence records
//!
//! An [`EvidenceRecord`] holds every artifact extracted from a conversation,
//! grouped by category. Within a category no two entries normalize (trim +
//! lowercase) to the same value and entries keep first-seen order.
//!
//! The same shape doubles as the candidate set of a single extraction pass.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Evidence categories, in canonical output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvidenceCategory {
    PhoneNumbers,
    BankAccounts,
    PaymentHandles,
    Links,
    EmailAddresses,
    CaseIds,
    PolicyNumbers,
    OrderNumbers,
}

impl EvidenceCategory {
    /// All categories in canonical order
    pub const ALL: [EvidenceCategory; 8] = [
        EvidenceCategory::PhoneNumbers,
        EvidenceCategory::BankAccounts,
        EvidenceCategory::PaymentHandles,
        EvidenceCategory::Links,
        EvidenceCategory::EmailAddresses,
        EvidenceCategory::CaseIds,
        EvidenceCategory::PolicyNumbers,
        EvidenceCategory::OrderNumbers,
    ];

    /// JSON field name
    pub fn key(&self) -> &'static str {
        match self {
            Self::PhoneNumbers => "phoneNumbers",
            Self::BankAccounts => "bankAccounts",
            Self::PaymentHandles => "paymentHandles",
            Self::Links => "links",
            Self::EmailAddresses => "emailAddresses",
            Self::CaseIds => "caseIds",
            Self::PolicyNumbers => "policyNumbers",
            Self::OrderNumbers => "orderNumbers",
        }
    }

    /// Older field names still accepted on input
    pub fn legacy_key(&self) -> Option<&'static str> {
        match self {
            Self::PaymentHandles => Some("upiIds"),
            Self::Links => Some("phishingLinks"),
            _ => None,
        }
    }

    /// Human-readable label used in agent notes
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhoneNumbers => "Phone numbers",
            Self::BankAccounts => "Bank accounts",
            Self::PaymentHandles => "Payment handles",
            Self::Links => "Links",
            Self::EmailAddresses => "Email addresses",
            Self::CaseIds => "Case IDs",
            Self::PolicyNumbers => "Policy numbers",
            Self::OrderNumbers => "Order numbers",
        }
    }
}

impl fmt::Display for EvidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Cumulative evidence for a conversation (or one extraction pass)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvidenceRecord {
    pub phone_numbers: Vec<String>,
    pub bank_accounts: Vec<String>,
    #[serde(alias = "upiIds")]
    pub payment_handles: Vec<String>,
    #[serde(alias = "phishingLinks")]
    pub links: Vec<String>,
    pub email_addresses: Vec<String>,
    pub case_ids: Vec<String>,
    pub policy_numbers: Vec<String>,
    pub order_numbers: Vec<String>,
}

impl EvidenceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for one category
    pub fn get(&self, category: EvidenceCategory) -> &[String] {
        match category {
            EvidenceCategory::PhoneNumbers => &self.phone_numbers,
            EvidenceCategory::BankAccounts => &self.bank_accounts,
            EvidenceCategory::PaymentHandles => &self.payment_handles,
            EvidenceCategory::Links => &self.links,
            EvidenceCategory::EmailAddresses => &self.email_addresses,
            EvidenceCategory::CaseIds => &self.case_ids,
            EvidenceCategory::PolicyNumbers => &self.policy_numbers,
            EvidenceCategory::OrderNumbers => &self.order_numbers,
        }
    }

    pub fn get_mut(&mut self, category: EvidenceCategory) -> &mut Vec<String> {
        match category {
            EvidenceCategory::PhoneNumbers => &mut self.phone_numbers,
            EvidenceCategory::BankAccounts => &mut self.bank_accounts,
            EvidenceCategory::PaymentHandles => &mut self.payment_handles,
            EvidenceCategory::Links => &mut self.links,
            EvidenceCategory::EmailAddresses => &mut self.email_addresses,
            EvidenceCategory::CaseIds => &mut self.case_ids,
            EvidenceCategory::PolicyNumbers => &mut self.policy_numbers,
            EvidenceCategory::OrderNumbers => &mut self.order_numbers,
        }
    }

    /// Check if no category holds anything
    pub fn is_empty(&self) -> bool {
        EvidenceCategory::ALL.iter().all(|c| self.get(*c).is_empty())
    }

    /// Total number of entries across categories
    pub fn total(&self) -> usize {
        EvidenceCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    /// Categories that hold at least one entry, with their entries
    pub fn non_empty(&self) -> impl Iterator<Item = (EvidenceCategory, &[String])> + '_ {
        EvidenceCategory::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, values)| !values.is_empty())
    }

    /// Merge `incoming` after `self`, producing a new record
    pub fn merged(&self, incoming: &EvidenceRecord) -> EvidenceRecord {
        merge(self, incoming)
    }

    /// Merge `incoming` into this record in place
    pub fn absorb(&mut self, incoming: &EvidenceRecord) {
        for category in EvidenceCategory::ALL {
            let existing = std::mem::take(self.get_mut(category));
            *self.get_mut(category) = merge_values(&existing, incoming.get(category));
        }
    }
}

/// Combine two evidence records.
///
/// Per category: existing entries first, then incoming ones. Entries are
/// compared by their trimmed, lowercased form; the first occurrence is kept
/// (trimmed, original casing) and later duplicates are dropped. Blank entries
/// are discarded.
pub fn merge(existing: &EvidenceRecord, incoming: &EvidenceRecord) -> EvidenceRecord {
    let mut out = EvidenceRecord::default();
    for category in EvidenceCategory::ALL {
        *out.get_mut(category) = merge_values(existing.get(category), incoming.get(category));
    }
    out
}

fn merge_values(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(existing.len() + incoming.len());
    let mut combined = Vec::with_capacity(existing.len() + incoming.len());

    for item in existing.iter().chain(incoming.iter()) {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(normalize(trimmed)) {
            combined.push(trimmed.to_string());
        }
    }

    combined
}

/// Normalized comparison key for an evidence entry
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
