//! Per-session conversation state
//!
//! One [`ConversationState`] exists per session id. It is mutated exactly once
//! per inbound message through [`ConversationState::record_turn`]; readers get
//! owned snapshots.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use honeypot_core::{
    ClassificationResult, EngagementMetrics, EngagementPolicy, EvidenceRecord, FraudCategory,
};

/// Indicators quoted in agent notes
const NOTE_INDICATORS: usize = 5;

/// Cumulative state of one conversation
#[derive(Debug, Clone)]
pub struct ConversationState {
    created_at: Instant,
    created_at_utc: DateTime<Utc>,
    last_activity: Instant,
    turn_count: u32,
    evidence: EvidenceRecord,
    classification: ClassificationResult,
    notes: Vec<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            created_at: now,
            created_at_utc: Utc::now(),
            last_activity: now,
            turn_count: 0,
            evidence: EvidenceRecord::new(),
            classification: ClassificationResult::default(),
            notes: Vec::new(),
        }
    }

    /// Apply one turn's results. Returns the new turn number.
    pub fn record_turn(
        &mut self,
        evidence: &EvidenceRecord,
        classification: ClassificationResult,
    ) -> u32 {
        self.turn_count += 1;
        self.last_activity = Instant::now();
        self.evidence.absorb(evidence);

        let previous = self.classification.category;
        if self.turn_count > 1 && previous != classification.category {
            self.notes.push(format!(
                "Category changed from {} to {} at turn {}",
                previous, classification.category, self.turn_count
            ));
        }
        self.classification = classification;

        self.turn_count
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn evidence(&self) -> &EvidenceRecord {
        &self.evidence
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.classification
    }

    pub fn category(&self) -> FraudCategory {
        self.classification.category
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn created_at_utc(&self) -> DateTime<Utc> {
        self.created_at_utc
    }

    /// Wall-clock time between creation and the latest turn
    pub fn elapsed(&self) -> Duration {
        self.last_activity.duration_since(self.created_at)
    }

    pub fn metrics(&self, policy: &EngagementPolicy) -> EngagementMetrics {
        policy.metrics(self.turn_count, self.elapsed())
    }

    /// Human-readable summary of the conversation so far
    pub fn agent_notes(&self, policy: &EngagementPolicy) -> String {
        let mut parts = vec![
            format!(
                "Fraud category: {} (confidence: {})",
                self.classification.category, self.classification.confidence
            ),
            format!("Turns: {}", self.turn_count),
            format!(
                "Duration: {:.0}s",
                policy.duration_secs(self.turn_count, self.elapsed())
            ),
        ];

        for (category, values) in self.evidence.non_empty() {
            parts.push(format!("{}: {}", category.label(), values.join(", ")));
        }

        if !self.classification.indicators.is_empty() {
            let shown: Vec<&str> = self
                .classification
                .indicators
                .iter()
                .take(NOTE_INDICATORS)
                .map(String::as_str)
                .collect();
            parts.push(format!("Indicators: {}", shown.join(", ")));
        }

        parts.extend(self.notes.iter().cloned());
        parts.join(". ")
    }

    pub fn snapshot(&self, session_id: &str, policy: &EngagementPolicy) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.to_string(),
            created_at: self.created_at_utc,
            turn_count: self.turn_count,
            scam_type: self.classification.category,
            confidence: self.classification.confidence,
            indicators: self.classification.indicators.clone(),
            urgency_signal: self.classification.urgency_signal,
            extracted_intelligence: self.evidence.clone(),
            engagement_metrics: self.metrics(policy),
            agent_notes: self.agent_notes(policy),
        }
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub turn_count: u32,
    pub scam_type: FraudCategory,
    pub confidence: f64,
    pub indicators: Vec<String>,
    pub urgency_signal: u8,
    pub extracted_intelligence: EvidenceRecord,
    pub engagement_metrics: EngagementMetrics,
    pub agent_notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence_with_phone(phone: &str) -> EvidenceRecord {
        let mut evidence = EvidenceRecord::new();
        evidence.phone_numbers.push(phone.to_string());
        evidence
    }

    fn bank_classification() -> ClassificationResult {
        ClassificationResult {
            category: FraudCategory::BankFraud,
            confidence: 0.75,
            indicators: vec![
                "bank_fraud: 'account'".to_string(),
                "bank_fraud: 'blocked'".to_string(),
                "urgency: 'urgent'".to_string(),
            ],
            urgency_signal: 1,
        }
    }

    #[test]
    fn test_new_state() {
        let state = ConversationState::new();
        assert_eq!(state.turn_count(), 0);
        assert!(state.evidence().is_empty());
        assert_eq!(state.category(), FraudCategory::GenericScam);
    }

    #[test]
    fn test_record_turn_accumulates() {
        let mut state = ConversationState::new();
        assert_eq!(state.record_turn(&evidence_with_phone("9876543210"), bank_classification()), 1);
        assert_eq!(
            state.record_turn(&evidence_with_phone("+91 9123456789"), ClassificationResult::default()),
            2
        );
        assert_eq!(state.record_turn(&evidence_with_phone("9876543210"), bank_classification()), 3);

        assert_eq!(
            state.evidence().phone_numbers,
            vec!["9876543210", "+91 9123456789"]
        );
        // Last classification wins
        assert_eq!(state.category(), FraudCategory::BankFraud);
        assert_eq!(state.notes().len(), 2);
        assert!(state.notes()[0].contains("from bank_fraud to generic_scam at turn 2"));
    }

    #[test]
    fn test_metrics_follow_policy() {
        let mut state = ConversationState::new();
        let policy = EngagementPolicy::default();
        assert_eq!(state.metrics(&policy).total_messages_exchanged, 0);
        assert_eq!(state.metrics(&policy).engagement_duration_seconds, 1.0);

        state.record_turn(&EvidenceRecord::new(), bank_classification());
        state.record_turn(&EvidenceRecord::new(), bank_classification());
        let metrics = state.metrics(&policy);
        assert_eq!(metrics.total_messages_exchanged, 4);
        assert_eq!(metrics.engagement_duration_seconds, 24.0);
    }

    #[test]
    fn test_agent_notes_format() {
        let mut state = ConversationState::new();
        let mut evidence = evidence_with_phone("+91-9876543210");
        evidence.payment_handles.push("scammer.fraud@fakebank".to_string());
        state.record_turn(&evidence, bank_classification());
        state.record_turn(&EvidenceRecord::new(), ClassificationResult::default());

        let notes = state.agent_notes(&EngagementPolicy::default());
        assert_eq!(
            notes,
            "Fraud category: generic_scam (confidence: 0.6). Turns: 2. Duration: 24s. \
             Phone numbers: +91-9876543210. Payment handles: scammer.fraud@fakebank. \
             Category changed from bank_fraud to generic_scam at turn 2"
        );
    }

    #[test]
    fn test_agent_notes_omit_empty_sections() {
        let state = ConversationState::new();
        let notes = state.agent_notes(&EngagementPolicy::default());
        assert_eq!(
            notes,
            "Fraud category: generic_scam (confidence: 0.6). Turns: 0. Duration: 1s"
        );
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut state = ConversationState::new();
        state.record_turn(&evidence_with_phone("9876543210"), bank_classification());

        let snapshot = state.snapshot("sess-1", &EngagementPolicy::default());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["sessionId"], "sess-1");
        assert_eq!(json["turnCount"], 1);
        assert_eq!(json["scamType"], "bank_fraud");
        assert_eq!(json["extractedIntelligence"]["phoneNumbers"][0], "9876543210");
        assert_eq!(json["engagementMetrics"]["totalMessagesExchanged"], 2);
    }
}
