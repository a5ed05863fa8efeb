//! Turn processing
//!
//! One inbound message flows through:
//! 1. regex extraction over the message and every counterparty history turn
//! 2. optional enrichment of the message, bounded by a timeout
//! 3. classification of the message widened with counterparty history
//! 4. a short critical section applying the results to the session state
//! 5. reply generation from the updated snapshot
//!
//! Only step 4 holds the session lock, and it never spans an await.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use honeypot_config::Settings;
use honeypot_core::{
    counterparty_texts, ClassificationResult, EngagementMetrics, EngagementPolicy,
    EnrichmentOracle, EvidenceRecord, ReplyContext, ReplyGenerator, Turn,
};
use honeypot_text_processing::{EntityExtractor, FraudClassifier};

use crate::state::ConversationState;
use crate::AgentError;

/// Pipeline tuning
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound for one enrichment call
    pub enrichment_timeout: Duration,
    /// Messages of this many characters or fewer skip enrichment
    pub enrichment_min_len: usize,
    pub engagement: EngagementPolicy,
    /// Report every conversation as fraudulent
    pub assume_fraud: bool,
    /// Overrides the extractor's banking words when non-empty
    pub banking_vocabulary: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enrichment_timeout: Duration::from_millis(8000),
            enrichment_min_len: 20,
            engagement: EngagementPolicy::default(),
            assume_fraud: true,
            banking_vocabulary: Vec::new(),
        }
    }
}

impl AgentConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enrichment_timeout: Duration::from_millis(settings.enrichment.timeout_ms),
            enrichment_min_len: settings.enrichment.min_text_len,
            engagement: settings.engagement,
            assume_fraud: settings.agent.assume_fraud,
            banking_vocabulary: settings.agent.banking_vocabulary.clone(),
        }
    }
}

/// Result of one enrichment attempt
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// No oracle configured, or the text was too short
    Skipped,
    Applied(EvidenceRecord),
    Failed(String),
    TimedOut,
}

impl EnrichmentOutcome {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Applied(_) => "applied",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    /// Evidence contributed to the turn, if any
    pub fn into_evidence(self) -> Option<EvidenceRecord> {
        match self {
            Self::Applied(evidence) => Some(evidence),
            _ => None,
        }
    }
}

/// Everything the caller needs to answer a turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    /// 1-based turn number within the session
    pub turn: u32,
    pub scam_detected: bool,
    pub classification: ClassificationResult,
    /// Cumulative evidence after this turn
    pub evidence: EvidenceRecord,
    pub metrics: EngagementMetrics,
    pub agent_notes: String,
}

/// The honeypot turn pipeline
pub struct HoneypotAgent {
    extractor: EntityExtractor,
    classifier: FraudClassifier,
    oracle: Option<Arc<dyn EnrichmentOracle>>,
    replies: Arc<dyn ReplyGenerator>,
    config: AgentConfig,
}

impl HoneypotAgent {
    pub fn new(config: AgentConfig, replies: Arc<dyn ReplyGenerator>) -> Self {
        let extractor = if config.banking_vocabulary.is_empty() {
            EntityExtractor::new()
        } else {
            EntityExtractor::with_banking_vocabulary(config.banking_vocabulary.clone())
        };
        Self {
            extractor,
            classifier: FraudClassifier::new(),
            oracle: None,
            replies,
            config,
        }
    }

    /// Attach an enrichment oracle
    pub fn with_oracle(mut self, oracle: Arc<dyn EnrichmentOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Regex evidence from the message and every counterparty history turn
    pub fn extract_evidence(&self, message: &str, history: &[Turn]) -> EvidenceRecord {
        let mut evidence = self.extractor.extract_all(message);
        for text in counterparty_texts(history) {
            evidence.absorb(&self.extractor.extract_all(text));
        }
        evidence
    }

    /// Ask the oracle about the current message
    pub async fn enrich(&self, message: &str) -> EnrichmentOutcome {
        let Some(oracle) = &self.oracle else {
            return EnrichmentOutcome::Skipped;
        };
        if message.chars().count() <= self.config.enrichment_min_len {
            return EnrichmentOutcome::Skipped;
        }

        match tokio::time::timeout(self.config.enrichment_timeout, oracle.enrich(message)).await {
            Ok(Ok(evidence)) => EnrichmentOutcome::Applied(evidence),
            Ok(Err(e)) => {
                tracing::warn!(oracle = oracle.name(), error = %e, "Enrichment failed");
                EnrichmentOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    oracle = oracle.name(),
                    timeout_ms = self.config.enrichment_timeout.as_millis() as u64,
                    "Enrichment timed out"
                );
                EnrichmentOutcome::TimedOut
            }
        }
    }

    pub fn classify(&self, message: &str, history: &[Turn]) -> ClassificationResult {
        self.classifier.classify(message, counterparty_texts(history))
    }

    /// Process one inbound message against a session's state
    pub async fn process_turn(
        &self,
        state: &Mutex<ConversationState>,
        message: &str,
        history: &[Turn],
    ) -> Result<TurnOutcome, AgentError> {
        let start = Instant::now();

        let mut evidence = self.extract_evidence(message, history);
        let outcome = self.enrich(message).await;
        metrics::counter!("honeypot_enrichment_total", "outcome" => outcome.as_str()).increment(1);
        if let Some(extra) = outcome.into_evidence() {
            evidence.absorb(&extra);
        }

        let classification = self.classify(message, history);
        let scam_detected = self.config.assume_fraud || classification.has_signal();

        let (turn, cumulative, metrics, agent_notes) = {
            let mut state = state.lock();
            let turn = state.record_turn(&evidence, classification.clone());
            (
                turn,
                state.evidence().clone(),
                state.metrics(&self.config.engagement),
                state.agent_notes(&self.config.engagement),
            )
        };

        let reply = self
            .replies
            .generate(ReplyContext {
                turn,
                category: classification.category,
                message,
                evidence: &cumulative,
            })
            .await?;

        let elapsed = start.elapsed();
        metrics::counter!("honeypot_turns_total", "category" => classification.category.as_str())
            .increment(1);
        metrics::histogram!("honeypot_turn_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            turn,
            category = %classification.category,
            confidence = classification.confidence,
            evidence_items = cumulative.total(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Processed turn"
        );

        Ok(TurnOutcome {
            reply,
            turn,
            scam_detected,
            classification,
            evidence: cumulative,
            metrics,
            agent_notes,
        })
    }
}
