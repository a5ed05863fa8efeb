//! Multi-turn pipeline tests with scripted oracles

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use honeypot_agent::{AgentConfig, ConversationState, HoneypotAgent, TemplateReplyGenerator};
use honeypot_core::{EnrichmentOracle, Error, EvidenceRecord, FraudCategory, Sender, Turn};

/// Oracle that returns fixed evidence after a delay
struct ScriptedOracle {
    evidence: EvidenceRecord,
    delay: Duration,
}

#[async_trait]
impl EnrichmentOracle for ScriptedOracle {
    async fn enrich(&self, _text: &str) -> honeypot_core::Result<EvidenceRecord> {
        tokio::time::sleep(self.delay).await;
        Ok(self.evidence.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Oracle that always fails
struct BrokenOracle;

#[async_trait]
impl EnrichmentOracle for BrokenOracle {
    async fn enrich(&self, _text: &str) -> honeypot_core::Result<EvidenceRecord> {
        Err(Error::Enrichment("HTTP 503: upstream unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn agent(config: AgentConfig) -> HoneypotAgent {
    HoneypotAgent::new(config, Arc::new(TemplateReplyGenerator::default()))
}

const TURN_ONE: &str =
    "URGENT: your account will be blocked, share your account number 1234567890123456 now";

#[tokio::test]
async fn test_evidence_persists_across_turns() {
    let agent = agent(AgentConfig::default());
    let state = Mutex::new(ConversationState::new());
    let mut history = Vec::new();

    let messages = [
        TURN_ONE,
        "This is from the SBI fraud department, do not delay",
        "send to scammer.fraud@fakebank or call +91-9876543210",
        "Open http://sbi-kyc-verify.com/update now",
        "Sir just do it fast, time is running out",
    ];

    let mut last = None;
    for message in messages {
        let outcome = agent.process_turn(&state, message, &history).await.unwrap();
        history.push(Turn::scammer(message));
        history.push(Turn::new(Sender::User, outcome.reply.clone()));
        last = Some(outcome);
    }

    let outcome = last.unwrap();
    assert_eq!(outcome.turn, 5);
    assert_eq!(outcome.metrics.total_messages_exchanged, 10);
    assert!(outcome.metrics.engagement_duration_seconds >= 60.0);
    assert_eq!(outcome.evidence.bank_accounts, vec!["1234567890123456"]);
    assert_eq!(outcome.evidence.payment_handles, vec!["scammer.fraud@fakebank"]);
    assert_eq!(outcome.evidence.phone_numbers, vec!["+91-9876543210"]);
    assert_eq!(outcome.evidence.links, vec!["http://sbi-kyc-verify.com/update"]);
    // History keeps the bank vocabulary in the window
    assert_eq!(outcome.classification.category, FraudCategory::BankFraud);
    assert!(outcome.agent_notes.contains("Bank accounts: 1234567890123456"));
}

#[tokio::test]
async fn test_history_replay_is_idempotent() {
    let agent = agent(AgentConfig::default());
    let state = Mutex::new(ConversationState::new());
    let history = vec![Turn::scammer(TURN_ONE), Turn::scammer(TURN_ONE)];

    let first = agent.process_turn(&state, TURN_ONE, &history).await.unwrap();
    let second = agent.process_turn(&state, TURN_ONE, &history).await.unwrap();
    assert_eq!(first.evidence, second.evidence);
    assert_eq!(second.evidence.total(), 1);
}

#[tokio::test]
async fn test_enrichment_evidence_is_merged() {
    let mut extra = EvidenceRecord::new();
    extra.phone_numbers.push("nine eight seven six five".to_string());
    extra.bank_accounts.push("1234567890123456".to_string());

    let agent = agent(AgentConfig::default()).with_oracle(Arc::new(ScriptedOracle {
        evidence: extra,
        delay: Duration::ZERO,
    }));
    let state = Mutex::new(ConversationState::new());

    let outcome = agent.process_turn(&state, TURN_ONE, &[]).await.unwrap();
    assert_eq!(outcome.evidence.bank_accounts, vec!["1234567890123456"]);
    assert_eq!(outcome.evidence.phone_numbers, vec!["nine eight seven six five"]);
}

#[tokio::test]
async fn test_failed_enrichment_keeps_regex_evidence() {
    let agent = agent(AgentConfig::default()).with_oracle(Arc::new(BrokenOracle));
    let state = Mutex::new(ConversationState::new());

    let outcome = agent.process_turn(&state, TURN_ONE, &[]).await.unwrap();
    assert_eq!(outcome.evidence.bank_accounts, vec!["1234567890123456"]);
    assert_eq!(outcome.evidence.total(), 1);
}

#[tokio::test]
async fn test_slow_enrichment_times_out() {
    let config = AgentConfig {
        enrichment_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let mut extra = EvidenceRecord::new();
    extra.links.push("http://never-arrives.example".to_string());

    let agent = agent(config).with_oracle(Arc::new(ScriptedOracle {
        evidence: extra,
        delay: Duration::from_secs(5),
    }));
    let state = Mutex::new(ConversationState::new());

    let start = Instant::now();
    let outcome = agent.process_turn(&state, TURN_ONE, &[]).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(outcome.evidence.links.is_empty());
    assert_eq!(outcome.evidence.bank_accounts, vec!["1234567890123456"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_on_one_session() {
    let agent = Arc::new(agent(AgentConfig::default()));
    let state = Arc::new(Mutex::new(ConversationState::new()));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let agent = agent.clone();
            let state = state.clone();
            tokio::spawn(async move {
                let message = format!("pay the fine to handle{}@ybl immediately", i);
                agent.process_turn(&state, &message, &[]).await.unwrap().turn
            })
        })
        .collect();

    let mut turns: Vec<u32> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    turns.sort_unstable();

    assert_eq!(turns, (1..=20).collect::<Vec<u32>>());
    let state = state.lock();
    assert_eq!(state.turn_count(), 20);
    assert_eq!(state.evidence().payment_handles.len(), 20);
}
