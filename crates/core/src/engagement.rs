//! Engagement metrics
//!
//! The reported duration is a scoring policy, not a measurement. Turns that
//! arrive in rapid automated succession make wall-clock time a poor proxy for
//! engagement, so the reported figure is the largest of the elapsed time, a
//! per-turn estimate times the turn count, and a floor. The constants come
//! from configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engagement scoring policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementPolicy {
    /// Assumed seconds per exchange
    #[serde(default = "default_per_turn_estimate")]
    pub per_turn_estimate_secs: f64,

    /// Minimum reported duration
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,
}

fn default_per_turn_estimate() -> f64 {
    12.0
}

fn default_min_duration() -> f64 {
    1.0
}

impl Default for EngagementPolicy {
    fn default() -> Self {
        Self {
            per_turn_estimate_secs: default_per_turn_estimate(),
            min_duration_secs: default_min_duration(),
        }
    }
}

impl EngagementPolicy {
    /// Reported engagement duration in seconds
    pub fn duration_secs(&self, turns: u32, elapsed: Duration) -> f64 {
        let estimated = self.per_turn_estimate_secs * f64::from(turns);
        elapsed
            .as_secs_f64()
            .max(estimated)
            .max(self.min_duration_secs)
    }

    /// Derive metrics for a session
    pub fn metrics(&self, turns: u32, elapsed: Duration) -> EngagementMetrics {
        let duration = self.duration_secs(turns, elapsed);
        EngagementMetrics {
            total_messages_exchanged: turns.saturating_mul(2),
            engagement_duration_seconds: (duration * 10.0).round() / 10.0,
        }
    }
}

/// Engagement metrics as reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// Both directions counted
    pub total_messages_exchanged: u32,
    pub engagement_duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_dominates_fast_turns() {
        let policy = EngagementPolicy::default();
        let metrics = policy.metrics(3, Duration::from_millis(250));
        assert_eq!(metrics.total_messages_exchanged, 6);
        assert_eq!(metrics.engagement_duration_seconds, 36.0);
    }

    #[test]
    fn test_wall_clock_dominates_slow_turns() {
        let policy = EngagementPolicy::default();
        let metrics = policy.metrics(1, Duration::from_secs(95));
        assert_eq!(metrics.engagement_duration_seconds, 95.0);
    }

    #[test]
    fn test_floor_applies_with_zero_estimate() {
        let policy = EngagementPolicy {
            per_turn_estimate_secs: 0.0,
            min_duration_secs: 1.0,
        };
        let metrics = policy.metrics(0, Duration::ZERO);
        assert_eq!(metrics.total_messages_exchanged, 0);
        assert_eq!(metrics.engagement_duration_seconds, 1.0);
    }

    #[test]
    fn test_metrics_serialize_camel_case() {
        let json = serde_json::to_value(EngagementMetrics::default()).unwrap();
        assert!(json.get("totalMessagesExchanged").is_some());
        assert!(json.get("engagementDurationSeconds").is_some());
    }
}
