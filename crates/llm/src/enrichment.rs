//! Enrichment oracle backed by a chat model
//!
//! Model output is treated as untrusted: fences are stripped, unknown keys
//! ignored, non-string entries coerced or dropped. Anything that is not a
//! JSON object is an error, which the caller discards.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use honeypot_config::EnrichmentConfig;
use honeypot_core::{EnrichmentOracle, EvidenceCategory, EvidenceRecord};

use crate::backend::{LlmBackend, OpenAIBackend, OpenAIConfig};
use crate::prompt::extraction_messages;
use crate::LlmError;

/// [`EnrichmentOracle`] that asks an LLM to extract evidence
pub struct LlmEnrichmentOracle {
    backend: Arc<dyn LlmBackend>,
}

impl LlmEnrichmentOracle {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// OpenAI-compatible oracle from enrichment settings
    pub fn from_settings(settings: &EnrichmentConfig) -> Result<Self, LlmError> {
        let backend = OpenAIBackend::new(OpenAIConfig::from_settings(settings)?)?;
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn backend(&self) -> &Arc<dyn LlmBackend> {
        &self.backend
    }
}

#[async_trait]
impl EnrichmentOracle for LlmEnrichmentOracle {
    async fn enrich(&self, text: &str) -> honeypot_core::Result<EvidenceRecord> {
        let result = self.backend.generate(&extraction_messages(text)).await?;
        let evidence = parse_evidence(&result.text)?;

        tracing::debug!(
            model = self.backend.model_name(),
            items = evidence.total(),
            total_time_ms = result.total_time_ms,
            "Enrichment returned evidence"
        );

        Ok(evidence)
    }

    fn name(&self) -> &str {
        self.backend.model_name()
    }
}

/// Parse model output into a normalized evidence record
pub fn parse_evidence(content: &str) -> Result<EvidenceRecord, LlmError> {
    let body = strip_code_fences(content);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("not JSON: {}", e)))?;

    let Value::Object(map) = value else {
        return Err(LlmError::InvalidResponse("expected a JSON object".to_string()));
    };

    let mut raw = EvidenceRecord::new();
    for category in EvidenceCategory::ALL {
        let keys = std::iter::once(category.key()).chain(category.legacy_key());
        for key in keys {
            if let Some(entries) = map.get(key) {
                raw.get_mut(category).extend(coerce_entries(entries));
            }
        }
    }

    // Trim, drop blanks and dedup within each category
    Ok(EvidenceRecord::new().merged(&raw))
}

/// Body of the first fenced block, or the whole text when unfenced
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let after = &trimmed[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(close) => after[..close].trim(),
        None => after.trim(),
    }
}

fn coerce_entries(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_scalar).collect(),
        other => coerce_scalar(other).into_iter().collect(),
    }
}

fn coerce_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
