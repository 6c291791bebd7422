//! Semantic oracle for the relevance filter's third layer
//!
//! The oracle is optional. Anything that goes wrong here (timeouts, HTTP
//! errors, malformed JSON, budget exhaustion) is handled by the caller as a
//! pass-through, never as a rejection.

use crate::config::OracleConfig;
use crate::text::truncate_chars;
use crate::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Instructions sent with every classification request
pub const SYSTEM_PROMPT: &str = r#"You are a supply chain risk analyst. Your job is to determine whether a news article describes a real-world event that disrupts the production, transportation, storage, trade, or availability of physical goods.

Analyze the article and return ONLY valid JSON with these fields:
{
  "is_supply_chain_disruption": true or false,
  "confidence": 0-100,
  "disruption_type": one of [natural_disaster, labor_strike, war_conflict, trade_policy, logistics_failure, infrastructure_damage, cyberattack, shortage, pandemic_health, other],
  "location": "country or region name",
  "severity": "low", "medium", or "high",
  "reasoning": "one sentence explaining your decision"
}

Return true ONLY if the article describes disruption to: ports, shipping lanes, freight, cargo, manufacturing plants, factories, rail/road/air freight networks, energy supply chains, agricultural supply, or trade routes.

Return false for: medical/health topics, sports, entertainment, cybersecurity affecting non-logistics targets, housing, cryptocurrency, or general political news not directly affecting goods movement.

Be strict. If in doubt, return false. Prioritize precision over recall."#;

const MAX_TITLE_CHARS: usize = 300;
const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(String),
    #[error("oracle returned status {0}: {1}")]
    Status(u16, String),
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// Classifier capability; returns the raw JSON text of a verdict
#[async_trait]
pub trait SemanticOracle: Send + Sync {
    fn name(&self) -> &str;
    async fn classify(&self, prompt: &str) -> std::result::Result<String, OracleError>;
}

/// Parsed oracle answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OracleVerdict {
    #[serde(alias = "is_supply_chain_disruption")]
    pub is_disruption: bool,
    pub confidence: f64,
    #[serde(default)]
    pub disruption_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl OracleVerdict {
    /// Confidence clamped to 0-100
    pub fn confidence_pct(&self) -> u8 {
        self.confidence.round().clamp(0.0, 100.0) as u8
    }
}

/// User message for one article, with title and description truncated
pub fn build_prompt(title: &str, description: &str) -> String {
    format!(
        "Article title: {}\nArticle description: {}\n\nClassify this article.",
        truncate_chars(title.trim(), MAX_TITLE_CHARS),
        truncate_chars(description.trim(), MAX_DESCRIPTION_CHARS)
    )
}

/// Parse a verdict, tolerating markdown fences or prose around the JSON object.
///
/// Missing `is_disruption` or `confidence` is a [`OracleError::Malformed`].
pub fn parse_verdict(raw: &str) -> std::result::Result<OracleVerdict, OracleError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if e > s => &raw[s..=e],
        _ => return Err(OracleError::Malformed("no JSON object in response".to_string())),
    };
    serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))
}

/// Per-UTC-day call counter
#[derive(Debug)]
pub struct CallBudget {
    limit: u32,
    state: Mutex<(NaiveDate, u32)>,
}

impl CallBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            state: Mutex::new((NaiveDate::MIN, 0)),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Reserve one call for `today`; the count resets when the date changes
    pub fn try_acquire(&self, today: NaiveDate) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.0 != today {
            *state = (today, 0);
        }
        if state.1 >= self.limit {
            return false;
        }
        state.1 += 1;
        true
    }

    pub fn try_acquire_now(&self) -> bool {
        self.try_acquire(Utc::now().date_naive())
    }

    /// Calls made on `today`
    pub fn used(&self, today: NaiveDate) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.0 == today {
            state.1
        } else {
            0
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions oracle in JSON mode
#[derive(Clone)]
pub struct OpenAiOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SemanticOracle for OpenAiOracle {
    fn name(&self) -> &str {
        &self.model
    }

    async fn classify(&self, prompt: &str) -> std::result::Result<String, OracleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: 200,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %self.model, prompt_length = prompt.len(), "Calling oracle");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Status(status, truncate_chars(&body, 200).to_string()));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| OracleError::Malformed("empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_plain() {
        let verdict = parse_verdict(
            r#"{"is_disruption": true, "confidence": 85, "disruption_type": "labor_strike",
                "location": "China", "severity": "high", "reasoning": "Port strike"}"#,
        )
        .unwrap();
        assert!(verdict.is_disruption);
        assert_eq!(verdict.confidence_pct(), 85);
        assert_eq!(verdict.location.as_deref(), Some("China"));
    }

    #[test]
    fn test_parse_verdict_legacy_key_and_fences() {
        let raw = "```json\n{\"is_supply_chain_disruption\": false, \"confidence\": 40}\n```";
        let verdict = parse_verdict(raw).unwrap();
        assert!(!verdict.is_disruption);
        assert_eq!(verdict.confidence_pct(), 40);
        assert!(verdict.reasoning.is_none());
    }

    #[test]
    fn test_parse_verdict_missing_key_is_malformed() {
        assert!(matches!(
            parse_verdict(r#"{"confidence": 90}"#),
            Err(OracleError::Malformed(_))
        ));
        assert!(matches!(parse_verdict("I think so"), Err(OracleError::Malformed(_))));
    }

    #[test]
    fn test_confidence_clamped() {
        let verdict = parse_verdict(r#"{"is_disruption": true, "confidence": 180}"#).unwrap();
        assert_eq!(verdict.confidence_pct(), 100);
    }

    #[test]
    fn test_prompt_truncation() {
        let long_title = "t".repeat(400);
        let long_desc = "d".repeat(900);
        let prompt = build_prompt(&long_title, &long_desc);
        assert!(prompt.contains(&"t".repeat(300)));
        assert!(!prompt.contains(&"t".repeat(301)));
        assert!(prompt.contains(&"d".repeat(500)));
        assert!(!prompt.contains(&"d".repeat(501)));
    }

    #[test]
    fn test_budget_resets_daily() {
        let budget = CallBudget::new(2);
        let day1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        assert!(budget.try_acquire(day1));
        assert!(budget.try_acquire(day1));
        assert!(!budget.try_acquire(day1));
        assert_eq!(budget.used(day1), 2);

        assert!(budget.try_acquire(day2));
        assert_eq!(budget.used(day2), 1);
        assert_eq!(budget.used(day1), 0);
    }

    #[test]
    fn test_zero_budget_never_grants() {
        let budget = CallBudget::new(0);
        assert!(!budget.try_acquire_now());
    }
}
