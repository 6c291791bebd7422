//! Three-layer relevance filter
//!
//! Decides which raw articles become [`Event`]s. Layers run cheapest first
//! and short-circuit on rejection:
//!
//! 1. Keyword conjunction: at least one disruption trigger AND at least one
//!    supply-chain context term.
//! 2. Blocklist: known false-positive topics (medical, sports, entertainment...).
//! 3. Semantic oracle (optional): accepted iff the oracle says disruption with
//!    enough confidence. Every oracle failure passes the article through with
//!    reduced confidence.

use crate::config::FilterConfig;
use crate::dates::parse_published;
use crate::oracle::{build_prompt, parse_verdict, CallBudget, OracleError, SemanticOracle};
use crate::regions::detect_country;
use crate::text::{contains_any, first_keyword};
use crate::{DisruptionType, Event, EventType, Severity, GLOBAL_COUNTRY, UNKNOWN_COUNTRY};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Layer 1 triggers: something is happening
pub const DISRUPTION_KEYWORDS: &[&str] = &[
    // Active events
    "strike", "walkout", "shutdown", "closure", "closed", "blocked",
    "grounded", "halted", "suspended", "delayed", "congested", "disrupted",
    "disruption", "outage", "blackout", "explosion", "fire", "collapsed",
    "seized", "detained", "diverted", "stranded", "impounded",
    // Natural hazards
    "earthquake", "tsunami", "typhoon", "hurricane", "cyclone", "tornado",
    "flood", "flooding", "landslide", "volcanic", "wildfire", "drought",
    "blizzard", "snowstorm", "monsoon", "heatwave",
    // Conflict and policy
    "war", "conflict", "military", "invasion", "coup", "sanctions",
    "embargo", "blockade", "tariff", "export ban", "import ban",
    "trade restriction", "trade war", "protest", "riot", "civil unrest",
    "airstrike", "airstrikes", "missile strike", "missile attack",
    "bombing", "shelling", "attack", "damaged", "destroyed", "reduced",
    "hit by", "targeted", "under attack", "affected by conflict",
    "wartime", "military operation", "armed conflict",
    // Shortages
    "shortage", "scarcity", "rationing", "depletion",
    // Imminent threat language
    "will decide", "within days", "within 10 days", "within 48 hours",
    "could strike", "may strike", "considering strike", "potential strike",
    "military action", "troops deployed", "carriers repositioned",
    "assets repositioned", "military buildup", "pre-emptive",
    "decision expected", "deadline approaching", "ultimatum",
    "regime change", "naval blockade", "strait closure",
    "hormuz", "bab-el-mandeb", "persian gulf",
];

/// Layer 1 context: the event touches goods movement or production
pub const SUPPLY_CONTEXT_KEYWORDS: &[&str] = &[
    // Physical logistics
    "port", "shipping", "freight", "cargo", "container", "vessel", "ship",
    "tanker", "dock", "terminal", "harbor", "harbour", "customs",
    "rail freight", "air freight", "trucking", "haulage", "logistics",
    "supply chain", "warehouse", "distribution", "last mile",
    "canal", "suez", "panama canal", "strait", "bosphorus", "shipping lane",
    // Trade and manufacturing
    "import", "export", "trade", "shipment", "manufacturer", "manufacturing",
    "factory", "plant", "production", "assembly line", "industrial",
    "raw material", "inventory", "procurement",
    // Industries
    "semiconductor", "chip", "automotive", "steel", "aluminum", "copper",
    "textile", "garment", "pharmaceutical", "chemical", "oil", "gas",
    "fuel", "energy supply", "power grid", "pipeline", "refinery",
    "agriculture", "grain", "wheat", "commodity",
    // Conflict-zone trade
    "iron ore", "sunflower oil", "fertilizer", "ammonia", "black sea",
    "export capacity", "cargo vessel", "inland rail", "freight cost",
    "trade corridor", "supply route", "evacuation corridor",
    // Energy chokepoints
    "oil supply", "oil price", "oil transit", "crude oil", "energy market",
    "strait of hormuz", "persian gulf", "red sea route", "suez alternative",
    "oil tanker", "lng", "natural gas supply", "energy security",
    // Gulf
    "iran", "tehran", "isfahan", "bandar abbas", "kharg island",
    "gulf region", "middle east conflict", "hormuz", "persian",
    "carriers repositioned", "troops deployed", "military assets",
];

/// Layer 2 false-positive topics, checked in order
pub const BLOCKLIST_TOPICS: &[&str] = &[
    // Medical
    "tourette", "syndrome", "autism", "adhd", "alzheimer", "dementia",
    "cancer treatment", "chemotherapy", "blood supply", "hospital supply",
    "medical shortage", "drug shortage", "medication shortage",
    "insulin shortage", "vaccine shortage", "mental health",
    "psychiatric", "therapy session", "clinical trial", "diagnosis",
    "neurological", "coprolalia", "bafta incide",
    "nurse shortage", "doctor shortage", "physician shortage",
    "healthcare worker", "patient care",
    // Sports
    "nba strike", "nfl strike", "mlb strike", "nhl lockout",
    "fifa", "premier league", "champions league", "world cup",
    "olympics disruption", "athlete protest", "player strike",
    "sports conflict", "boxing match", "wrestling",
    // Entertainment
    "hollywood strike", "writers strike", "actors strike", "sag-aftra",
    "film festival", "box office", "movie disruption", "tv show",
    "celebrity", "bafta", "oscar", "grammy", "emmy", "golden globe",
    "taylor swift", "beyonce", "drake", "kanye", "kardashian",
    "streaming service", "netflix",
    // Consumer cybersecurity
    "ransomware attack", "data breach", "cyber attack on hospital",
    "phishing campaign", "password leak", "social media hack",
    "personal data", "credit card breach",
    // Housing
    "housing shortage", "housing crisis", "apartment shortage",
    "rent increase", "mortgage", "property market",
    // Crypto and finance
    "crypto crash", "bitcoin", "ethereum", "nft", "defi",
    "stock market disruption", "hedge fund",
    // Non-trade politics
    "abortion rights", "gun control", "immigration debate",
    "election fraud", "voter suppression", "supreme court ruling",
    "criminal trial", "sexual assault", "domestic violence",
];

/// Article as delivered by a feed, before filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publish date in whatever format the feed uses
    #[serde(default, alias = "published_date", skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default = "unknown_country", alias = "detected_country")]
    pub country: String,
    #[serde(default)]
    pub event_type: EventType,
}

fn unknown_country() -> String {
    UNKNOWN_COUNTRY.to_string()
}

impl RawArticle {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            source: String::new(),
            url: None,
            published: None,
            country: unknown_country(),
            event_type: EventType::News,
        }
    }

    /// Feed gave no usable country
    pub fn has_vague_country(&self) -> bool {
        is_vague_location(&self.country)
    }
}

fn is_vague_location(country: &str) -> bool {
    let c = country.trim();
    c.is_empty() || c.eq_ignore_ascii_case(UNKNOWN_COUNTRY) || c.eq_ignore_ascii_case(GLOBAL_COUNTRY)
}

/// Filter stage that rejected an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLayer {
    Keyword,
    Blocklist,
    Oracle,
}

impl FilterLayer {
    pub fn number(&self) -> u8 {
        match self {
            Self::Keyword => 1,
            Self::Blocklist => 2,
            Self::Oracle => 3,
        }
    }
}

impl fmt::Display for FilterLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.number())
    }
}

/// Verdict for one article, with the enrichment applied on approval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub passes: bool,
    pub rejected_at: Option<FilterLayer>,
    pub reject_reason: String,
    pub disruption_type: DisruptionType,
    pub severity: Severity,
    pub confidence: u8,
    pub reasoning: String,
    /// Location reported by the oracle
    pub location: Option<String>,
    /// The oracle was invoked for this article (successfully or not)
    pub oracle_called: bool,
}

impl FilterResult {
    fn rejected(layer: FilterLayer, reason: impl fmt::Display) -> Self {
        Self {
            passes: false,
            rejected_at: Some(layer),
            reject_reason: format!("{}: {}", layer, reason),
            disruption_type: DisruptionType::Other,
            severity: Severity::Medium,
            confidence: 0,
            reasoning: String::new(),
            location: None,
            oracle_called: false,
        }
    }

    fn pass_through(confidence: u8, reasoning: String, oracle_called: bool) -> Self {
        Self {
            passes: true,
            rejected_at: None,
            reject_reason: String::new(),
            disruption_type: DisruptionType::Other,
            severity: Severity::Medium,
            confidence,
            reasoning,
            location: None,
            oracle_called,
        }
    }
}

/// Batch counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub total: usize,
    pub approved: usize,
    pub rejected_l1: usize,
    pub rejected_l2: usize,
    pub rejected_l3: usize,
    pub oracle_calls: usize,
}

/// An article that passed every layer, enriched with its verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedArticle {
    pub article: RawArticle,
    pub result: FilterResult,
}

impl ApprovedArticle {
    pub fn into_event(self) -> Event {
        let ApprovedArticle { article, result } = self;
        let published_at = article.published.as_deref().and_then(parse_published);
        Event {
            title: article.title,
            description: article.description,
            source: article.source,
            url: article.url,
            published_at,
            detected_country: article.country,
            event_type: article.event_type,
            severity: result.severity,
            disruption_type: Some(result.disruption_type),
            confidence: Some(result.confidence),
            reasoning: Some(result.reasoning),
            seasonal_weight: None,
        }
    }
}

/// Layer 1
pub fn keyword_layer(text_lower: &str) -> std::result::Result<(), &'static str> {
    if !contains_any(text_lower, DISRUPTION_KEYWORDS) {
        return Err("No disruption keyword found");
    }
    if !contains_any(text_lower, SUPPLY_CONTEXT_KEYWORDS) {
        return Err("No supply chain context keyword found");
    }
    Ok(())
}

/// Layer 2; returns the first blocklisted topic found
pub fn blocklist_layer(text_lower: &str) -> Option<&'static str> {
    first_keyword(text_lower, BLOCKLIST_TOPICS)
}

pub struct RelevanceFilter {
    config: FilterConfig,
    oracle: Option<Arc<dyn SemanticOracle>>,
    budget: Arc<CallBudget>,
    oracle_timeout: Duration,
}

impl RelevanceFilter {
    /// Filter running layers 1 and 2 only
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            oracle: None,
            budget: Arc::new(CallBudget::new(0)),
            oracle_timeout: Duration::from_secs(15),
        }
    }

    /// Enable layer 3
    pub fn with_oracle(
        mut self,
        oracle: Arc<dyn SemanticOracle>,
        budget: Arc<CallBudget>,
        timeout: Duration,
    ) -> Self {
        self.oracle = Some(oracle);
        self.budget = budget;
        self.oracle_timeout = timeout;
        self
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub async fn classify(&self, title: &str, description: &str) -> FilterResult {
        self.classify_on(title, description, Utc::now().date_naive()).await
    }

    /// Classify with the oracle budget charged to `today`
    pub async fn classify_on(&self, title: &str, description: &str, today: NaiveDate) -> FilterResult {
        let title = title.trim();
        let description = description.trim();
        let text = format!("{} {}", title, description).to_lowercase();

        if let Err(reason) = keyword_layer(&text) {
            return FilterResult::rejected(FilterLayer::Keyword, reason);
        }

        if let Some(term) = blocklist_layer(&text) {
            return FilterResult::rejected(FilterLayer::Blocklist, format!("Blocklist match: '{}'", term));
        }

        let Some(oracle) = &self.oracle else {
            return FilterResult::pass_through(
                self.config.no_oracle_confidence,
                "Passed keyword + blocklist filters (LLM not configured)".to_string(),
                false,
            );
        };

        if !self.budget.try_acquire(today) {
            debug!(limit = self.budget.limit(), "Oracle budget exhausted, passing article through");
            return self.degraded(
                format!("Daily budget of {} calls reached", self.budget.limit()),
                false,
            );
        }

        let prompt = build_prompt(title, description);
        let raw = match tokio::time::timeout(self.oracle_timeout, oracle.classify(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return self.oracle_failed(oracle.name(), e),
            Err(_) => return self.oracle_failed(oracle.name(), OracleError::Timeout(self.oracle_timeout)),
        };

        let verdict = match parse_verdict(&raw) {
            Ok(v) => v,
            Err(e) => return self.oracle_failed(oracle.name(), e),
        };

        let confidence = verdict.confidence_pct();
        let disruption_type = DisruptionType::parse(verdict.disruption_type.as_deref().unwrap_or("other"));
        let severity = verdict
            .severity
            .as_deref()
            .and_then(Severity::parse)
            .unwrap_or(Severity::Medium);
        let location = verdict
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        let passes = verdict.is_disruption && confidence >= self.config.min_oracle_confidence;
        FilterResult {
            passes,
            rejected_at: (!passes).then_some(FilterLayer::Oracle),
            reject_reason: if passes {
                String::new()
            } else {
                format!(
                    "L3: classified as non-disruption (confidence={}, disruption={})",
                    confidence, verdict.is_disruption
                )
            },
            disruption_type,
            severity,
            confidence,
            reasoning: verdict.reasoning.unwrap_or_default(),
            location,
            oracle_called: true,
        }
    }

    fn oracle_failed(&self, oracle: &str, error: OracleError) -> FilterResult {
        warn!(oracle, error = %error, "Oracle unavailable, passing article through");
        self.degraded(error.to_string(), true)
    }

    fn degraded(&self, reason: String, oracle_called: bool) -> FilterResult {
        FilterResult::pass_through(
            self.config.degraded_confidence,
            format!("LLM skipped: {}", crate::text::truncate_chars(&reason, 100)),
            oracle_called,
        )
    }

    /// Filter a batch, enriching approved articles.
    ///
    /// When the article's own country is Unknown/Global and the oracle
    /// reported a location, the location replaces the country.
    pub async fn filter_batch(&self, articles: Vec<RawArticle>) -> (Vec<ApprovedArticle>, FilterStats) {
        let today = Utc::now().date_naive();
        let mut stats = FilterStats {
            total: articles.len(),
            ..FilterStats::default()
        };
        let mut approved = Vec::new();

        for mut article in articles {
            let result = self.classify_on(&article.title, &article.description, today).await;

            if result.oracle_called {
                stats.oracle_calls += 1;
            }

            match result.rejected_at {
                None => {
                    if let Some(location) = &result.location {
                        if article.has_vague_country() && !is_vague_location(location) {
                            let detected = detect_country(location);
                            article.country = if detected == UNKNOWN_COUNTRY {
                                location.clone()
                            } else {
                                detected
                            };
                        }
                    }
                    stats.approved += 1;
                    approved.push(ApprovedArticle { article, result });
                }
                Some(FilterLayer::Keyword) => stats.rejected_l1 += 1,
                Some(FilterLayer::Blocklist) => stats.rejected_l2 += 1,
                Some(FilterLayer::Oracle) => stats.rejected_l3 += 1,
            }
        }

        info!(
            total = stats.total,
            approved = stats.approved,
            rejected_l1 = stats.rejected_l1,
            rejected_l2 = stats.rejected_l2,
            rejected_l3 = stats.rejected_l3,
            oracle_calls = stats.oracle_calls,
            "Filtered article batch"
        );

        (approved, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubOracle {
        reply: std::result::Result<&'static str, &'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubOracle {
        fn replying(json: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(json),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow() -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(r#"{"is_disruption": false, "confidence": 99}"#),
                delay: Duration::from_secs(5),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SemanticOracle for StubOracle {
        fn name(&self) -> &str {
            "stub"
        }

        async fn classify(&self, _prompt: &str) -> std::result::Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply
                .map(str::to_string)
                .map_err(|m| OracleError::Request(m.to_string()))
        }
    }

    fn make_filter(oracle: Arc<StubOracle>, budget: u32) -> RelevanceFilter {
        RelevanceFilter::new(FilterConfig::default()).with_oracle(
            oracle,
            Arc::new(CallBudget::new(budget)),
            Duration::from_millis(100),
        )
    }

    const STRIKE_AT_PORT: &str = "Dockworkers strike halts container traffic at Port of Rotterdam";

    #[tokio::test]
    async fn test_keyword_conjunction() {
        let filter = RelevanceFilter::new(FilterConfig::default());

        let only_disruption = filter.classify("Workers strike over pay", "").await;
        assert_eq!(only_disruption.rejected_at, Some(FilterLayer::Keyword));
        assert!(only_disruption.reject_reason.contains("context"));

        let only_context = filter.classify("Port of Rotterdam sets container record", "").await;
        assert_eq!(only_context.rejected_at, Some(FilterLayer::Keyword));
        assert!(only_context.reject_reason.contains("disruption"));

        let both = filter.classify(STRIKE_AT_PORT, "").await;
        assert!(both.passes);
    }

    #[tokio::test]
    async fn test_blocklist_after_keywords() {
        let filter = RelevanceFilter::new(FilterConfig::default());
        let result = filter
            .classify("Drug shortage hits port of Antwerp", "Pharmaceutical shipments delayed")
            .await;
        assert!(!result.passes);
        assert_eq!(result.rejected_at, Some(FilterLayer::Blocklist));
        assert_eq!(result.reject_reason, "L2: Blocklist match: 'drug shortage'");
    }

    #[tokio::test]
    async fn test_no_oracle_pass_through() {
        let filter = RelevanceFilter::new(FilterConfig::default());
        let result = filter.classify(STRIKE_AT_PORT, "").await;
        assert!(result.passes);
        assert_eq!(result.confidence, 60);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.disruption_type, DisruptionType::Other);
        assert!(!result.oracle_called);
    }

    #[tokio::test]
    async fn test_oracle_accepts() {
        let oracle = StubOracle::replying(
            r#"{"is_disruption": true, "confidence": 88, "disruption_type": "labor_strike",
                "location": "Netherlands", "severity": "high", "reasoning": "Port strike"}"#,
        );
        let filter = make_filter(oracle.clone(), 10);
        let result = filter.classify(STRIKE_AT_PORT, "").await;

        assert!(result.passes);
        assert_eq!(result.confidence, 88);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.disruption_type, DisruptionType::LaborStrike);
        assert_eq!(result.location.as_deref(), Some("Netherlands"));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oracle_rejects_low_confidence() {
        let filter = make_filter(StubOracle::replying(r#"{"is_disruption": true, "confidence": 55}"#), 10);
        let result = filter.classify(STRIKE_AT_PORT, "").await;
        assert!(!result.passes);
        assert_eq!(result.rejected_at, Some(FilterLayer::Oracle));

        let filter = make_filter(
            StubOracle::replying(r#"{"is_supply_chain_disruption": false, "confidence": 95}"#),
            10,
        );
        assert_eq!(filter.classify(STRIKE_AT_PORT, "").await.rejected_at, Some(FilterLayer::Oracle));
    }

    #[tokio::test]
    async fn test_oracle_error_fails_open() {
        let filter = make_filter(StubOracle::failing("connection refused"), 10);
        let result = filter.classify(STRIKE_AT_PORT, "").await;
        assert!(result.passes);
        assert_eq!(result.confidence, 50);
        assert!(result.reasoning.starts_with("LLM skipped:"));
        assert!(result.oracle_called);
    }

    #[tokio::test]
    async fn test_oracle_timeout_fails_open() {
        let filter = make_filter(StubOracle::slow(), 10);
        let result = filter.classify(STRIKE_AT_PORT, "").await;
        assert!(result.passes);
        assert_eq!(result.confidence, 50);
        assert!(result.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_malformed_oracle_reply_fails_open() {
        let filter = make_filter(StubOracle::replying("Sure! This looks like a disruption."), 10);
        let result = filter.classify(STRIKE_AT_PORT, "").await;
        assert!(result.passes);
        assert_eq!(result.confidence, 50);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_fails_open() {
        let oracle = StubOracle::replying(r#"{"is_disruption": false, "confidence": 99}"#);
        let filter = make_filter(oracle.clone(), 1);
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();

        let first = filter.classify_on(STRIKE_AT_PORT, "", today).await;
        assert!(!first.passes);

        let second = filter.classify_on(STRIKE_AT_PORT, "", today).await;
        assert!(second.passes);
        assert!(second.reasoning.contains("Daily budget of 1 calls reached"));
        assert!(!second.oracle_called);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);

        let next_day = today.succ_opt().unwrap();
        assert!(!filter.classify_on(STRIKE_AT_PORT, "", next_day).await.passes);
    }

    #[tokio::test]
    async fn test_filter_batch_stats_and_location_override() {
        let oracle = StubOracle::replying(
            r#"{"is_disruption": true, "confidence": 90, "location": "Viet Nam", "severity": "high"}"#,
        );
        let filter = make_filter(oracle, 10);

        let mut known = RawArticle::new(STRIKE_AT_PORT, "");
        known.country = "Netherlands".to_string();
        let mut global = RawArticle::new("Typhoon closes container terminals", "Shipping suspended");
        global.country = GLOBAL_COUNTRY.to_string();
        global.published = Some("2026-05-01T08:00:00Z".to_string());

        let articles = vec![
            known,
            global,
            RawArticle::new("Workers strike over pay", ""),
            RawArticle::new("Bitcoin crash: trade disruption hits crypto exchanges", ""),
        ];

        let (approved, stats) = filter.filter_batch(articles).await;
        assert_eq!(
            stats,
            FilterStats {
                total: 4,
                approved: 2,
                rejected_l1: 1,
                rejected_l2: 1,
                rejected_l3: 0,
                oracle_calls: 2,
            }
        );

        assert_eq!(approved[0].article.country, "Netherlands");
        assert_eq!(approved[1].article.country, "Vietnam");

        let event = approved[1].clone().into_event();
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.confidence, Some(90));
        assert!(event.published_at.is_some());
    }
}
