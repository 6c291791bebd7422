//! Supplier Disruption Risk Engine
//!
//! Matches open-source disruption signals (news articles, weather alerts and
//! seasonal calendar windows) to an uploaded supplier list and computes a
//! 0-100 risk score per supplier.
//!
//! # Scoring Model
//!
//! ```text
//! points(e) = min(25 · D · S · T, 25)
//! score(s)  = min(round(Σ top-5 points / 125 · 100, 1), 100)
//! ```
//!
//! | Factor | Description |
//! |--------|-------------|
//! | D      | Distance multiplier (great-circle tiers, national/continental fallback) |
//! | S      | Severity multiplier (high 1.0, medium 0.5, low 0.2) |
//! | T      | Time multiplier (forecast 2.0, recency decay, stale events excluded) |
//!
//! # Pipeline
//!
//! 1. Raw articles from an [`collector::EventSource`] pass the three-layer
//!    [`filter::RelevanceFilter`] and become persisted [`Event`]s.
//! 2. The [`scorer::Scorer`] combines stored events with synthetic
//!    [`seasonal`] windows and resolves locations through the
//!    [`gazetteer`] and the cache-only [`geocoder`].
//! 3. Flagged suppliers get sourcing options from [`alternatives`], with
//!    urgency taken from [`countdown`] deadlines.
//! 4. The score breakdown drives rule-based [`recommendations`] and
//!    city-aware [`predictions`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;

pub mod alternatives;
pub mod collector;
pub mod config;
pub mod countdown;
pub mod dates;
pub mod engine;
pub mod export;
pub mod filter;
pub mod gazetteer;
pub mod geocoder;
pub mod loader;
pub mod oracle;
pub mod predictions;
pub mod recommendations;
pub mod regions;
pub mod rules;
pub mod scorer;
pub mod seasonal;
pub mod store;
pub mod text;

pub use config::EngineConfig;
pub use engine::RiskEngine;
pub use scorer::{Scorer, ScorerConfig};

/// Maximum points a single event can contribute
pub const MAX_EVENT_POINTS: f64 = 25.0;

/// Number of top-scoring events counted per supplier
pub const TOP_K: usize = 5;

/// Events published longer ago than this are never stored
pub const RETENTION_DAYS: i64 = 21;

/// Score at or above which a supplier is High risk
pub const HIGH_RISK_THRESHOLD: f64 = 60.0;

/// Score at or above which a supplier is Medium risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 26.0;

/// Country placeholder when no location could be detected
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Country placeholder for worldwide wire stories
pub const GLOBAL_COUNTRY: &str = "Global";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid supplier record {row}: {reason}")]
    Validation { row: usize, reason: String },
    #[error("Duplicate supplier name: {0}")]
    DuplicateSupplier(String),
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),
    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Severity tier of a disruption signal
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Scoring multiplier for this tier
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.5,
            Self::Low => 0.2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a free-form label ("High", " medium ") into a tier
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of an event record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    News,
    Weather,
    Seasonal,
}

/// Derived supplier risk classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify against explicit thresholds
    pub fn classify(score: f64, high: f64, medium: f64) -> Self {
        if score >= high {
            Self::High
        } else if score >= medium {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Classify with the default 60 / 26 table
    pub fn from_score(score: f64) -> Self {
        Self::classify(score, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disruption category assigned by the semantic oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionType {
    NaturalDisaster,
    LaborStrike,
    WarConflict,
    TradePolicy,
    LogisticsFailure,
    InfrastructureDamage,
    Cyberattack,
    Shortage,
    PandemicHealth,
    Other,
}

impl DisruptionType {
    /// Lenient parse of an oracle label; unrecognised labels map to `Other`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "natural_disaster" => Self::NaturalDisaster,
            "labor_strike" | "labour_strike" => Self::LaborStrike,
            "war_conflict" => Self::WarConflict,
            "trade_policy" => Self::TradePolicy,
            "logistics_failure" => Self::LogisticsFailure,
            "infrastructure_damage" => Self::InfrastructureDamage,
            "cyberattack" => Self::Cyberattack,
            "shortage" => Self::Shortage,
            "pandemic_health" => Self::PandemicHealth,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NaturalDisaster => "natural_disaster",
            Self::LaborStrike => "labor_strike",
            Self::WarConflict => "war_conflict",
            Self::TradePolicy => "trade_policy",
            Self::LogisticsFailure => "logistics_failure",
            Self::InfrastructureDamage => "infrastructure_damage",
            Self::Cyberattack => "cyberattack",
            Self::Shortage => "shortage",
            Self::PandemicHealth => "pandemic_health",
            Self::Other => "other",
        }
    }

    /// Human-readable form ("natural disaster")
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for DisruptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude and longitude are finite and within ±90 / ±180
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine_miles(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// A single disruption signal
///
/// Immutable for the duration of a scoring pass. Seasonal events are
/// synthesised per run and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `None` when the feed supplied no parsable date
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default = "unknown_country")]
    pub detected_country: String,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub severity: Severity,

    // Relevance filter enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disruption_type: Option<DisruptionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Calendar weight; used as the distance multiplier of a seasonal event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_weight: Option<f64>,
}

fn unknown_country() -> String {
    UNKNOWN_COUNTRY.to_string()
}

impl Event {
    /// Minimal news event, mostly useful for tests and fixtures
    pub fn news(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            source: String::new(),
            url: None,
            published_at: None,
            detected_country: unknown_country(),
            event_type: EventType::News,
            severity: Severity::Low,
            disruption_type: None,
            confidence: None,
            reasoning: None,
            seasonal_weight: None,
        }
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.detected_country = country.into();
        self
    }

    /// Title and description joined by a space
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    pub fn is_seasonal(&self) -> bool {
        self.event_type == EventType::Seasonal || self.seasonal_weight.is_some()
    }
}

/// An entity to protect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    pub category: String,
    pub city: String,
    pub country: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    // Derived by the scorer, never set directly
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub event_summary: String,
}

impl Supplier {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            city: city.into(),
            country: country.into(),
            tier: tier.into(),
            latitude: None,
            longitude: None,
            risk_score: 0.0,
            risk_level: RiskLevel::Low,
            event_summary: String::new(),
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Geocoded position, if both coordinates are present
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    /// Write back a derived score
    pub fn apply_score(&mut self, score: f64, level: RiskLevel, summary: impl Into<String>) {
        self.risk_score = score;
        self.risk_level = level;
        self.event_summary = summary.into();
    }
}

/// Haversine distance between two points in miles
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const R: f64 = 3958.8; // Earth radius in miles

    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlon = (lon2 - lon1) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    R * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine() {
        // Shanghai to Shenzhen: ~760 miles
        let dist = haversine_miles(31.2304, 121.4737, 22.5431, 114.0579);
        assert!((dist - 760.0).abs() < 20.0);

        // Same point: 0 miles
        let dist = haversine_miles(22.5431, 114.0579, 22.5431, 114.0579);
        assert!(dist.abs() < 0.001);
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(59.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(26.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(25.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(20.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
    }

    #[test]
    fn test_severity_multipliers() {
        assert_eq!(Severity::High.multiplier(), 1.0);
        assert_eq!(Severity::Medium.multiplier(), 0.5);
        assert_eq!(Severity::Low.multiplier(), 0.2);
        assert_eq!(Severity::parse(" HIGH "), Some(Severity::High));
        assert_eq!(Severity::parse("severe"), None);
    }

    #[test]
    fn test_disruption_type_parse() {
        assert_eq!(DisruptionType::parse("labor_strike"), DisruptionType::LaborStrike);
        assert_eq!(DisruptionType::parse("War Conflict"), DisruptionType::WarConflict);
        assert_eq!(DisruptionType::parse("alien invasion"), DisruptionType::Other);
    }

    #[test]
    fn test_event_defaults_from_json() {
        let event: Event = serde_json::from_str(r#"{"title": "Port strike"}"#).unwrap();
        assert_eq!(event.detected_country, UNKNOWN_COUNTRY);
        assert_eq!(event.event_type, EventType::News);
        assert_eq!(event.severity, Severity::Low);
        assert!(event.published_at.is_none());
        assert!(!event.is_seasonal());
    }

    #[test]
    fn test_supplier_coordinates() {
        let supplier = Supplier::new("Acme", "electronics", "Shenzhen", "China", "1");
        assert!(supplier.coordinates().is_none());

        let supplier = supplier.with_coordinates(22.5431, 114.0579);
        assert_eq!(supplier.coordinates(), Some(Coordinates::new(22.5431, 114.0579)));
    }
}
