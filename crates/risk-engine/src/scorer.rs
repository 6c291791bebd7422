//! Core geo-temporal scorer
//!
//! Every event contributes `min(25 · D · S · T, 25)` points to a supplier.
//! The top five contributions are summed and normalised to 0-100.
//!
//! # Distance (D)
//!
//! | Great-circle distance | D    |
//! |-----------------------|------|
//! | ≤ 50 mi               | 1.00 |
//! | ≤ 300 mi              | 0.60 |
//! | ≤ 1000 mi             | 0.25 |
//! | ≤ 3000 mi             | 0.08 |
//! | > 3000 mi             | 0.02 |
//!
//! Without coordinates on both sides the event's country decides: same
//! country 0.60 (×1.4 for high-signal events, capped at 1.0), same continent
//! 0.05, elsewhere 0.02, unknown 0.01. Seasonal events use their calendar
//! weight as D.
//!
//! # Time (T)
//!
//! Forecast language or a future publish date gives 2.0. Otherwise the
//! weight decays with age, and events that are too old score nothing.

use crate::dates::relative_label;
use crate::gazetteer;
use crate::geocoder::GeocodeCache;
use crate::regions::{continent_of, same_country};
use crate::rules::{Predicate, RuleSet};
use crate::seasonal::seasonal_signals;
use crate::text::{contains_any, truncate_chars};
use crate::{
    Coordinates, Event, RiskLevel, Severity, Supplier, GLOBAL_COUNTRY, HIGH_RISK_THRESHOLD, MAX_EVENT_POINTS,
    MEDIUM_RISK_THRESHOLD, TOP_K, UNKNOWN_COUNTRY,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Distance multiplier at or above which an event is "nearby" for the summary
pub const MEANINGFUL_DISTANCE: f64 = 0.15;

const SUMMARY_EVENTS: usize = 3;
const SUMMARY_TITLE_CHARS: usize = 70;

pub const HIGH_SIGNAL_KEYWORDS: &[&str] = &[
    "port closure", "port closed", "port strike", "dock strike",
    "earthquake", "tsunami", "typhoon", "hurricane", "cyclone",
    "factory fire", "explosion", "factory shutdown", "plant shutdown",
    "sanctions", "export ban", "import ban", "trade blockade",
    "war", "military", "invasion", "blockade",
    "canal blocked", "suez", "panama canal",
    "power outage", "blackout", "energy crisis",
    "flood", "severe flooding", "landslide",
];

pub const MEDIUM_SIGNAL_KEYWORDS: &[&str] = &[
    "strike", "walkout", "protest", "labor dispute",
    "shortage", "supply shortage",
    "delay", "port delay", "shipping delay",
    "disruption", "supply disruption",
    "tariff", "trade war",
    "storm", "typhoon warning", "snowstorm", "blizzard",
];

/// Slow-resolving situations that keep mattering for weeks
pub const PERSISTENT_KEYWORDS: &[&str] = &[
    "war", "conflict", "invasion", "occupation", "sanctions", "embargo",
    "blockade", "trade war", "export ban", "import ban", "military",
    "armed conflict", "civil war", "coup", "trade restriction",
    "tariff", "levy", "duty hike", "trade barrier",
];

/// Forward-looking warning language
pub const FORECAST_SIGNALS: &[&str] = &[
    "warning issued", "watch issued", "alert issued", "advisory issued",
    "tropical storm warning", "typhoon warning", "hurricane warning",
    "cyclone warning", "flood warning", "storm surge warning",
    "forecast", "expected to hit", "predicted to", "projected to",
    "approaching", "will hit", "set to make landfall", "tracking toward",
    "heading toward", "moving toward", "on course for",
    "imminent", "impending", "expected to impose", "sanctions expected",
    "proposed tariff", "new sanctions", "planned sanctions",
    "threatened with", "considering sanctions", "mulling tariffs",
    "upcoming strike", "planned strike", "announced strike", "strike vote",
    "strike ballot", "walkout planned", "workers threatening",
    "union negotiation", "contract expiry", "labor talks",
    "scheduled closure", "planned maintenance", "port closure planned",
    "in the next", "over the coming", "within days", "within weeks",
    "risk of", "threat of", "danger of", "possibility of",
    "election risk", "political uncertainty ahead",
];

static SIGNAL_RULES: LazyLock<RuleSet<Severity>> = LazyLock::new(|| {
    RuleSet::new()
        .with_rule("high", Predicate::AnyKeyword(HIGH_SIGNAL_KEYWORDS), Severity::High)
        .with_rule("medium", Predicate::AnyKeyword(MEDIUM_SIGNAL_KEYWORDS), Severity::Medium)
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Contributions summed per supplier
    pub top_k: usize,
    /// Cap on a single event's points
    pub max_event_points: f64,
    /// Contributions at or below this are discarded
    pub min_event_points: f64,
    pub high_threshold: f64,
    pub medium_threshold: f64,
    /// Distance multiplier for an event located only at country level
    pub national_multiplier: f64,
    /// National multiplier boost for high-signal events
    pub high_signal_boost: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            top_k: TOP_K,
            max_event_points: MAX_EVENT_POINTS,
            min_event_points: 0.1,
            high_threshold: HIGH_RISK_THRESHOLD,
            medium_threshold: MEDIUM_RISK_THRESHOLD,
            national_multiplier: 0.6,
            high_signal_boost: 1.4,
        }
    }
}

/// Multiplier for a great-circle distance in miles
pub fn distance_multiplier(miles: f64) -> f64 {
    if miles <= 50.0 {
        1.0
    } else if miles <= 300.0 {
        0.6
    } else if miles <= 1000.0 {
        0.25
    } else if miles <= 3000.0 {
        0.08
    } else {
        0.02
    }
}

/// Severity tier from keywords: any high keyword wins, then medium, else low
pub fn classify_signal(title: &str, description: &str) -> Severity {
    let text = format!("{} {}", title, description).to_lowercase();
    SIGNAL_RULES.classify(&text, Severity::Low)
}

pub fn is_forecast(title: &str, description: &str) -> bool {
    let text = format!("{} {}", title, description).to_lowercase();
    contains_any(&text, FORECAST_SIGNALS)
}

/// Recency weight of an event at `now`; 0.0 means the event is excluded
pub fn time_multiplier(event: &Event, now: DateTime<Utc>) -> f64 {
    let text = event.full_text().to_lowercase();
    if contains_any(&text, FORECAST_SIGNALS) {
        return 2.0;
    }

    let Some(published) = event.published_at else {
        return 0.5;
    };

    let age_hours = (now - published).num_seconds() as f64 / 3600.0;
    if age_hours < 0.0 {
        // Scheduled / future-dated
        return 2.0;
    }

    let persistent = contains_any(&text, PERSISTENT_KEYWORDS);
    if age_hours <= 48.0 {
        1.0
    } else if age_hours <= 168.0 {
        if persistent {
            0.7
        } else {
            0.3
        }
    } else if age_hours <= 720.0 {
        if persistent {
            0.5
        } else {
            0.0
        }
    } else {
        0.0
    }
}

/// One event's contribution to one supplier's score, for the audit view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEventContribution {
    pub title: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Relative publish label ("Today", "3 days ago", "Ongoing")
    pub published: String,
    pub event_country: String,
    pub signal: Severity,
    pub proximity_label: String,
    pub miles: Option<f64>,
    pub distance_multiplier: f64,
    pub severity_multiplier: f64,
    pub time_multiplier: f64,
    pub points: f64,
    /// Among the top-K that make up the score
    pub counted: bool,
    /// 1-based position after sorting by points
    pub rank: usize,
    pub is_forecast: bool,
    pub is_seasonal: bool,
}

/// Per-supplier location context shared by every event
struct Origin<'a> {
    supplier: &'a Supplier,
    coordinates: Option<Coordinates>,
}

pub struct Scorer {
    config: ScorerConfig,
    cache: Option<Arc<GeocodeCache>>,
}

impl Scorer {
    /// `cache` extends event-location extraction beyond the static gazetteer
    pub fn new(config: ScorerConfig, cache: Option<Arc<GeocodeCache>>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn risk_level(&self, score: f64) -> RiskLevel {
        RiskLevel::classify(score, self.config.high_threshold, self.config.medium_threshold)
    }

    /// Supplier position: geocoded coordinates, else the gazetteer entry for its city
    fn origin<'a>(&self, supplier: &'a Supplier) -> Origin<'a> {
        let coordinates = supplier
            .coordinates()
            .filter(Coordinates::is_valid)
            .or_else(|| gazetteer::lookup(&supplier.city));
        Origin {
            supplier,
            coordinates,
        }
    }

    /// Every contributing event (seasonal windows for `month` included),
    /// sorted by points with the top-K marked `counted`.
    pub fn breakdown(
        &self,
        supplier: &Supplier,
        events: &[Event],
        now: DateTime<Utc>,
        month: u32,
    ) -> Vec<ScoredEventContribution> {
        let origin = self.origin(supplier);
        let seasonal = seasonal_signals(&supplier.country, &supplier.city, month, now);

        let mut rows: Vec<ScoredEventContribution> = seasonal
            .iter()
            .chain(events.iter())
            .filter_map(|event| self.contribution(&origin, event, now))
            .collect();

        rows.sort_by(|a, b| b.points.total_cmp(&a.points));
        for (i, row) in rows.iter_mut().enumerate() {
            row.counted = i < self.config.top_k;
            row.rank = i + 1;
        }
        rows
    }

    /// Normalised 0-100 score and a one-line summary
    pub fn score(&self, supplier: &Supplier, events: &[Event], now: DateTime<Utc>, month: u32) -> (f64, String) {
        let rows = self.breakdown(supplier, events, now, month);
        let score = self.normalise(&rows);
        let summary = summarise(&rows);

        debug!(
            supplier = %supplier.name,
            contributions = rows.len(),
            score,
            "Scored supplier"
        );

        (score, summary)
    }

    /// Score a supplier and write the result back onto it
    pub fn apply(&self, supplier: &mut Supplier, events: &[Event], now: DateTime<Utc>, month: u32) -> f64 {
        let (score, summary) = self.score(supplier, events, now, month);
        let level = self.risk_level(score);
        supplier.apply_score(score, level, summary);
        score
    }

    fn normalise(&self, rows: &[ScoredEventContribution]) -> f64 {
        let total: f64 = rows.iter().filter(|r| r.counted).map(|r| r.points).sum();
        let max_possible = self.config.top_k as f64 * self.config.max_event_points;
        if max_possible <= 0.0 {
            return 0.0;
        }
        let pct = (total / max_possible * 100.0 * 10.0).round() / 10.0;
        pct.min(100.0)
    }

    fn contribution(&self, origin: &Origin<'_>, event: &Event, now: DateTime<Utc>) -> Option<ScoredEventContribution> {
        let row = if event.is_seasonal() {
            self.seasonal_contribution(origin, event)
        } else {
            self.event_contribution(origin, event, now)?
        };
        (row.points > self.config.min_event_points).then_some(row)
    }

    fn seasonal_contribution(&self, origin: &Origin<'_>, event: &Event) -> ScoredEventContribution {
        let supplier = origin.supplier;
        let distance = event.seasonal_weight.unwrap_or(1.0);
        let severity = event.severity.multiplier();
        ScoredEventContribution {
            title: event.title.clone(),
            source: event.source.clone(),
            url: None,
            published: "Ongoing".to_string(),
            event_country: supplier.country.clone(),
            signal: event.severity,
            proximity_label: format!("Seasonal pattern — {}, {}", supplier.city, supplier.country),
            miles: None,
            distance_multiplier: distance,
            severity_multiplier: severity,
            time_multiplier: 1.0,
            points: self.cap(distance * severity),
            counted: false,
            rank: 0,
            is_forecast: true,
            is_seasonal: true,
        }
    }

    fn event_contribution(
        &self,
        origin: &Origin<'_>,
        event: &Event,
        now: DateTime<Utc>,
    ) -> Option<ScoredEventContribution> {
        let time = time_multiplier(event, now);
        if time == 0.0 {
            return None;
        }

        let supplier = origin.supplier;
        let signal = classify_signal(&event.title, &event.description);
        let event_country = event.detected_country.trim();
        let event_coords = gazetteer::extract_city_mentions(&event.full_text(), self.cache.as_deref());

        let (mut distance, proximity_label, miles) = match (event_coords, origin.coordinates) {
            (Some(at), Some(home)) => {
                let miles = home.distance_miles(&at);
                (distance_multiplier(miles), format!("{} miles away", miles.round() as i64), Some(miles.round()))
            }
            _ if same_country(event_country, &supplier.country) => (
                self.config.national_multiplier,
                format!("National impact — {}", supplier.country),
                None,
            ),
            _ if !is_vague(event_country) => {
                let same_continent = matches!(
                    (continent_of(event_country), continent_of(&supplier.country)),
                    (Some(a), Some(b)) if a == b
                );
                if same_continent {
                    (0.05, format!("Same continent ({})", event_country), None)
                } else {
                    (0.02, format!("Distant ({})", event_country), None)
                }
            }
            _ => (0.01, "Global/Unknown location".to_string(), None),
        };

        if proximity_label.starts_with("National impact") && signal == Severity::High {
            distance = (distance * self.config.high_signal_boost).min(1.0);
        }

        let severity = signal.multiplier();
        Some(ScoredEventContribution {
            title: event.title.clone(),
            source: event.source.clone(),
            url: event.url.clone(),
            published: relative_label(event.published_at, now),
            event_country: event_country.to_string(),
            signal,
            proximity_label,
            miles,
            distance_multiplier: distance,
            severity_multiplier: severity,
            time_multiplier: time,
            points: self.cap(distance * severity * time),
            counted: false,
            rank: 0,
            is_forecast: time > 1.0,
            is_seasonal: false,
        })
    }

    fn cap(&self, factor: f64) -> f64 {
        (self.config.max_event_points * factor).min(self.config.max_event_points)
    }
}

fn is_vague(country: &str) -> bool {
    country.is_empty() || country.eq_ignore_ascii_case(UNKNOWN_COUNTRY) || country.eq_ignore_ascii_case(GLOBAL_COUNTRY)
}

fn summarise(rows: &[ScoredEventContribution]) -> String {
    let counted: Vec<&ScoredEventContribution> = rows.iter().filter(|r| r.counted).collect();
    let meaningful: Vec<String> = counted
        .iter()
        .filter(|r| r.distance_multiplier >= MEANINGFUL_DISTANCE)
        .take(SUMMARY_EVENTS)
        .map(|r| {
            format!(
                "[{} · {}] {}",
                r.signal.as_str().to_uppercase(),
                r.proximity_label,
                truncate_chars(&r.title, SUMMARY_TITLE_CHARS)
            )
        })
        .collect();

    if !meaningful.is_empty() {
        meaningful.join("; ")
    } else if !counted.is_empty() {
        "No nearby events — global monitoring active".to_string()
    } else {
        "No significant disruption events detected.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    /// January: no seasonal window covers China
    const QUIET_MONTH: u32 = 1;

    fn now() -> DateTime<Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    fn make_scorer() -> Scorer {
        Scorer::new(ScorerConfig::default(), None)
    }

    fn make_supplier(city: &str, country: &str) -> Supplier {
        Supplier::new("Acme Components", "electronics", city, country, "1")
    }

    fn hours_ago(hours: i64) -> DateTime<Utc> {
        now() - Duration::hours(hours)
    }

    #[test]
    fn test_distance_tiers() {
        assert_eq!(distance_multiplier(0.0), 1.0);
        assert_eq!(distance_multiplier(50.0), 1.0);
        assert_eq!(distance_multiplier(50.1), 0.6);
        assert_eq!(distance_multiplier(300.0), 0.6);
        assert_eq!(distance_multiplier(999.0), 0.25);
        assert_eq!(distance_multiplier(2500.0), 0.08);
        assert_eq!(distance_multiplier(8000.0), 0.02);
    }

    #[test]
    fn test_classify_signal() {
        assert_eq!(classify_signal("Port strike shuts terminal", ""), Severity::High);
        assert_eq!(classify_signal("Truckers strike", "delays expected"), Severity::Medium);
        assert_eq!(classify_signal("Quarterly results", ""), Severity::Low);
    }

    #[test]
    fn test_shenzhen_port_strike() {
        let supplier = make_supplier("Shenzhen", "China");
        let event = Event::news("Port strike shuts Shenzhen terminal", "").published(hours_ago(12));

        let scorer = make_scorer();
        let rows = scorer.breakdown(&supplier, std::slice::from_ref(&event), now(), QUIET_MONTH);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].distance_multiplier, 1.0);
        assert_eq!(rows[0].severity_multiplier, 1.0);
        assert_eq!(rows[0].time_multiplier, 1.0);
        assert_eq!(rows[0].points, 25.0);
        assert_eq!(rows[0].miles, Some(0.0));

        let (score, summary) = scorer.score(&supplier, &[event], now(), QUIET_MONTH);
        assert_eq!(score, 20.0);
        assert_eq!(scorer.risk_level(score), RiskLevel::Low);
        assert_eq!(summary, "[HIGH · 0 miles away] Port strike shuts Shenzhen terminal");
    }

    #[test]
    fn test_no_events_is_zero() {
        let supplier = make_supplier("Shenzhen", "China");
        let (score, summary) = make_scorer().score(&supplier, &[], now(), QUIET_MONTH);
        assert_eq!(score, 0.0);
        assert_eq!(summary, "No significant disruption events detected.");
    }

    #[test]
    fn test_recency_cutoff() {
        let supplier = make_supplier("Shenzhen", "China");
        let stale = Event::news("Earthquake destroys Shenzhen port cranes", "").published(hours_ago(31 * 24));
        let stale_war = Event::news("War closes Shenzhen port", "").published(hours_ago(31 * 24));

        let (score, _) = make_scorer().score(&supplier, &[stale, stale_war], now(), QUIET_MONTH);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_recency_decay() {
        let fast = Event::news("Shenzhen port delay", "").published(hours_ago(72));
        let persistent = Event::news("Sanctions hit Shenzhen exporters", "").published(hours_ago(72));
        let sustained = Event::news("Sanctions hit Shenzhen exporters", "").published(hours_ago(240));
        let sustained_fast = Event::news("Shenzhen port delay", "").published(hours_ago(240));

        assert_eq!(time_multiplier(&fast, now()), 0.3);
        assert_eq!(time_multiplier(&persistent, now()), 0.7);
        assert_eq!(time_multiplier(&sustained, now()), 0.5);
        assert_eq!(time_multiplier(&sustained_fast, now()), 0.0);
    }

    #[test]
    fn test_forecast_overrides_age() {
        let supplier = make_supplier("Shenzhen", "China");
        let warning = Event::news("Typhoon warning issued for Shenzhen port", "").published(now());
        assert_eq!(time_multiplier(&warning, now()), 2.0);

        let rows = make_scorer().breakdown(&supplier, &[warning], now(), QUIET_MONTH);
        assert_eq!(rows[0].time_multiplier, 2.0);
        assert!(rows[0].is_forecast);
        assert_eq!(rows[0].points, 25.0);
    }

    #[test]
    fn test_undated_and_future_events() {
        let undated = Event::news("Shenzhen port delay", "");
        assert_eq!(time_multiplier(&undated, now()), 0.5);

        let scheduled = Event::news("Shenzhen port delay", "").published(now() + Duration::days(2));
        assert_eq!(time_multiplier(&scheduled, now()), 2.0);
    }

    #[test]
    fn test_national_impact_boost() {
        let supplier = make_supplier("", "Iran");
        let event = Event::news("US military strike on Iran would close shipping", "")
            .published(hours_ago(2))
            .in_country("Iran");

        let rows = make_scorer().breakdown(&supplier, &[event], now(), 5);
        let row = rows.iter().find(|r| !r.is_seasonal).unwrap();
        assert_eq!(row.proximity_label, "National impact — Iran");
        assert!((row.distance_multiplier - 0.84).abs() < 1e-9);
        assert!((row.points - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_country_fallbacks() {
        let supplier = make_supplier("Hamburg", "Germany");
        let events = vec![
            Event::news("Rail strike across France hits freight", "")
                .published(hours_ago(1))
                .in_country("France"),
            Event::news("Truckers strike over fuel", "")
                .published(hours_ago(1))
                .in_country("Brazil"),
            Event::news("Global container strike looms", "").published(hours_ago(1)),
        ];

        let scorer = make_scorer();
        let rows = scorer.breakdown(&supplier, &events, now(), 7);
        let labels: Vec<&str> = rows.iter().map(|r| r.proximity_label.as_str()).collect();
        assert_eq!(
            labels,
            ["Same continent (France)", "Distant (Brazil)", "Global/Unknown location"]
        );
        assert!((rows[0].points - 0.625).abs() < 1e-9);

        let (_, summary) = scorer.score(&supplier, &events, now(), 7);
        assert_eq!(summary, "No nearby events — global monitoring active");
    }

    #[test]
    fn test_seasonal_contribution() {
        let supplier = make_supplier("Manila", "Philippines");
        let rows = make_scorer().breakdown(&supplier, &[], now(), 8);

        let typhoon = &rows[0];
        assert!(typhoon.is_seasonal);
        assert_eq!(typhoon.proximity_label, "Seasonal pattern — Manila, Philippines");
        assert_eq!(typhoon.distance_multiplier, 0.7);
        assert!((typhoon.points - 17.5).abs() < 1e-9);
        assert_eq!(typhoon.published, "Ongoing");
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let supplier = make_supplier("Manila", "Philippines");
        let events: Vec<Event> = (0..8)
            .map(|i| Event::news(format!("Manila port strike day {}", i), "").published(hours_ago(i)))
            .collect();

        let scorer = make_scorer();
        let rows = scorer.breakdown(&supplier, &events, now(), 8);
        let counted: f64 = rows.iter().filter(|r| r.counted).map(|r| r.points).sum();
        let (score, _) = scorer.score(&supplier, &events, now(), 8);
        assert_eq!(score, ((counted / 125.0 * 100.0) * 10.0).round() / 10.0);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_apply_writes_back() {
        let mut supplier = make_supplier("Shenzhen", "China");
        let events: Vec<Event> = (0..4)
            .map(|i| Event::news(format!("Port strike shuts Shenzhen terminal {}", i), "").published(hours_ago(1)))
            .collect();

        let score = make_scorer().apply(&mut supplier, &events, now(), QUIET_MONTH);
        assert_eq!(score, 80.0);
        assert_eq!(supplier.risk_score, 80.0);
        assert_eq!(supplier.risk_level, RiskLevel::High);
        assert_eq!(supplier.event_summary.matches("[HIGH").count(), 3);
    }

    #[test]
    fn test_geocoded_supplier_overrides_gazetteer() {
        // Supplier actually located in Hong Kong despite "Shenzhen" city field
        let supplier = make_supplier("Shenzhen", "China").with_coordinates(22.3193, 114.1694);
        let event = Event::news("Port strike shuts Shenzhen terminal", "").published(hours_ago(1));
        let rows = make_scorer().breakdown(&supplier, &[event], now(), QUIET_MONTH);
        assert_eq!(rows[0].distance_multiplier, 1.0);
        assert!(rows[0].miles.unwrap() > 5.0);
    }

    proptest! {
        #[test]
        fn prop_distance_multiplier_monotonic(a in 0.0f64..10_000.0, b in 0.0f64..10_000.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(distance_multiplier(near) >= distance_multiplier(far));
        }

        #[test]
        fn prop_closer_supplier_scores_higher(offset_a in 0.0f64..40.0, offset_b in 0.0f64..40.0) {
            let (near, far) = if offset_a <= offset_b { (offset_a, offset_b) } else { (offset_b, offset_a) };
            let event = Event::news("Port strike shuts Shenzhen terminal", "").published(hours_ago(1));
            let scorer = make_scorer();

            let near_supplier = make_supplier("", "Atlantis").with_coordinates(22.5431 + near, 114.0579);
            let far_supplier = make_supplier("", "Atlantis").with_coordinates(22.5431 + far, 114.0579);

            let (near_score, _) = scorer.score(&near_supplier, std::slice::from_ref(&event), now(), QUIET_MONTH);
            let (far_score, _) = scorer.score(&far_supplier, std::slice::from_ref(&event), now(), QUIET_MONTH);
            prop_assert!(near_score >= far_score);
        }

        #[test]
        fn prop_top_k_cap(count in 6usize..25, hours in proptest::collection::vec(0i64..48, 25)) {
            let supplier = make_supplier("Busan", "South Korea");
            let events: Vec<Event> = (0..count)
                .map(|i| Event::news(format!("Busan port delay {}", i), "").published(hours_ago(hours[i])))
                .collect();

            let scorer = make_scorer();
            let rows = scorer.breakdown(&supplier, &events, now(), QUIET_MONTH);
            prop_assert!(rows.len() >= count);
            prop_assert_eq!(rows.iter().filter(|r| r.counted).count(), 5);
            let (score, _) = scorer.score(&supplier, &events, now(), QUIET_MONTH);
            prop_assert!(score <= 100.0);
        }

        #[test]
        fn prop_scoring_is_idempotent(hours in proptest::collection::vec(0i64..800, 1..12)) {
            let supplier = make_supplier("Rotterdam", "Netherlands");
            let events: Vec<Event> = hours
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    Event::news(format!("Rotterdam port strike {}", i), "sanctions feared")
                        .published(hours_ago(*h))
                        .in_country("Netherlands")
                })
                .collect();

            let scorer = make_scorer();
            let first = scorer.score(&supplier, &events, now(), 3);
            let second = scorer.score(&supplier, &events, now(), 3);
            prop_assert_eq!(first, second);
            prop_assert_eq!(
                scorer.breakdown(&supplier, &events, now(), 3),
                scorer.breakdown(&supplier, &events, now(), 3)
            );
        }
    }
}
