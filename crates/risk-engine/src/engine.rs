//! Risk engine facade
//!
//! Ties the store, geocoder, relevance filter and scorer together behind
//! the entry points the CLI and the gateway use:
//! upload, refresh, recompute, breakdown and alternatives.

use crate::alternatives::{find_alternatives, AlternativesReport};
use crate::collector::{collect_with_config, CollectionStats, EventSource, GdeltSource};
use crate::config::EngineConfig;
use crate::countdown::{countdown_to_score_boost, detect_countdown, CountdownEvent};
use crate::dates::is_expired;
use crate::filter::{FilterStats, RelevanceFilter};
use crate::geocoder::{GeocodeCache, GeocodeProvider, Geocoder, NominatimProvider, RateLimiter};
use crate::loader::parse_suppliers;
use crate::oracle::{CallBudget, OpenAiOracle};
use crate::predictions::{predict, PredictionReport};
use crate::recommendations::{recommend, RecommendationReport};
use crate::regions::{detect_country, same_country};
use crate::scorer::{ScoredEventContribution, Scorer};
use crate::store::{JsonFileStore, MemoryStore, RiskStore};
use crate::{EngineError, Event, Result, RiskLevel, Supplier, UNKNOWN_COUNTRY};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub suppliers: usize,
    /// Suppliers that have coordinates after cache warming
    pub geocoded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub collection: CollectionStats,
    pub filter: FilterStats,
    /// Approved events dropped for being older than the retention window
    pub expired: usize,
    pub stored: usize,
}

/// Score audit for one supplier
#[derive(Debug, Clone, Serialize)]
pub struct SupplierBreakdown {
    pub supplier: String,
    pub score: f64,
    pub level: RiskLevel,
    pub summary: String,
    pub contributions: Vec<ScoredEventContribution>,
}

/// A live deadline found in the stored events
#[derive(Debug, Clone, Serialize)]
pub struct CountdownAlert {
    pub event_country: String,
    pub boost: f64,
    #[serde(flatten)]
    pub countdown: CountdownEvent,
}

impl CountdownAlert {
    /// The deadline concerns `country`, either by its region map or by where
    /// the article was located
    pub fn affects(&self, country: &str) -> bool {
        same_country(&self.event_country, country)
            || self
                .countdown
                .affected_regions
                .iter()
                .any(|region| same_country(region, country))
    }
}

pub struct RiskEngine {
    config: EngineConfig,
    store: Arc<dyn RiskStore>,
    geocoder: Geocoder,
    filter: RelevanceFilter,
    scorer: Scorer,
}

impl RiskEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RiskStore>,
        geocoder: Geocoder,
        filter: RelevanceFilter,
    ) -> Self {
        let scorer = Scorer::new(config.scorer.clone(), Some(geocoder.cache().clone()));
        Self {
            config,
            store,
            geocoder,
            filter,
            scorer,
        }
    }

    /// Engine backed by JSON files under `config.data_dir`.
    ///
    /// Geocoding goes to Nominatim unless disabled; the semantic filter layer
    /// runs only when an oracle is configured.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let store: Arc<dyn RiskStore> = Arc::new(JsonFileStore::new(
            config.suppliers_path(),
            config.events_path(),
        ));

        let cache = Arc::new(GeocodeCache::open(config.geocode_cache_path())?);
        let geocoder = if config.geocoder.enabled {
            let provider: Arc<dyn GeocodeProvider> = Arc::new(NominatimProvider::new(&config.geocoder)?);
            let limiter = Arc::new(RateLimiter::new(Duration::from_millis(config.geocoder.min_interval_ms)));
            Geocoder::new(cache, Some(provider), limiter)
        } else {
            Geocoder::offline(cache)
        };

        let mut filter = RelevanceFilter::new(config.filter.clone());
        if let Some(oracle_config) = &config.oracle {
            let oracle = Arc::new(OpenAiOracle::new(oracle_config)?);
            let budget = Arc::new(CallBudget::new(oracle_config.daily_budget));
            filter = filter.with_oracle(oracle, budget, Duration::from_secs(oracle_config.timeout_sec));
            info!(model = %oracle_config.model, budget = oracle_config.daily_budget, "Semantic filter enabled");
        } else {
            info!("No oracle configured, relevance filter runs keyword layers only");
        }

        Ok(Self::new(config, store, geocoder, filter))
    }

    /// Engine with an in-memory store, in-memory cache and no network
    pub fn in_memory(config: EngineConfig) -> Self {
        let filter = RelevanceFilter::new(config.filter.clone());
        let geocoder = Geocoder::offline(Arc::new(GeocodeCache::in_memory()));
        Self::new(config, Arc::new(MemoryStore::new()), geocoder, filter)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    /// Replace the supplier set, geocoding every city first
    pub async fn upload_suppliers(&self, mut suppliers: Vec<Supplier>) -> Result<UploadReport> {
        self.geocoder.warm(&mut suppliers).await;
        let geocoded = suppliers.iter().filter(|s| s.coordinates().is_some()).count();

        self.store.replace_suppliers(&suppliers).await?;
        info!(suppliers = suppliers.len(), geocoded, "Supplier set replaced");

        Ok(UploadReport {
            suppliers: suppliers.len(),
            geocoded,
        })
    }

    /// Validate a JSON upload and replace the supplier set
    pub async fn upload_json(&self, json: &str) -> Result<UploadReport> {
        self.upload_suppliers(parse_suppliers(json)?).await
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        self.store.load_suppliers().await
    }

    pub async fn events(&self) -> Result<Vec<Event>> {
        self.store.load_events().await
    }

    /// GDELT queries for the stored supplier set
    pub async fn default_sources(&self) -> Result<Vec<Arc<dyn EventSource>>> {
        let suppliers = self.store.load_suppliers().await?;
        Ok(GdeltSource::for_suppliers(&suppliers, &self.config.collector)?
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn EventSource>)
            .collect())
    }

    pub async fn refresh_events(&self, sources: Vec<Arc<dyn EventSource>>) -> Result<RefreshReport> {
        self.refresh_events_at(sources, Utc::now()).await
    }

    /// Collect, locate, filter, apply retention, then replace stored events
    pub async fn refresh_events_at(
        &self,
        sources: Vec<Arc<dyn EventSource>>,
        now: DateTime<Utc>,
    ) -> Result<RefreshReport> {
        let (mut articles, collection) = collect_with_config(sources, &self.config.collector).await;

        for article in articles.iter_mut().filter(|a| a.has_vague_country()) {
            let detected = detect_country(&format!("{} {}", article.title, article.description));
            if detected != UNKNOWN_COUNTRY {
                article.country = detected;
            }
        }

        let (approved, filter) = self.filter.filter_batch(articles).await;

        let approved_count = approved.len();
        let events: Vec<Event> = approved
            .into_iter()
            .map(|a| a.into_event())
            .filter(|e| !is_expired(e.published_at, now, self.config.retention_days))
            .collect();
        let expired = approved_count - events.len();

        self.store.store_events(&events).await?;
        info!(stored = events.len(), expired, "Events refreshed");

        Ok(RefreshReport {
            collection,
            filter,
            expired,
            stored: events.len(),
        })
    }

    pub async fn recompute_all(&self) -> Result<Vec<Supplier>> {
        self.recompute_all_at(Utc::now()).await
    }

    /// Score every supplier against the stored events and persist the scores
    pub async fn recompute_all_at(&self, now: DateTime<Utc>) -> Result<Vec<Supplier>> {
        let mut suppliers = self.store.load_suppliers().await?;
        let events = self.store.load_events().await?;
        let month = now.month();

        for supplier in suppliers.iter_mut() {
            self.scorer.apply(supplier, &events, now, month);
        }
        self.store.store_supplier_scores(&suppliers).await?;

        let high = suppliers.iter().filter(|s| s.risk_level == RiskLevel::High).count();
        let medium = suppliers.iter().filter(|s| s.risk_level == RiskLevel::Medium).count();
        info!(
            suppliers = suppliers.len(),
            events = events.len(),
            high,
            medium,
            "Recomputed supplier scores"
        );
        Ok(suppliers)
    }

    pub async fn breakdown(&self, name: &str) -> Result<SupplierBreakdown> {
        self.breakdown_at(name, Utc::now()).await
    }

    /// Score audit for one supplier; read-only
    pub async fn breakdown_at(&self, name: &str, now: DateTime<Utc>) -> Result<SupplierBreakdown> {
        let (_, breakdown) = self.supplier_breakdown(name, now).await?;
        Ok(breakdown)
    }

    pub async fn recommendations_for(&self, name: &str) -> Result<RecommendationReport> {
        self.recommendations_for_at(name, Utc::now()).await
    }

    /// Rule-based response plan driven by the supplier's breakdown
    pub async fn recommendations_for_at(&self, name: &str, now: DateTime<Utc>) -> Result<RecommendationReport> {
        let (supplier, breakdown) = self.supplier_breakdown(name, now).await?;
        let report = recommend(&supplier, &breakdown);
        debug!(supplier = %supplier.name, urgency = %report.urgency, actions = report.actions.len(), "Recommendations built");
        Ok(report)
    }

    pub async fn predictions_for(&self, name: &str) -> Result<PredictionReport> {
        self.predictions_for_at(name, Utc::now()).await
    }

    /// 72h / 7d / 30d outlook; the calendar month of `now` drives seasonality
    pub async fn predictions_for_at(&self, name: &str, now: DateTime<Utc>) -> Result<PredictionReport> {
        let (supplier, breakdown) = self.supplier_breakdown(name, now).await?;
        let report = predict(&supplier, &breakdown, now.month());
        debug!(supplier = %supplier.name, seasonal = %report.seasonal_context, "Predictions built");
        Ok(report)
    }

    async fn supplier_breakdown(&self, name: &str, now: DateTime<Utc>) -> Result<(Supplier, SupplierBreakdown)> {
        let supplier = self.find_supplier(name).await?;
        let events = self.store.load_events().await?;

        let contributions = self.scorer.breakdown(&supplier, &events, now, now.month());
        let (score, summary) = self.scorer.score(&supplier, &events, now, now.month());

        let breakdown = SupplierBreakdown {
            supplier: supplier.name.clone(),
            score,
            level: self.scorer.risk_level(score),
            summary,
            contributions,
        };
        Ok((supplier, breakdown))
    }

    pub async fn alternatives_for(&self, name: &str) -> Result<AlternativesReport> {
        self.alternatives_for_at(name, Utc::now()).await
    }

    /// Sourcing options for a supplier, urgency taken from the most pressing
    /// deadline that concerns its country
    pub async fn alternatives_for_at(&self, name: &str, now: DateTime<Utc>) -> Result<AlternativesReport> {
        let suppliers = self.store.load_suppliers().await?;
        let at_risk = suppliers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::SupplierNotFound(name.to_string()))?;

        let alerts = self.countdowns_at(now).await?;
        let countdown = alerts
            .iter()
            .find(|a| a.affects(&at_risk.country))
            .map(|a| &a.countdown);

        let reason = if at_risk.event_summary.is_empty() {
            format!("{} risk score {:.1}", at_risk.risk_level, at_risk.risk_score)
        } else {
            at_risk.event_summary.clone()
        };

        Ok(find_alternatives(at_risk, &suppliers, &reason, countdown))
    }

    pub async fn countdowns(&self) -> Result<Vec<CountdownAlert>> {
        self.countdowns_at(Utc::now()).await
    }

    /// Deadlines in stored events, most urgent first.
    ///
    /// Deadlines long past (no score boost left) are left out.
    pub async fn countdowns_at(&self, now: DateTime<Utc>) -> Result<Vec<CountdownAlert>> {
        let events = self.store.load_events().await?;

        let mut alerts: Vec<CountdownAlert> = events
            .iter()
            .filter_map(|e| {
                let countdown = detect_countdown(&e.title, &e.description, e.published_at, now)?;
                let boost = countdown_to_score_boost(&countdown);
                (boost > 0.0).then(|| CountdownAlert {
                    event_country: e.detected_country.clone(),
                    boost,
                    countdown,
                })
            })
            .collect();

        alerts.sort_by(|a, b| {
            a.countdown
                .days_remaining
                .cmp(&b.countdown.days_remaining)
                .then(b.boost.total_cmp(&a.boost))
        });
        debug!(events = events.len(), countdowns = alerts.len(), "Scanned events for deadlines");
        Ok(alerts)
    }

    async fn find_supplier(&self, name: &str) -> Result<Supplier> {
        self.store
            .load_suppliers()
            .await?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::SupplierNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alternatives::Urgency;
    use crate::collector::StaticSource;
    use crate::filter::RawArticle;
    use chrono::Duration as ChronoDuration;

    fn make_now() -> DateTime<Utc> {
        "2026-08-15T12:00:00Z".parse().unwrap()
    }

    fn make_article(title: &str, country: &str, published: DateTime<Utc>) -> RawArticle {
        let mut article = RawArticle::new(title, "");
        article.country = country.to_string();
        article.published = Some(published.to_rfc3339());
        article
    }

    async fn make_engine() -> RiskEngine {
        let engine = RiskEngine::in_memory(EngineConfig::default());
        engine
            .upload_suppliers(vec![
                Supplier::new("Acme Electronics", "Electronics", "Shenzhen", "China", "1"),
                Supplier::new("Euro Components", "Electronics", "Munich", "Germany", "2"),
                Supplier::new("Pacific Metals", "Raw Materials", "Tokyo", "Japan", "1"),
            ])
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_upload_rejects_duplicates() {
        let engine = RiskEngine::in_memory(EngineConfig::default());
        let err = engine
            .upload_json(r#"[{"name": "A", "country": "China"}, {"name": "A", "country": "Japan"}]"#)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSupplier(_)));
        assert!(engine.list_suppliers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_filters_and_applies_retention() {
        let engine = make_engine().await;
        let now = make_now();
        let source = StaticSource::new(
            "fixture",
            vec![
                make_article("Port strike shuts Shenzhen terminal", "Unknown", now - ChronoDuration::hours(12)),
                make_article("Celebrity wedding draws crowds", "Unknown", now),
                make_article("Factory fire halts production in Munich", "Germany", now - ChronoDuration::days(40)),
            ],
        );

        let report = engine
            .refresh_events_at(vec![Arc::new(source)], now)
            .await
            .unwrap();
        assert_eq!(report.collection.succeeded, 1);
        assert_eq!(report.filter.total, 3);
        assert_eq!(report.filter.rejected_l1, 1);
        assert_eq!(report.expired, 1);
        assert_eq!(report.stored, 1);

        let events = engine.events().await.unwrap();
        assert_eq!(events[0].detected_country, "China");
    }

    #[tokio::test]
    async fn test_recompute_and_breakdown_agree() {
        let engine = make_engine().await;
        let now = make_now();
        let source = StaticSource::new(
            "fixture",
            vec![make_article("Port strike shuts Shenzhen terminal", "China", now - ChronoDuration::hours(12))],
        );
        engine.refresh_events_at(vec![Arc::new(source)], now).await.unwrap();

        let scored = engine.recompute_all_at(now).await.unwrap();
        let acme = scored.iter().find(|s| s.name == "Acme Electronics").unwrap();
        assert!(acme.risk_score > 0.0);

        let stored = engine.list_suppliers().await.unwrap();
        assert_eq!(stored[0].risk_score, acme.risk_score);

        let breakdown = engine.breakdown_at("Acme Electronics", now).await.unwrap();
        assert_eq!(breakdown.score, acme.risk_score);
        assert_eq!(breakdown.level, acme.risk_level);
        let counted: f64 = breakdown.contributions.iter().filter(|c| c.counted).map(|c| c.points).sum();
        assert!((counted / 125.0 * 100.0 - breakdown.score).abs() < 0.1);

        // Idempotent
        let again = engine.recompute_all_at(now).await.unwrap();
        assert_eq!(again, scored);
    }

    #[tokio::test]
    async fn test_unknown_supplier() {
        let engine = make_engine().await;
        assert!(matches!(
            engine.breakdown("Nobody").await.unwrap_err(),
            EngineError::SupplierNotFound(_)
        ));
        assert!(matches!(
            engine.alternatives_for("Nobody").await.unwrap_err(),
            EngineError::SupplierNotFound(_)
        ));
        assert!(matches!(
            engine.recommendations_for("Nobody").await.unwrap_err(),
            EngineError::SupplierNotFound(_)
        ));
        assert!(matches!(
            engine.predictions_for("Nobody").await.unwrap_err(),
            EngineError::SupplierNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_recommendations_and_predictions_follow_breakdown() {
        use crate::predictions::Trajectory;
        use crate::recommendations::{ActionCategory, ResponseUrgency};
        use crate::DisruptionType;

        let engine = make_engine().await;
        let now = make_now();
        let source = StaticSource::new(
            "fixture",
            vec![make_article("Port strike shuts Shenzhen terminal", "China", now - ChronoDuration::hours(12))],
        );
        engine.refresh_events_at(vec![Arc::new(source)], now).await.unwrap();
        let breakdown = engine.breakdown_at("Acme Electronics", now).await.unwrap();

        let plan = engine.recommendations_for_at("Acme Electronics", now).await.unwrap();
        assert_eq!(plan.risk_score, breakdown.score);
        assert_eq!(plan.urgency, ResponseUrgency::from_score(breakdown.score));
        assert_eq!(plan.disruption_types, vec![DisruptionType::LaborStrike]);
        assert_eq!(plan.actions[0].action, "Confirm Strike Scope with Supplier");
        assert_eq!(plan.actions.last().unwrap().category, ActionCategory::Monitor);

        // August is typhoon season for Shenzhen
        let outlook = engine.predictions_for_at("Acme Electronics", now).await.unwrap();
        assert!(outlook.seasonal_context.starts_with("Currently in peak risk season"));
        assert_eq!(outlook.horizons.len(), 3);
        assert_eq!(outlook.horizons[2].trajectory, Trajectory::Elevated);
        assert_ne!(outlook.data_sources, vec!["No events matched".to_string()]);

        // No events near Munich
        let quiet = engine.predictions_for_at("Euro Components", now).await.unwrap();
        assert_eq!(quiet.horizons[0].trajectory, Trajectory::Stable);
    }

    #[tokio::test]
    async fn test_alternatives_use_country_countdown() {
        let engine = make_engine().await;
        let now = make_now();
        let source = StaticSource::new(
            "fixture",
            vec![make_article(
                "China will decide within 5 days on rare earth export ban affecting factory supply",
                "China",
                now - ChronoDuration::days(3),
            )],
        );
        let report = engine.refresh_events_at(vec![Arc::new(source)], now).await.unwrap();
        assert_eq!(report.stored, 1);

        let alerts = engine.countdowns_at(now).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].countdown.days_remaining, 2);
        assert!(alerts[0].affects("China"));

        let report = engine.alternatives_for_at("Acme Electronics", now).await.unwrap();
        assert_eq!(report.urgency, Urgency::Immediate);
        assert_eq!(report.internal_alternatives[0].name, "Euro Components");

        let report = engine.alternatives_for_at("Pacific Metals", now).await.unwrap();
        assert_eq!(report.urgency, Urgency::ThisWeek);
        assert!(report.countdown.is_none());
    }
}
