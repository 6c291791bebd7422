//! Feed collection
//!
//! Every feed is an [`EventSource`]. [`collect_all`] fans out over the
//! sources with bounded concurrency and a wall-clock deadline; sources still
//! pending at the deadline are abandoned and the run keeps what arrived.

use crate::config::CollectorConfig;
use crate::filter::RawArticle;
use crate::loader::parse_articles;
use crate::regions::{canonical_country, country_info};
use crate::text::{normalize, truncate_chars};
use crate::{EventType, Result, Supplier};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const MAX_TITLE_CHARS: usize = 500;

/// A pluggable feed of raw articles
#[async_trait]
pub trait EventSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_events(&self) -> Result<Vec<RawArticle>>;
}

/// Outcome counters for one collection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub sources: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sources abandoned at the deadline
    pub timed_out: usize,
    pub articles: usize,
    /// Articles dropped because an identical title was already collected
    pub duplicates: usize,
}

/// Fetch from every source, at most `max_concurrency` at a time.
///
/// Failing sources are logged and skipped. Articles with a title seen
/// earlier in the run are dropped.
pub async fn collect_all(
    sources: Vec<Arc<dyn EventSource>>,
    max_concurrency: usize,
    deadline: Duration,
) -> (Vec<RawArticle>, CollectionStats) {
    let mut stats = CollectionStats {
        sources: sources.len(),
        ..CollectionStats::default()
    };
    let deadline_at = Instant::now() + deadline;

    let mut pending: BoxStream<'static, (Arc<dyn EventSource>, Result<Vec<RawArticle>>)> =
        stream::iter(sources)
            .map(|source| async move {
                let result = source.fetch_events().await;
                (source, result)
            })
            .buffer_unordered(max_concurrency.max(1))
            .boxed();

    let mut articles = Vec::new();
    let mut seen_titles = HashSet::new();

    loop {
        match tokio::time::timeout_at(deadline_at, pending.next()).await {
            Ok(Some((source, Ok(fetched)))) => {
                debug!("{} returned {} articles", source.name(), fetched.len());
                stats.succeeded += 1;
                for article in fetched {
                    if seen_titles.insert(normalize(&article.title)) {
                        articles.push(article);
                    } else {
                        stats.duplicates += 1;
                    }
                }
            }
            Ok(Some((source, Err(e)))) => {
                warn!("Source {} failed: {}", source.name(), e);
                stats.failed += 1;
            }
            Ok(None) => break,
            Err(_) => {
                stats.timed_out = stats.sources - stats.succeeded - stats.failed;
                warn!(
                    "Collection deadline of {:?} reached, abandoning {} source(s)",
                    deadline, stats.timed_out
                );
                break;
            }
        }
    }

    stats.articles = articles.len();
    info!(
        sources = stats.sources,
        succeeded = stats.succeeded,
        failed = stats.failed,
        timed_out = stats.timed_out,
        articles = stats.articles,
        "Collection complete"
    );
    (articles, stats)
}

/// [`collect_all`] with limits taken from configuration
pub async fn collect_with_config(
    sources: Vec<Arc<dyn EventSource>>,
    config: &CollectorConfig,
) -> (Vec<RawArticle>, CollectionStats) {
    let deadline = Duration::from_secs(config.deadline_sec);
    collect_all(sources, config.max_concurrency, deadline).await
}

/// Articles held in memory
pub struct StaticSource {
    name: String,
    articles: Vec<RawArticle>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, articles: Vec<RawArticle>) -> Self {
        Self {
            name: name.into(),
            articles,
        }
    }
}

#[async_trait]
impl EventSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_events(&self) -> Result<Vec<RawArticle>> {
        Ok(self.articles.clone())
    }
}

/// Articles read from a JSON file on every fetch
pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
        }
    }
}

#[async_trait]
impl EventSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_events(&self) -> Result<Vec<RawArticle>> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        parse_articles(&json)
    }
}

#[derive(Debug, Deserialize)]
struct GdeltResponse {
    #[serde(default)]
    articles: Vec<GdeltArticle>,
}

#[derive(Debug, Deserialize)]
struct GdeltArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    seendate: Option<String>,
    #[serde(default)]
    sourcecountry: Option<String>,
}

/// One GDELT DOC 2.0 article-list query, last 24 hours
pub struct GdeltSource {
    name: String,
    client: reqwest::Client,
    base_url: String,
    query: String,
    /// Country the query targets; used when GDELT reports none
    country: String,
    max_records: u32,
}

impl GdeltSource {
    pub fn new(
        client: reqwest::Client,
        config: &CollectorConfig,
        query: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        let query = query.into();
        Self {
            name: format!("gdelt:{}", query.split(' ').next().unwrap_or_default()),
            client,
            base_url: config.gdelt_base_url.clone(),
            query,
            country: country.into(),
            max_records: config.gdelt_max_records,
        }
    }

    /// HTTP client with the collector's request timeout
    pub fn client(config: &CollectorConfig) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .user_agent(concat!("supply-risk/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    /// A city query and a country query for every distinct supplier country
    pub fn for_suppliers(suppliers: &[Supplier], config: &CollectorConfig) -> Result<Vec<Self>> {
        let client = Self::client(config)?;
        let mut seen = HashSet::new();
        let mut sources = Vec::new();

        for supplier in suppliers {
            let country = supplier.country.trim();
            if country.is_empty() || !seen.insert(canonical_country(country)) {
                continue;
            }
            let city = supplier.city.trim();
            if !city.is_empty() {
                sources.push(Self::new(client.clone(), config, city_query(city), country));
            }
            sources.push(Self::new(client.clone(), config, country_query(country), country));
        }

        info!("Prepared {} GDELT queries for {} countries", sources.len(), seen.len());
        Ok(sources)
    }

    fn to_article(&self, art: GdeltArticle) -> Option<RawArticle> {
        let title = art.title.trim();
        if title.is_empty() {
            return None;
        }
        let domain = art.domain.filter(|d| !d.is_empty()).unwrap_or_else(|| "GDELT".to_string());
        let country = art
            .sourcecountry
            .filter(|c| country_info(c).is_some())
            .map(|c| canonical_country(&c))
            .unwrap_or_else(|| self.country.clone());

        Some(RawArticle {
            title: truncate_chars(title, MAX_TITLE_CHARS).to_string(),
            description: format!("Via {}", domain),
            source: format!("GDELT/{}", domain),
            url: art.url,
            published: art.seendate,
            country,
            event_type: EventType::News,
        })
    }
}

fn city_query(city: &str) -> String {
    format!("{city} port OR shipping OR factory OR supply chain OR strike OR flood OR earthquake OR war OR sanction")
}

fn country_query(country: &str) -> String {
    format!("{country} port OR export OR shipping OR factory OR supply chain OR strike OR disruption OR conflict OR sanction OR flood")
}

#[async_trait]
impl EventSource for GdeltSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_events(&self) -> Result<Vec<RawArticle>> {
        let max_records = self.max_records.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", self.query.as_str()),
                ("mode", "artlist"),
                ("maxrecords", max_records.as_str()),
                ("sort", "DateDesc"),
                ("format", "json"),
                ("timespan", "1440"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: GdeltResponse = response.json().await?;
        Ok(body
            .articles
            .into_iter()
            .filter_map(|art| self.to_article(art))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct SlowSource;

    #[async_trait]
    impl EventSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch_events(&self) -> Result<Vec<RawArticle>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![RawArticle::new("Too late", "")])
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_events(&self) -> Result<Vec<RawArticle>> {
            Err(EngineError::Store("feed unavailable".to_string()))
        }
    }

    fn make_static(name: &str, titles: &[&str]) -> Arc<dyn EventSource> {
        Arc::new(StaticSource::new(
            name,
            titles.iter().map(|t| RawArticle::new(*t, "")).collect(),
        ))
    }

    #[tokio::test]
    async fn test_collect_merges_and_dedupes() {
        let sources = vec![
            make_static("a", &["Port strike in Busan", "Flood closes factory"]),
            make_static("b", &["port strike in busan ", "Typhoon nears Manila port"]),
            Arc::new(FailingSource) as Arc<dyn EventSource>,
        ];

        let (articles, stats) = collect_all(sources, 2, Duration::from_secs(5)).await;
        assert_eq!(articles.len(), 3);
        assert_eq!(stats.sources, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.timed_out, 0);
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_sources() {
        let sources = vec![
            Arc::new(SlowSource) as Arc<dyn EventSource>,
            make_static("fast", &["Rail strike halts freight"]),
        ];

        let started = std::time::Instant::now();
        let (articles, stats) = collect_all(sources, 4, Duration::from_millis(200)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(articles.len(), 1);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.timed_out, 1);
    }

    #[tokio::test]
    async fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"title": "Port congestion worsens", "country": "Singapore"}]"#)
            .unwrap();

        let source = FileSource::new(file.path());
        let articles = source.fetch_events().await.unwrap();
        assert_eq!(articles[0].country, "Singapore");
        assert!(source.name().starts_with("file:"));
    }

    #[test]
    fn test_gdelt_queries_per_country() {
        let suppliers = vec![
            Supplier::new("A", "Electronics", "Shenzhen", "China", "1"),
            Supplier::new("B", "Electronics", "Dongguan", "china", "2"),
            Supplier::new("C", "Apparel", "", "Bangladesh", "2"),
            Supplier::new("D", "Apparel", "Dhaka", " ", "2"),
        ];
        let sources = GdeltSource::for_suppliers(&suppliers, &CollectorConfig::default()).unwrap();
        let queries: Vec<&str> = sources.iter().map(|s| s.query.as_str()).collect();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].starts_with("Shenzhen port OR shipping"));
        assert!(queries[1].starts_with("China port OR export"));
        assert!(queries[2].starts_with("Bangladesh port OR export"));
    }

    #[test]
    fn test_gdelt_article_mapping() {
        let source = GdeltSource::new(
            reqwest::Client::new(),
            &CollectorConfig::default(),
            country_query("Vietnam"),
            "Vietnam",
        );
        let body: GdeltResponse = serde_json::from_str(
            r#"{"articles": [
                {"title": "Haiphong port delays", "url": "https://example.com/a", "domain": "example.com", "seendate": "20260110T120000Z", "sourcecountry": "Atlantis"},
                {"title": "Korean shipyard strike", "domain": "", "sourcecountry": "South Korea"},
                {"title": ""}
            ]}"#,
        )
        .unwrap();

        let articles: Vec<RawArticle> = body.articles.into_iter().filter_map(|a| source.to_article(a)).collect();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].country, "Vietnam");
        assert_eq!(articles[0].source, "GDELT/example.com");
        assert_eq!(articles[0].description, "Via example.com");
        assert_eq!(articles[0].published.as_deref(), Some("20260110T120000Z"));
        assert_eq!(articles[1].country, "South Korea");
        assert_eq!(articles[1].source, "GDELT/GDELT");
    }
}
