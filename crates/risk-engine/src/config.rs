//! Engine configuration
//!
//! Every section has working defaults. [`EngineConfig::from_env`] overlays
//! environment variables; absent or unparsable values keep the default.

use crate::scorer::ScorerConfig;
use crate::RETENTION_DAYS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Relevance filter thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Oracle confidence required to accept an article (0-100)
    pub min_oracle_confidence: u8,
    /// Confidence given to articles passed through after an oracle failure
    pub degraded_confidence: u8,
    /// Confidence given to articles when no oracle is configured
    pub no_oracle_confidence: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_oracle_confidence: 70,
            degraded_confidence: 50,
            no_oracle_confidence: 60,
        }
    }
}

/// OpenAI-compatible semantic oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Per-call timeout in seconds
    pub timeout_sec: u64,
    /// Maximum oracle calls per UTC day
    pub daily_budget: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_sec: 15,
            daily_budget: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Call the external service on cache misses
    pub enabled: bool,
    /// Cache file; defaults to `<data_dir>/geocode_cache.json`
    pub cache_path: Option<PathBuf>,
    pub base_url: String,
    pub user_agent: String,
    /// Minimum spacing between external requests, process-wide
    pub min_interval_ms: u64,
    pub timeout_sec: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_path: None,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("supply-risk/", env!("CARGO_PKG_VERSION")).to_string(),
            min_interval_ms: 1000,
            timeout_sec: 8,
        }
    }
}

/// Feed collection fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Parallel fetches in flight
    pub max_concurrency: usize,
    /// Wall-clock budget for a whole collection run; late sources are dropped
    pub deadline_sec: u64,
    /// Timeout for a single HTTP request
    pub request_timeout_sec: u64,
    pub gdelt_base_url: String,
    /// Articles requested per GDELT query
    pub gdelt_max_records: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 30,
            deadline_sec: 40,
            request_timeout_sec: 15,
            gdelt_base_url: "https://api.gdeltproject.org/api/v2/doc/doc".to_string(),
            gdelt_max_records: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the supplier/event tables and the geocode cache
    pub data_dir: PathBuf,
    /// Events older than this many days are discarded on refresh
    pub retention_days: i64,
    pub scorer: ScorerConfig,
    pub filter: FilterConfig,
    /// `None` disables the semantic layer of the relevance filter
    pub oracle: Option<OracleConfig>,
    pub geocoder: GeocoderConfig,
    pub collector: CollectorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            retention_days: RETENTION_DAYS,
            scorer: ScorerConfig::default(),
            filter: FilterConfig::default(),
            oracle: None,
            geocoder: GeocoderConfig::default(),
            collector: CollectorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with process environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// | variable | effect |
    /// |----------|--------|
    /// | `SUPPLY_RISK_DATA_DIR` | data directory |
    /// | `OPENAI_API_KEY` | enables the semantic oracle |
    /// | `ORACLE_MODEL`, `ORACLE_BASE_URL` | oracle endpoint |
    /// | `LLM_DAILY_BUDGET` | oracle calls per UTC day |
    /// | `GEOCODE_CACHE_PATH` | geocode cache file |
    /// | `GEOCODER_ENABLED` | `false` keeps geocoding cache-only |
    /// | `COLLECTOR_DEADLINE_SECS`, `COLLECTOR_MAX_CONCURRENCY` | feed fan-out |
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = non_empty("SUPPLY_RISK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(api_key) = non_empty("OPENAI_API_KEY") {
            let mut oracle = OracleConfig {
                api_key,
                ..OracleConfig::default()
            };
            if let Some(model) = non_empty("ORACLE_MODEL") {
                oracle.model = model;
            }
            if let Some(url) = non_empty("ORACLE_BASE_URL") {
                oracle.base_url = url;
            }
            overlay(&mut oracle.daily_budget, non_empty("LLM_DAILY_BUDGET"));
            config.oracle = Some(oracle);
        }

        if let Some(path) = non_empty("GEOCODE_CACHE_PATH") {
            config.geocoder.cache_path = Some(PathBuf::from(path));
        }
        overlay(&mut config.geocoder.enabled, non_empty("GEOCODER_ENABLED"));
        overlay(&mut config.collector.deadline_sec, non_empty("COLLECTOR_DEADLINE_SECS"));
        overlay(
            &mut config.collector.max_concurrency,
            non_empty("COLLECTOR_MAX_CONCURRENCY"),
        );

        config
    }

    pub fn suppliers_path(&self) -> PathBuf {
        self.data_dir.join("suppliers.json")
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("events.json")
    }

    pub fn geocode_cache_path(&self) -> PathBuf {
        self.geocoder
            .cache_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("geocode_cache.json"))
    }
}

/// Replace `target` when `value` parses
fn overlay<T: FromStr>(target: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.parse().ok()) {
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retention_days, 21);
        assert!(config.oracle.is_none());
        assert_eq!(config.filter.min_oracle_confidence, 70);
        assert_eq!(config.collector.max_concurrency, 30);
        assert_eq!(config.collector.deadline_sec, 40);
        assert_eq!(config.geocoder.min_interval_ms, 1000);
        assert_eq!(config.geocode_cache_path(), PathBuf::from("data/geocode_cache.json"));
    }

    #[test]
    fn test_oracle_enabled_by_api_key() {
        let config = EngineConfig::from_vars(vars(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_DAILY_BUDGET", "25"),
        ]));
        let oracle = config.oracle.unwrap();
        assert_eq!(oracle.api_key, "sk-test");
        assert_eq!(oracle.daily_budget, 25);
        assert_eq!(oracle.model, "gpt-4o-mini");
    }

    #[test]
    fn test_blank_api_key_keeps_oracle_disabled() {
        let config = EngineConfig::from_vars(vars(&[("OPENAI_API_KEY", "  ")]));
        assert!(config.oracle.is_none());
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let config = EngineConfig::from_vars(vars(&[
            ("COLLECTOR_DEADLINE_SECS", "soon"),
            ("COLLECTOR_MAX_CONCURRENCY", "8"),
            ("GEOCODER_ENABLED", "false"),
            ("SUPPLY_RISK_DATA_DIR", "/var/lib/supply-risk"),
        ]));
        assert_eq!(config.collector.deadline_sec, 40);
        assert_eq!(config.collector.max_concurrency, 8);
        assert!(!config.geocoder.enabled);
        assert_eq!(
            config.suppliers_path(),
            PathBuf::from("/var/lib/supply-risk/suppliers.json")
        );
    }
}
