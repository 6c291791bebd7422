//! Supplier and article loading from JSON files

use crate::filter::RawArticle;
use crate::{Coordinates, EngineError, Result, Supplier};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

const MAX_NAME_CHARS: usize = 256;
const MAX_FIELD_CHARS: usize = 128;

/// Strip control characters, collapse whitespace and cap length
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(MAX_NAME_CHARS)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sanitize_field(value: Option<String>) -> String {
    value
        .map(|v| {
            v.chars()
                .filter(|c| !c.is_control())
                .take(MAX_FIELD_CHARS)
                .collect::<String>()
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

/// Spreadsheet exports carry tiers as numbers, hand-written files as text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTier {
    Number(i64),
    Text(String),
}

impl RawTier {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// Supplier row as uploaded
#[derive(Debug, Deserialize)]
struct RawSupplier {
    #[serde(alias = "Supplier Name", alias = "supplier_name")]
    name: Option<String>,
    #[serde(alias = "Category")]
    category: Option<String>,
    #[serde(alias = "City")]
    city: Option<String>,
    #[serde(alias = "Country")]
    country: Option<String>,
    #[serde(alias = "Tier")]
    tier: Option<RawTier>,
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    longitude: Option<f64>,
}

/// Accept a bare array or an object wrapping it under `key`
fn unwrap_list(raw: serde_json::Value, key: &str) -> Result<serde_json::Value> {
    match raw {
        serde_json::Value::Array(_) => Ok(raw),
        serde_json::Value::Object(mut map) => map.remove(key).ok_or_else(|| EngineError::Validation {
            row: 0,
            reason: format!("expected a JSON array or an object with a '{}' array", key),
        }),
        _ => Err(EngineError::Validation {
            row: 0,
            reason: "expected a JSON array".to_string(),
        }),
    }
}

/// Validate raw rows into suppliers.
///
/// Rejects the whole upload on an empty name or country, or a duplicate
/// name (case-insensitive). Out-of-range coordinates are dropped, not
/// rejected. Rows are numbered from 1.
fn validate(rows: Vec<RawSupplier>) -> Result<Vec<Supplier>> {
    let mut seen = HashSet::new();
    let mut suppliers = Vec::with_capacity(rows.len());
    let mut dropped_coords = 0;

    for (i, row) in rows.into_iter().enumerate() {
        let row_no = i + 1;

        let name = sanitize_name(row.name.as_deref().unwrap_or_default());
        if name.is_empty() {
            return Err(EngineError::Validation {
                row: row_no,
                reason: "empty supplier name".to_string(),
            });
        }
        let country = sanitize_field(row.country);
        if country.is_empty() {
            return Err(EngineError::Validation {
                row: row_no,
                reason: format!("empty country for supplier '{}'", name),
            });
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(EngineError::DuplicateSupplier(name));
        }

        let mut supplier = Supplier::new(
            name,
            sanitize_field(row.category),
            sanitize_field(row.city),
            country,
            row.tier.map(RawTier::into_string).unwrap_or_default(),
        );

        if let (Some(lat), Some(lon)) = (row.latitude, row.longitude) {
            if Coordinates::new(lat, lon).is_valid() {
                supplier = supplier.with_coordinates(lat, lon);
            } else {
                dropped_coords += 1;
            }
        }

        suppliers.push(supplier);
    }

    if dropped_coords > 0 {
        warn!("Discarded out-of-range coordinates on {} supplier(s)", dropped_coords);
    }

    Ok(suppliers)
}

/// Parse and validate a supplier upload from JSON text
pub fn parse_suppliers(json: &str) -> Result<Vec<Supplier>> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    let rows: Vec<RawSupplier> = serde_json::from_value(unwrap_list(raw, "suppliers")?)?;
    validate(rows)
}

/// Load and validate a supplier upload from a JSON file
pub fn load_suppliers(path: impl AsRef<Path>) -> Result<Vec<Supplier>> {
    let path = path.as_ref();
    info!("Loading suppliers from {:?}", path);

    let file = File::open(path)?;
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
    let rows: Vec<RawSupplier> = serde_json::from_value(unwrap_list(raw, "suppliers")?)?;
    let suppliers = validate(rows)?;

    info!("Loaded {} suppliers", suppliers.len());
    Ok(suppliers)
}

/// Load raw feed articles from a JSON file
///
/// Articles without a title are skipped.
pub fn load_articles(path: impl AsRef<Path>) -> Result<Vec<RawArticle>> {
    let path = path.as_ref();
    info!("Loading articles from {:?}", path);

    let file = File::open(path)?;
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
    articles_from_value(raw)
}

/// Parse an article feed already read into memory
pub fn parse_articles(json: &str) -> Result<Vec<RawArticle>> {
    articles_from_value(serde_json::from_str(json)?)
}

fn articles_from_value(raw: serde_json::Value) -> Result<Vec<RawArticle>> {
    let articles: Vec<RawArticle> = serde_json::from_value(unwrap_list(raw, "articles")?)?;

    let total = articles.len();
    let articles: Vec<RawArticle> = articles
        .into_iter()
        .filter(|a| !a.title.trim().is_empty())
        .collect();

    info!(
        "Loaded {} articles ({} skipped without title)",
        articles.len(),
        total - articles.len()
    );
    Ok(articles)
}
