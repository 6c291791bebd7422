//! Persistence for suppliers and events
//!
//! One flat table per entity. Event storage is clear-and-replace: a refresh
//! run writes the whole retained set. Supplier scores are written one
//! supplier at a time and never touch other rows.

use crate::{EngineError, Event, Result, RiskLevel, Supplier};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[async_trait]
pub trait RiskStore: Send + Sync {
    /// Replace every stored event with `events`.
    async fn store_events(&self, events: &[Event]) -> Result<()>;

    async fn load_events(&self) -> Result<Vec<Event>>;

    /// Write a derived score onto an existing supplier.
    async fn store_supplier_score(
        &self,
        name: &str,
        score: f64,
        level: RiskLevel,
        summary: &str,
    ) -> Result<()>;

    async fn load_suppliers(&self) -> Result<Vec<Supplier>>;

    /// Replace the supplier set (latest upload wins).
    async fn replace_suppliers(&self, suppliers: &[Supplier]) -> Result<()>;

    /// Write scores for many suppliers. Stores that can batch should override.
    async fn store_supplier_scores(&self, suppliers: &[Supplier]) -> Result<()> {
        for s in suppliers {
            self.store_supplier_score(&s.name, s.risk_score, s.risk_level, &s.event_summary)
                .await?;
        }
        Ok(())
    }
}

fn apply_score(
    suppliers: &mut [Supplier],
    name: &str,
    score: f64,
    level: RiskLevel,
    summary: &str,
) -> Result<()> {
    let supplier = suppliers
        .iter_mut()
        .find(|s| s.name == name)
        .ok_or_else(|| EngineError::SupplierNotFound(name.to_string()))?;
    supplier.apply_score(score, level, summary);
    Ok(())
}

/// In-memory store for tests and one-shot runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    suppliers: RwLock<Vec<Supplier>>,
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RiskStore for MemoryStore {
    async fn store_events(&self, events: &[Event]) -> Result<()> {
        *self.events.write().await = events.to_vec();
        Ok(())
    }

    async fn load_events(&self) -> Result<Vec<Event>> {
        Ok(self.events.read().await.clone())
    }

    async fn store_supplier_score(
        &self,
        name: &str,
        score: f64,
        level: RiskLevel,
        summary: &str,
    ) -> Result<()> {
        apply_score(&mut self.suppliers.write().await, name, score, level, summary)
    }

    async fn load_suppliers(&self) -> Result<Vec<Supplier>> {
        Ok(self.suppliers.read().await.clone())
    }

    async fn replace_suppliers(&self, suppliers: &[Supplier]) -> Result<()> {
        *self.suppliers.write().await = suppliers.to_vec();
        Ok(())
    }
}

/// JSON-file store: `suppliers.json` and `events.json` side by side.
///
/// Writes go through a temporary file and a rename, serialised by one lock,
/// so a reader never sees a half-written table.
#[derive(Debug)]
pub struct JsonFileStore {
    suppliers_path: PathBuf,
    events_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(suppliers_path: impl Into<PathBuf>, events_path: impl Into<PathBuf>) -> Self {
        Self {
            suppliers_path: suppliers_path.into(),
            events_path: events_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store rooted at `dir` using the default file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("suppliers.json"), dir.join("events.json"))
    }

    async fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
        let json = serde_json::to_vec_pretty(rows)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Wrote {} rows to {:?}", rows.len(), path);
        Ok(())
    }
}

#[async_trait]
impl RiskStore for JsonFileStore {
    async fn store_events(&self, events: &[Event]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        Self::write_table(&self.events_path, events).await
    }

    async fn load_events(&self) -> Result<Vec<Event>> {
        Self::read_table(&self.events_path).await
    }

    async fn store_supplier_score(
        &self,
        name: &str,
        score: f64,
        level: RiskLevel,
        summary: &str,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut suppliers: Vec<Supplier> = Self::read_table(&self.suppliers_path).await?;
        apply_score(&mut suppliers, name, score, level, summary)?;
        Self::write_table(&self.suppliers_path, &suppliers).await
    }

    async fn store_supplier_scores(&self, scored: &[Supplier]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut suppliers: Vec<Supplier> = Self::read_table(&self.suppliers_path).await?;
        for s in scored {
            apply_score(&mut suppliers, &s.name, s.risk_score, s.risk_level, &s.event_summary)?;
        }
        Self::write_table(&self.suppliers_path, &suppliers).await
    }

    async fn load_suppliers(&self) -> Result<Vec<Supplier>> {
        Self::read_table(&self.suppliers_path).await
    }

    async fn replace_suppliers(&self, suppliers: &[Supplier]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        Self::write_table(&self.suppliers_path, suppliers).await
    }
}
