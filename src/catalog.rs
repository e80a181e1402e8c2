//! Price catalog persistence: upsert extracted records keyed by brand,
//! model/trim and year range.

use crate::{
    record::{CatalogKey, PriceRecord},
    util::write_atomic,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
}

pub trait PriceCatalog {
    fn upsert(&mut self, records: &[PriceRecord]) -> Result<CommitSummary>;
    fn entries(&self) -> Vec<PriceRecord>;
}

/// In-memory catalog; the JSON-file catalog wraps one of these.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    rows: BTreeMap<CatalogKey, PriceRecord>,
}

impl MemoryCatalog {
    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        let rows = records.into_iter().map(|r| (r.key(), r)).collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &CatalogKey) -> Option<&PriceRecord> {
        self.rows.get(key)
    }
}

impl PriceCatalog for MemoryCatalog {
    fn upsert(&mut self, records: &[PriceRecord]) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        let now = OffsetDateTime::now_utc();
        for rec in records {
            match self.rows.get_mut(&rec.key()) {
                Some(existing) => {
                    existing.price_min = rec.price_min;
                    existing.price_max = rec.price_max;
                    existing.model = rec.model.clone();
                    existing.sub_model = rec.sub_model.clone();
                    existing.updated_at = now;
                    summary.updated += 1;
                }
                None => {
                    let mut row = rec.clone();
                    row.created_at = now;
                    row.updated_at = now;
                    self.rows.insert(row.key(), row);
                    summary.inserted += 1;
                }
            }
        }
        Ok(summary)
    }

    fn entries(&self) -> Vec<PriceRecord> {
        self.rows.values().cloned().collect()
    }
}

/// Catalog stored as a JSON array on disk. Each upsert rewrites the file.
#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    inner: MemoryCatalog,
}

impl JsonCatalog {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let inner = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog: {}", path.display()))?;
            let records: Vec<PriceRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing catalog: {}", path.display()))?;
            MemoryCatalog::from_records(records)
        } else {
            MemoryCatalog::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.inner.entries())?;
        write_atomic(&self.path, &bytes)
            .with_context(|| format!("saving catalog: {}", self.path.display()))
    }
}

impl PriceCatalog for JsonCatalog {
    fn upsert(&mut self, records: &[PriceRecord]) -> Result<CommitSummary> {
        if records.is_empty() {
            info!("no records to commit");
            return Ok(CommitSummary::default());
        }
        // Commit against a copy so a failed save leaves memory and disk agreeing.
        let mut next = self.inner.clone();
        let summary = next.upsert(records)?;
        let previous = std::mem::replace(&mut self.inner, next);
        if let Err(err) = self.save() {
            self.inner = previous;
            return Err(err);
        }
        info!(
            "catalog {}: inserted={} updated={}",
            self.path.display(),
            summary.inserted,
            summary.updated
        );
        Ok(summary)
    }

    fn entries(&self) -> Vec<PriceRecord> {
        self.inner.entries()
    }
}
