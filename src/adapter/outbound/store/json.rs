//! Portfolio persisted as a JSON file.
//!
//! Writes go to a sibling temp file which is fsynced and renamed over the
//! target, so a crash mid-write leaves either the old or the new file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::portfolio::PortfolioEntry;
use crate::domain::ticker::Ticker;
use crate::error::PersistenceError;
use crate::port::outbound::store::PortfolioRepository;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PortfolioFile {
    tickers: Vec<Ticker>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    added: BTreeMap<String, DateTime<Utc>>,
}

impl PortfolioFile {
    fn from_entries(entries: &[PortfolioEntry]) -> Self {
        Self {
            tickers: entries.iter().map(|e| e.ticker.clone()).collect(),
            added: entries
                .iter()
                .map(|e| (e.ticker.to_string(), e.added_at))
                .collect(),
        }
    }

    fn into_entries(self) -> Vec<PortfolioEntry> {
        let now = Utc::now();
        let mut entries: Vec<PortfolioEntry> = Vec::with_capacity(self.tickers.len());
        for ticker in self.tickers {
            if entries.iter().any(|e| e.ticker == ticker) {
                continue;
            }
            let added_at = self.added.get(ticker.as_str()).copied().unwrap_or(now);
            entries.push(PortfolioEntry::new(ticker, added_at));
        }
        entries
    }
}

/// File-backed [`PortfolioRepository`].
#[derive(Debug, Clone)]
pub struct JsonPortfolioFile {
    path: PathBuf,
}

impl JsonPortfolioFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        io_error(&self.path, source)
    }
}

pub(super) fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Serialize `value` to `path` via write-temp, fsync, rename.
pub(super) async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Corrupt {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|e| io_error(path, e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let written = async {
        let mut out = fs::File::create(&temp_path).await?;
        out.write_all(json.as_bytes()).await?;
        out.sync_all().await?;
        fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_error(path, e));
    }
    Ok(())
}

#[async_trait]
impl PortfolioRepository for JsonPortfolioFile {
    async fn load(&self) -> Result<Vec<PortfolioEntry>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No portfolio file, creating an empty one");
                write_atomic(&self.path, &PortfolioFile::default()).await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let file: PortfolioFile =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })?;
        let entries = file.into_entries();
        debug!(path = %self.path.display(), tickers = entries.len(), "Portfolio file read");
        Ok(entries)
    }

    async fn save(&self, entries: &[PortfolioEntry]) -> Result<(), PersistenceError> {
        write_atomic(&self.path, &PortfolioFile::from_entries(entries)).await?;
        debug!(path = %self.path.display(), tickers = entries.len(), "Portfolio file written");
        Ok(())
    }
}
