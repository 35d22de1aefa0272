//! Alert states persisted as a JSON file next to the portfolio.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::json::{io_error, write_atomic};
use crate::domain::alert::AlertState;
use crate::error::PersistenceError;
use crate::port::outbound::store::AlertStateRepository;

#[derive(Debug, Default, Serialize, Deserialize)]
struct AlertFile {
    #[serde(default)]
    states: Vec<AlertState>,
}

/// File-backed [`AlertStateRepository`]. A missing file reads as no states.
#[derive(Debug, Clone)]
pub struct JsonAlertStateFile {
    path: PathBuf,
}

impl JsonAlertStateFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AlertStateRepository for JsonAlertStateFile {
    async fn load(&self) -> Result<Vec<AlertState>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.path, e)),
        };
        let file: AlertFile =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(path = %self.path.display(), states = file.states.len(), "Alert state file read");
        Ok(file.states)
    }

    async fn save(&self, states: &[AlertState]) -> Result<(), PersistenceError> {
        let file = AlertFile {
            states: states.to_vec(),
        };
        write_atomic(&self.path, &file).await
    }
}
