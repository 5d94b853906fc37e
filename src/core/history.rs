use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::core::pipeline::GenerationResult;

pub const HISTORY_FILE: &str = "design-history.json";
pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Millisecond timestamp at insertion, as a string.
    pub id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub design: GenerationResult,
}

/// Recently generated designs, newest first, capped at [`MAX_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, design: GenerationResult) -> &HistoryEntry {
        let now = Utc::now();
        self.entries.insert(
            0,
            HistoryEntry {
                id: now.timestamp_millis().to_string(),
                timestamp: now.to_rfc3339(),
                design,
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        &self.entries[0]
    }
}

pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(HISTORY_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file is an empty history.
    pub async fn load(&self) -> History {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return History::default(),
        };
        match serde_json::from_str::<History>(&raw) {
            Ok(mut history) => {
                history.entries.truncate(MAX_ENTRIES);
                history
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt design history");
                History::default()
            }
        }
    }

    pub async fn save(&self, history: &History) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(history)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Loads, prepends one entry and saves.
    pub async fn record(&self, design: GenerationResult) -> Result<HistoryEntry> {
        let _guard = self.write_lock.lock().await;
        let mut history = self.load().await;
        let entry = history.push(design).clone();
        self.save(&history).await?;
        Ok(entry)
    }
}
