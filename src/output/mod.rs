pub mod parquet_sink;

#[cfg(test)]
pub mod memory;

pub use parquet_sink::ParquetSink;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::{day_key, Table};

/// File extension of every artifact: Parquet with gzip-compressed pages.
pub const ARTIFACT_EXTENSION: &str = "parquet.gz";

/// Destination for finished tables.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Persist `table` at `path`, replacing any previous artifact.
    async fn write_table(&self, path: &Path, table: Table) -> Result<()>;

    /// Delete the artifact at `path`. Removing a missing artifact is not an
    /// error.
    async fn remove(&self, path: &Path) -> Result<()>;
}

/// The two per-game tables a crawl produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    WinProbability,
    GameInfo,
}

impl TableKind {
    pub const ALL: [TableKind; 2] = [TableKind::WinProbability, TableKind::GameInfo];

    pub fn dir_name(self) -> &'static str {
        match self {
            TableKind::WinProbability => "win_probability",
            TableKind::GameInfo => "game_info",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Day-partitioned directory layout under one output root:
/// `<root>/<YYYYMMDD>/<kind>/<game_id>.parquet.gz`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind_dir(&self, day: &str, kind: TableKind) -> PathBuf {
        self.root.join(day).join(kind.dir_name())
    }

    pub fn artifact_path(&self, day: &str, kind: TableKind, game_id: &str) -> PathBuf {
        self.kind_dir(day, kind)
            .join(format!("{}.{}", game_id, ARTIFACT_EXTENSION))
    }

    /// Create the per-kind directories for every day in `[start, end]`.
    /// Returns the number of days prepared (zero for an inverted range).
    pub async fn prepare(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        let mut days = 0;
        for date in start.iter_days().take_while(|d| *d <= end) {
            let day = day_key(date);
            for kind in TableKind::ALL {
                let dir = self.kind_dir(&day, kind);
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            days += 1;
        }
        Ok(days)
    }
}
