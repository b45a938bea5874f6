use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::TableSink;
use crate::models::Table;

/// Keeps written tables in memory instead of touching the filesystem.
#[derive(Default)]
pub struct MemorySink {
    writes: Mutex<Vec<(PathBuf, Table)>>,
    /// Writes to paths containing this fragment fail.
    fail_on: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(fragment: &str) -> Self {
        MemorySink {
            writes: Mutex::new(Vec::new()),
            fail_on: Some(fragment.to_string()),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn table_at(&self, path: &Path) -> Option<Table> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, t)| t.clone())
    }
}

#[async_trait]
impl TableSink for MemorySink {
    async fn write_table(&self, path: &Path, table: Table) -> Result<()> {
        if let Some(fragment) = &self.fail_on {
            if path.to_string_lossy().contains(fragment.as_str()) {
                anyhow::bail!("disk full writing {}", path.display());
            }
        }
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), table));
        Ok(())
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        self.writes.lock().unwrap().retain(|(p, _)| p != path);
        Ok(())
    }
}
