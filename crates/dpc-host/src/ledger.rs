//! # Reported-Order Ledger
//!
//! Keys reconciliation by order id so a donation is reported at most once,
//! even when the platform fires the completion callback twice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dpc_core::{ReconcileError, ReconcileResult, ReportLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Process-local ledger
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    reported: Mutex<HashSet<String>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportLedger for InMemoryLedger {
    async fn claim(&self, order_id: &str) -> ReconcileResult<bool> {
        Ok(self.reported.lock().await.insert(order_id.to_string()))
    }

    async fn is_reported(&self, order_id: &str) -> ReconcileResult<bool> {
        Ok(self.reported.lock().await.contains(order_id))
    }
}

/// One line of the ledger file
#[derive(Debug, Serialize, Deserialize)]
struct LedgerEntry {
    order_id: String,
    reported_at: DateTime<Utc>,
}

/// Ledger persisted as JSON lines, one claimed order per line
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    reported: Mutex<HashSet<String>>,
}

impl FileLedger {
    /// Open (or create on first claim) the ledger file at `path`
    pub async fn open(path: impl AsRef<Path>) -> ReconcileResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reported = HashSet::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                for line in content.lines().filter(|l| !l.trim().is_empty()) {
                    let entry: LedgerEntry = serde_json::from_str(line).map_err(|e| {
                        ReconcileError::Ledger(format!("Corrupt ledger line in {:?}: {}", path, e))
                    })?;
                    reported.insert(entry.order_id);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ReconcileError::Ledger(format!(
                    "Failed to read {:?}: {}",
                    path, e
                )))
            }
        }

        debug!("Loaded {} reported orders from {:?}", reported.len(), path);

        Ok(Self {
            path,
            reported: Mutex::new(reported),
        })
    }

    async fn append(&self, order_id: &str) -> ReconcileResult<()> {
        let entry = LedgerEntry {
            order_id: order_id.to_string(),
            reported_at: Utc::now(),
        };
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| ReconcileError::Ledger(e.to_string()))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ReconcileError::Ledger(format!("Failed to open {:?}: {}", self.path, e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ReconcileError::Ledger(format!("Failed to write {:?}: {}", self.path, e)))?;
        file.flush()
            .await
            .map_err(|e| ReconcileError::Ledger(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ReportLedger for FileLedger {
    async fn claim(&self, order_id: &str) -> ReconcileResult<bool> {
        // Held across the write so two claims for one order cannot both succeed
        let mut reported = self.reported.lock().await;
        if reported.contains(order_id) {
            return Ok(false);
        }
        self.append(order_id).await?;
        reported.insert(order_id.to_string());
        Ok(true)
    }

    async fn is_reported(&self, order_id: &str) -> ReconcileResult<bool> {
        Ok(self.reported.lock().await.contains(order_id))
    }
}
