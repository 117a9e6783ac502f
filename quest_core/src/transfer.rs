//! Export and import of the progress record.
//!
//! The export document is pretty-printed JSON:
//!
//! ```json
//! { "version": 1, "playerCode": "ABC", "progress": { ... }, "exportedAt": "..." }
//! ```
//!
//! Import does not merge individual sessions. It keeps whichever record has
//! more sessions (the incoming one on a tie), so sessions that exist only in
//! the smaller record are dropped.

use crate::clock::Clock;
use crate::progress::ProgressStore;
use crate::storage::KeyValueStore;
use crate::types::ProgressRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Only version understood by import
pub const EXPORT_VERSION: u32 = 1;

/// Portable snapshot of a player's progress
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub player_code: String,
    pub progress: ProgressRecord,
    pub exported_at: DateTime<Utc>,
}

impl ExportDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Shape accepted on import; everything but the progress record is optional
#[derive(Debug, Deserialize)]
struct IncomingDocument {
    version: Option<u32>,
    #[serde(default)]
    progress: Option<ProgressRecord>,
}

/// What an import did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Not a version 1 export with a progress record; nothing was written
    Rejected,
    /// The incoming record had at least as many sessions and replaced ours
    AdoptedIncoming { sessions: usize },
    /// The current record had more sessions and was kept
    KeptCurrent { sessions: usize },
}

impl ImportOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, ImportOutcome::Rejected)
    }
}

/// Parse an export document, returning its record if it is importable
pub fn parse_import(text: &str) -> Option<ProgressRecord> {
    let doc: IncomingDocument = match serde_json::from_str(text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Import rejected, not an export document: {}", e);
            return None;
        }
    };
    if doc.version != Some(EXPORT_VERSION) {
        tracing::warn!("Import rejected, unsupported version {:?}", doc.version);
        return None;
    }
    if doc.progress.is_none() {
        tracing::warn!("Import rejected, no progress record");
    }
    doc.progress
}

impl<S: KeyValueStore, C: Clock> ProgressStore<S, C> {
    /// Snapshot the current record for `player_code`
    pub fn export(&self, player_code: &str) -> ExportDocument {
        ExportDocument {
            version: EXPORT_VERSION,
            player_code: player_code.to_string(),
            progress: self.load(),
            exported_at: self.clock().now(),
        }
    }

    /// Import an export document
    ///
    /// Storage failures are errors; a malformed document is
    /// [`ImportOutcome::Rejected`].
    pub fn import(&mut self, text: &str) -> Result<ImportOutcome> {
        let Some(incoming) = parse_import(text) else {
            return Ok(ImportOutcome::Rejected);
        };
        let current = self.load();

        let incoming_count = incoming.sessions.len();
        let current_count = current.sessions.len();

        if incoming_count >= current_count {
            self.replace(&incoming)?;
            tracing::info!(
                "Imported record with {} sessions (had {})",
                incoming_count,
                current_count
            );
            Ok(ImportOutcome::AdoptedIncoming {
                sessions: incoming_count,
            })
        } else {
            tracing::info!(
                "Kept current record with {} sessions (import had {})",
                current_count,
                incoming_count
            );
            Ok(ImportOutcome::KeptCurrent {
                sessions: current_count,
            })
        }
    }
}
