//! Sync Cursor Data

use serde_json::Value;

use crate::domain::cursors::{CursorValue, records::SyncCursorRecord};

/// End-of-batch cursor write.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorAdvance {
    /// Last id processed by the batch.
    pub last_sync_id: CursorValue,

    /// Object merged into the stored metadata.
    pub metadata: Value,
}

/// Result of a cursor write.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// The watermark moved forward.
    Advanced(SyncCursorRecord),

    /// The proposed id was not ahead of the stored one; nothing was written.
    Unchanged(SyncCursorRecord),
}

impl AdvanceOutcome {
    #[must_use]
    pub fn record(&self) -> &SyncCursorRecord {
        match self {
            Self::Advanced(record) | Self::Unchanged(record) => record,
        }
    }
}
