// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Document Entity
//!
//! The central entity of the coordinator (spec §3). Created by Identity,
//! mutated only by the Saga Coordinator through step outcomes, destroyed
//! only by archive/delete subsystems that are out of scope here.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::BackendKind;
use crate::value_objects::{ContentHash, DocumentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Archived,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Archived => "archived",
        };
        write!(f, "{s}")
    }
}

/// One logical name -> adapter-native-key map per backend kind, populated
/// from the collected native keys of a completed saga (spec §3, §4.5 step 5).
pub type ReferenceMap = BTreeMap<BackendKind, BTreeMap<String, String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: DocumentId,
    pub original_file_reference: String,
    pub content_hash: ContentHash,
    pub size_bytes: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ProcessingStatus,
    pub references: ReferenceMap,
}

impl Document {
    pub fn new(original_file_reference: impl Into<String>, content_hash: ContentHash, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            document_id: DocumentId::new(),
            original_file_reference: original_file_reference.into(),
            content_hash,
            size_bytes,
            mime_type: mime_type.into(),
            created_at: now,
            updated_at: now,
            status: ProcessingStatus::Pending,
            references: ReferenceMap::new(),
        }
    }

    pub fn mark_status(&mut self, status: ProcessingStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Records the native key an adapter returned for a completed step,
    /// under a logical name (e.g. the step name).
    pub fn record_reference(&mut self, backend: BackendKind, logical_name: impl Into<String>, native_key: impl Into<String>) {
        self.references.entry(backend).or_default().insert(logical_name.into(), native_key.into());
        self.updated_at = Utc::now();
    }

    pub fn reference(&self, backend: BackendKind, logical_name: &str) -> Option<&str> {
        self.references.get(&backend).and_then(|m| m.get(logical_name)).map(String::as_str)
    }
}
