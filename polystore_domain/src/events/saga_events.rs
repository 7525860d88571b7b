// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Saga lifecycle events, emitted for observability and for any
//! subscriber that wants to react to a finalized saga without polling the
//! durable log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::SagaStatus;
use crate::value_objects::{DocumentId, SagaId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SagaEvent {
    Completed { saga_id: SagaId, document_id: DocumentId, at: DateTime<Utc> },
    RolledBack { saga_id: SagaId, document_id: DocumentId, at: DateTime<Utc> },
    PartialFailure { saga_id: SagaId, document_id: DocumentId, at: DateTime<Utc> },
}

impl SagaEvent {
    pub fn from_status(saga_id: SagaId, document_id: DocumentId, status: SagaStatus) -> Option<Self> {
        let at = Utc::now();
        match status {
            SagaStatus::Completed => Some(Self::Completed { saga_id, document_id, at }),
            SagaStatus::RolledBack => Some(Self::RolledBack { saga_id, document_id, at }),
            SagaStatus::PartialFailure => Some(Self::PartialFailure { saga_id, document_id, at }),
            SagaStatus::Running => None,
        }
    }
}
