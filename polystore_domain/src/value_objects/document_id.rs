// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Opaque, URL-safe, fleet-collision-resistant document identity (spec §4.2).

use crate::value_objects::generic_id::{GenericId, IdCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentIdCategory;

impl IdCategory for DocumentIdCategory {
    fn category_name() -> &'static str {
        "document"
    }
}

/// Stable, unique identifier for a [`crate::entities::Document`].
pub type DocumentId = GenericId<DocumentIdCategory>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SagaIdCategory;

impl IdCategory for SagaIdCategory {
    fn category_name() -> &'static str {
        "saga"
    }
}

/// Identifier for one coordinated write (a saga execution).
pub type SagaId = GenericId<SagaIdCategory>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationIdCategory;

impl IdCategory for CorrelationIdCategory {
    fn category_name() -> &'static str {
        "correlation"
    }
}

/// Tracing correlation id carried by a [`crate::entities::SagaExecutionRecord`].
pub type CorrelationId = GenericId<CorrelationIdCategory>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_are_unique_and_time_ordered() {
        let a = DocumentId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = DocumentId::new();
        assert_ne!(a, b);
        assert!(a.timestamp_ms() <= b.timestamp_ms());
    }

    #[test]
    fn document_id_round_trips_through_string() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
