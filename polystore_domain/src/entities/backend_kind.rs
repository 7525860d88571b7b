// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The four heterogeneous storage backends named in spec §1.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Structured metadata.
    Relational,
    /// Raw payload / chunked blob storage.
    Document,
    /// Embedding chunks.
    Vector,
    /// Cross-document relations.
    Graph,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Relational => "relational",
            BackendKind::Document => "document",
            BackendKind::Vector => "vector",
            BackendKind::Graph => "graph",
        };
        write!(f, "{s}")
    }
}
