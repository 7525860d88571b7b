// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SHA-256 content/chunk hash value object, used for per-chunk digests and
//! the running aggregate hash over a streamed payload (spec §4.4 step 1 and
//! §8 invariant 6).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental SHA-256 accumulator, used to compute the running aggregate
/// hash over a lazily-read byte stream without buffering it (spec §4.4).
#[derive(Default)]
pub struct RollingHasher {
    hasher: Sha256,
}

impl RollingHasher {
    pub fn new() -> Self {
        Self { hasher: Sha256::new() }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finalize(self) -> ContentHash {
        ContentHash(hex::encode(self.hasher.finalize()))
    }
}
