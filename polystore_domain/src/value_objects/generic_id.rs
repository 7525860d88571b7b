// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Generic ID Value Object
//!
//! A type-safe ID wrapper over ULID, parameterized by a phantom `IdCategory`
//! so different entity ids can't be mixed up at compile time. ULIDs are
//! lexicographically sortable by creation time and URL-safe, satisfying
//! spec §4.2's requirement that `document_id` be "collision-resistant
//! across the process fleet" without needing a coordination service.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::CoordinatorError;

/// Per-category validation hook for [`GenericId`].
pub trait IdCategory {
    fn category_name() -> &'static str;
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct GenericId<T: IdCategory> {
    value: Ulid,
    _phantom: PhantomData<T>,
}

impl<T: IdCategory> Clone for GenericId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IdCategory> Serialize for GenericId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.to_string().serialize(serializer)
    }
}

impl<'de, T: IdCategory> Deserialize<'de> for GenericId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ulid = Ulid::from_string(&s).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        Ok(Self { value: ulid, _phantom: PhantomData })
    }
}

impl<T: IdCategory> GenericId<T> {
    /// Creates a new time-ordered id.
    pub fn new() -> Self {
        Self { value: Ulid::new(), _phantom: PhantomData }
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self { value: ulid, _phantom: PhantomData }
    }

    pub fn from_string(s: &str) -> Result<Self, CoordinatorError> {
        let ulid = Ulid::from_str(s).map_err(|e| {
            CoordinatorError::InvalidDocument(format!("invalid {} id: {e}", T::category_name()))
        })?;
        Ok(Self::from_ulid(ulid))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.value
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.value.timestamp_ms()
    }

    pub fn datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms() as i64).unwrap_or_else(chrono::Utc::now)
    }
}

impl<T: IdCategory> Default for GenericId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IdCategory> Display for GenericId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T: IdCategory> Hash for GenericId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdCategory> FromStr for GenericId<T> {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl<T: IdCategory> Copy for GenericId<T> {}
