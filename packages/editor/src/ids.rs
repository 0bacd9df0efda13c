//! Identity minting for published documents and draft tokens.

use crate::DocumentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh document identities
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> DocumentId;
}

/// Random v4 UUIDs, the identities the document service expects
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> DocumentId {
        DocumentId::new(Uuid::new_v4().to_string())
    }
}

/// Deterministic `{prefix}-{n}` identities, counting from 1
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    count: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            count: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> DocumentId {
        let n = self.count.fetch_add(1, Ordering::Relaxed);
        DocumentId::new(format!("{}-{}", self.prefix, n))
    }
}

/// Lightweight handle for deep-linking an in-progress edit.
///
/// Minted by the surface for every accepted content change. It is never a
/// document identity: only publishing creates one of those.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftToken(String);

impl DraftToken {
    pub fn mint() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
