//! Ownership records correlating workflow executions back to the
//! requesting identity.
//!
//! Workflow executions are triggered by object uploads, so clients only
//! know what file they created - not which execution it kicked off. An
//! `OwnershipRecord` bridges that gap: once derived, it is authoritative
//! for the execution until it expires.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Durable retention window for ownership records, in days.
pub const OWNERSHIP_TTL_DAYS: i64 = 7;

/// Maps a workflow execution to its owning identity and source object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OwnershipRecord {
    pub execution_id: String,
    pub identity_id: String,
    pub object_uri: String,
    /// Epoch seconds after which the durable store may reap this entry.
    pub expires_at: i64,
}

impl OwnershipRecord {
    /// Create a record expiring `OWNERSHIP_TTL_DAYS` from now.
    pub fn new(
        execution_id: impl Into<String>,
        identity_id: impl Into<String>,
        object_uri: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            identity_id: identity_id.into(),
            object_uri: object_uri.into(),
            expires_at: (Utc::now() + Duration::days(OWNERSHIP_TTL_DAYS)).timestamp(),
        }
    }

    /// Whether the durable store is entitled to reap this entry.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }
}
