//! Two-tier execution-ownership cache.
//!
//! Maps a workflow execution id to the identity and source object that
//! triggered it, so progress notifications can reach the right channel.
//! A fast in-process tier fronts the durable key-value collaborator; the
//! decorator tries the fast tier, falls back to the durable one, and
//! backfills on a durable hit. A record, once cached, is authoritative
//! until it expires.

mod durable;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::clients::{ClientError, OwnershipTable};
use crate::models::OwnershipRecord;

pub use durable::DurableTier;
pub use memory::{MemoryTier, DEFAULT_CAPACITY, DEFAULT_TTL};

/// Lookup and recording of execution ownership.
#[async_trait]
pub trait OwnershipCache: Send + Sync {
    /// Look up the ownership of a workflow execution.
    async fn resolve(&self, execution_id: &str) -> Result<Option<OwnershipRecord>, ClientError>;

    /// Record a newly derived ownership.
    async fn record(&self, record: OwnershipRecord) -> Result<(), ClientError>;
}

/// The fast-tier-over-durable-tier composition.
pub struct TieredOwnershipCache {
    fast: MemoryTier,
    durable: DurableTier,
}

impl TieredOwnershipCache {
    pub fn new(table: Arc<dyn OwnershipTable>) -> Self {
        Self {
            fast: MemoryTier::new(),
            durable: DurableTier::new(table),
        }
    }

    pub fn with_fast_bounds(
        table: Arc<dyn OwnershipTable>,
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            fast: MemoryTier::with_bounds(capacity, ttl),
            durable: DurableTier::new(table),
        }
    }
}

#[async_trait]
impl OwnershipCache for TieredOwnershipCache {
    async fn resolve(&self, execution_id: &str) -> Result<Option<OwnershipRecord>, ClientError> {
        if let Some(record) = self.fast.get(execution_id) {
            return Ok(Some(record));
        }
        match self.durable.get(execution_id).await? {
            Some(record) => {
                self.fast.insert(record.clone());
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn record(&self, record: OwnershipRecord) -> Result<(), ClientError> {
        self.fast.insert(record.clone());
        self.durable.put_if_absent(&record).await?;
        Ok(())
    }
}
