//! Durable tier of the ownership cache.
//!
//! Thin wrapper over the key-value collaborator that enforces
//! first-derivation-wins writes: an existing record is never overwritten,
//! so its retention window is never reset.

use std::sync::Arc;

use crate::clients::{ClientError, OwnershipTable};
use crate::models::OwnershipRecord;

/// Ownership tier backed by the durable key-value collaborator.
pub struct DurableTier {
    table: Arc<dyn OwnershipTable>,
}

impl DurableTier {
    pub fn new(table: Arc<dyn OwnershipTable>) -> Self {
        Self { table }
    }

    pub async fn get(&self, execution_id: &str) -> Result<Option<OwnershipRecord>, ClientError> {
        self.table.get(execution_id).await
    }

    /// Write the record only when the key is absent. Returns whether a
    /// write happened.
    pub async fn put_if_absent(&self, record: &OwnershipRecord) -> Result<bool, ClientError> {
        if self.table.get(&record.execution_id).await?.is_some() {
            return Ok(false);
        }
        self.table.put(record).await?;
        Ok(true)
    }
}
