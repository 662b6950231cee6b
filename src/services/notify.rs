//! Progress notification correlation.
//!
//! Workflow lifecycle events name an execution, but clients only know
//! what object they uploaded. This correlator resolves each event's
//! ownership through the two-tier cache (deriving and recording it from
//! the event's own payload on a full miss) and publishes a progress
//! notification on the owner's private channel.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::OwnershipCache;
use crate::clients::{object_uri, ClientError, NotificationChannel};
use crate::config::DEFAULT_CHANNEL_PREFIX;
use crate::models::{
    LifecycleMessage, LogEvent, OwnershipRecord, ProgressNotification, WorkflowInput,
};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("unparseable log message: {0}")]
    BadMessage(#[from] serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Tallies for one processed batch of lifecycle events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyStats {
    pub published: usize,
    pub dropped: usize,
}

/// Publishes workflow progress to the owning client's channel.
pub struct ProgressNotifier {
    cache: Arc<dyn OwnershipCache>,
    channel: Arc<dyn NotificationChannel>,
    channel_prefix: String,
}

impl ProgressNotifier {
    pub fn new(cache: Arc<dyn OwnershipCache>, channel: Arc<dyn NotificationChannel>) -> Self {
        Self::with_prefix(cache, channel, DEFAULT_CHANNEL_PREFIX)
    }

    pub fn with_prefix(
        cache: Arc<dyn OwnershipCache>,
        channel: Arc<dyn NotificationChannel>,
        channel_prefix: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            channel,
            channel_prefix: channel_prefix.into(),
        }
    }

    /// Process a batch of lifecycle log events. Failures in one event
    /// never block the rest of the batch.
    pub async fn process_batch(&self, events: &[LogEvent]) -> NotifyStats {
        let mut stats = NotifyStats::default();
        for event in events {
            match self.process_event(event).await {
                Ok(true) => stats.published += 1,
                Ok(false) => stats.dropped += 1,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "uncaught error in log event processing, moving to next event"
                    );
                    stats.dropped += 1;
                }
            }
        }
        stats
    }

    /// Returns whether a notification was published.
    async fn process_event(&self, event: &LogEvent) -> Result<bool, NotifyError> {
        let message: LifecycleMessage = serde_json::from_str(&event.message)?;

        let state_name = if message.is_state_event() {
            message.details.name.clone()
        } else {
            None
        };

        // A cached record is authoritative: never re-derive ownership for
        // a known execution, even if this event carries other context.
        let ownership = match self.cache.resolve(&message.execution_id).await? {
            Some(record) => record,
            None => match derive_ownership(&message) {
                Some(record) => {
                    self.cache.record(record.clone()).await?;
                    record
                }
                None => {
                    tracing::warn!(
                        execution_id = %message.execution_id,
                        event_type = %message.event_type,
                        "could not trace ownership from cache or event payload, dropping event"
                    );
                    return Ok(false);
                }
            },
        };

        let notification = ProgressNotification {
            execution_id: message.execution_id.clone(),
            timestamp: event.timestamp,
            event_type: message.event_type.clone(),
            state_name,
            object_uri: ownership.object_uri.clone(),
        };

        let channel = format!("{}/{}", self.channel_prefix, ownership.identity_id);
        tracing::debug!(%channel, execution_id = %message.execution_id, "publishing notification");
        let payload = serde_json::to_value(&notification)?;
        self.channel.publish(&channel, &payload).await?;
        Ok(true)
    }
}

/// Derive ownership from the event's own payload, when it carries enough
/// context.
///
/// The identity comes from the original trigger detail; the locator from
/// the trigger's request parameters or, failing that, the bucket/key the
/// first workflow state preserved. First match wins - the two shapes are
/// not cross-validated when both are present.
fn derive_ownership(message: &LifecycleMessage) -> Option<OwnershipRecord> {
    let raw = message.details.input.as_ref()?;
    let input: WorkflowInput = serde_json::from_str(raw).ok()?;

    let identity_id = input
        .detail
        .as_ref()?
        .identity
        .as_ref()?
        .identity_id
        .clone();

    let locator = if let Some(params) = input
        .detail
        .as_ref()
        .and_then(|d| d.request_parameters.as_ref())
    {
        object_uri(&params.bucket_name, &params.key)
    } else if let Some(preserved) = input.preserved.as_ref() {
        object_uri(&preserved.bucket, &preserved.key)
    } else {
        return None;
    };

    Some(OwnershipRecord::new(
        message.execution_id.clone(),
        identity_id,
        locator,
    ))
}
