//! Workflow lifecycle events and storage notifications.
//!
//! The orchestrator logs one message per execution history event; a batch
//! of those log entries is what the notification correlator consumes.
//! Storage notifications (for completed review results) arrive in the
//! same batched shape the object store delivers them in.

use serde::{Deserialize, Serialize};

/// One entry in a delivered batch of lifecycle log events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Epoch milliseconds the event was logged at.
    pub timestamp: i64,
    /// JSON-encoded [`LifecycleMessage`].
    pub message: String,
}

/// The decoded message of a lifecycle log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleMessage {
    /// Event type, e.g. `ExecutionStarted` or `TaskStateEntered`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub execution_id: String,
    #[serde(default)]
    pub details: EventDetails,
}

impl LifecycleMessage {
    /// State-transition events carry the state name in their details.
    pub fn is_state_event(&self) -> bool {
        self.event_type.contains("State")
    }
}

/// Event-type-dependent details of a lifecycle message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    /// State name, present on state-transition events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// JSON-encoded [`WorkflowInput`], when the orchestrator recorded the
    /// step input on the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// Workflow step input as recorded on lifecycle events.
///
/// Ownership can be derived from two mutually exclusive places: the
/// original triggering request (`detail`) or the input preserved by the
/// first workflow state (`Input`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowInput {
    #[serde(default)]
    pub detail: Option<TriggerDetail>,
    #[serde(default, rename = "Input")]
    pub preserved: Option<PreservedInput>,
}

/// Detail of the original triggering request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDetail {
    #[serde(default)]
    pub request_parameters: Option<RequestParameters>,
    #[serde(default)]
    pub identity: Option<RequestIdentity>,
}

/// Bucket/key parameters of the triggering upload request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    pub bucket_name: String,
    pub key: String,
}

/// The federated identity that issued the triggering request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdentity {
    pub identity_id: String,
}

/// Source-object fields the first workflow state preserves through the
/// execution, so later steps (and events) can still see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreservedInput {
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Notification published to the owning client's private channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNotification {
    pub execution_id: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    pub object_uri: String,
}

/// One record in a storage-notification batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEventRecord {
    pub event_time: String,
    pub bucket: String,
    pub key: String,
}

/// A batch of storage notifications, delivered together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageEventBatch {
    #[serde(default)]
    pub records: Vec<StorageEventRecord>,
}
