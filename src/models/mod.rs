//! Data models for Billscan.

mod analysis;
mod events;
mod fields;
mod ownership;
mod review;

pub use analysis::{AnalysisResult, BlockKind, DocumentBlock, FormField, PageForm, TextSpan};
pub use events::{
    EventDetails, LifecycleMessage, LogEvent, PreservedInput, ProgressNotification,
    RequestIdentity, RequestParameters, StorageEventBatch, StorageEventRecord, TriggerDetail,
    WorkflowInput,
};
pub use fields::{CandidateOrigin, ExtractionOutcome, FieldCandidate, FieldResult, Route};
pub use ownership::{OwnershipRecord, OWNERSHIP_TTL_DAYS};
pub use review::{
    AnswerContent, HumanAnswer, ReviewInputContent, ReviewTaskResult, ReviewedFields,
};
