//! End-to-end flow over the filesystem-backed collaborators: a low
//! confidence extraction routes to review, the reviewer's answers resume
//! the workflow, and lifecycle events reach the owner's channel.

use std::fs;
use std::sync::Arc;

use serde_json::json;

use billscan::cache::TieredOwnershipCache;
use billscan::clients::{
    FsObjectStore, FsOwnershipTable, FsReviewDispatcher, LogNotificationChannel, ObjectStore,
    OutboxOrchestrator, RegexEntityRecognizer, SidecarAnalyzer, SidecarClassifier,
};
use billscan::models::{LogEvent, Route, StorageEventBatch, StorageEventRecord};
use billscan::services::analyze::{OutputSpec, SourceRef};
use billscan::services::{
    AnalyzeRequest, AnalyzeResponse, AnalyzeService, DigitizeRequest, GateRequest,
    PipelineOptions, ProgressNotifier, QualityGate, ReceiptPipeline, ReviewResolver,
};

fn analysis_with_total(total: &str) -> serde_json::Value {
    json!({
        "Blocks": [
            {"Kind": "LINE", "Text": "Acme Store", "Confidence": 98.0},
            {"Kind": "LINE", "Text": "card payment 03-14-2024", "Confidence": 96.0}
        ],
        "Pages": [{
            "Fields": [{
                "Key": {"Text": "Total Due", "Confidence": 95.0},
                "Value": {"Text": total, "Confidence": 90.0}
            }]
        }]
    })
}

fn pipeline(data_dir: &std::path::Path, threshold: f64) -> ReceiptPipeline {
    ReceiptPipeline::new(
        Arc::new(FsObjectStore::new(data_dir.join("objects"))),
        Arc::new(RegexEntityRecognizer::new()),
        Arc::new(FsReviewDispatcher::new(data_dir.join("reviews"))),
        PipelineOptions {
            confidence_threshold: threshold,
            language: "en".into(),
        },
    )
}

#[tokio::test]
async fn digitize_uses_entity_fallback_for_dates() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsObjectStore::new(dir.path().join("objects"));
    store
        .put_json("uploads", "receipt.analysis.json", &analysis_with_total("$42.50"))
        .await
        .unwrap();

    let response = pipeline(dir.path(), 80.0)
        .digitize(&DigitizeRequest {
            bucket: Some("uploads".into()),
            key: Some("receipt.analysis.json".into()),
            task_token: None,
        })
        .await
        .unwrap();

    // No date key/value field, so the date came from free text
    assert_eq!(response.outcome.date.value, "03-14-2024");
    assert_eq!(response.outcome.date.confidence, 90.0);
    assert_eq!(response.outcome.confidence, 90.0);
    assert_eq!(response.routing, Route::AutoAccept);
}

#[tokio::test]
async fn gate_analyze_digitize_chain() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<FsObjectStore> = Arc::new(FsObjectStore::new(dir.path().join("objects")));

    // Sidecar verdict and pre-computed analysis stand in for the hosted
    // classifier and OCR collaborators
    store
        .put_json(
            "uploads",
            "receipt.jpg.labels.json",
            &json!([{"Name": "good", "Confidence": 94.0}]),
        )
        .await
        .unwrap();
    store
        .put_json("uploads", "receipt.jpg.ocr.json", &analysis_with_total("$42.50"))
        .await
        .unwrap();

    let gate = QualityGate::new(Arc::new(SidecarClassifier::new(store.clone())));
    let outcome = gate
        .check(&GateRequest {
            bucket: Some("uploads".into()),
            key: Some("receipt.jpg".into()),
        })
        .await
        .unwrap();
    assert_eq!(outcome.top_label.name, "good");
    assert_eq!(outcome.input.uri.as_deref(), Some("uploads/receipt.jpg"));

    let analyzer = AnalyzeService::new(
        Arc::new(SidecarAnalyzer::new(store.clone())),
        store.clone(),
    );
    let response = analyzer
        .run(&AnalyzeRequest {
            input: Some(SourceRef {
                bucket: outcome.bucket,
                key: outcome.key,
            }),
            output: OutputSpec::default(),
        })
        .await
        .unwrap();
    let (bucket, key) = match response {
        AnalyzeResponse::Stored { bucket, key, .. } => (bucket, key),
        AnalyzeResponse::Inline(_) => panic!("expected stored delivery"),
    };
    assert_eq!(key, "receipt.jpg.analysis.json");

    let response = pipeline(dir.path(), 80.0)
        .digitize(&DigitizeRequest {
            bucket: Some(bucket),
            key: Some(key),
            task_token: None,
        })
        .await
        .unwrap();
    assert_eq!(response.routing, Route::AutoAccept);
    assert_eq!(response.outcome.vendor.value, "Acme Store");
    assert_eq!(response.outcome.total.value, "$42.50");
}

#[tokio::test]
async fn review_round_trip_resumes_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path().join("objects")));
    store
        .put_json("uploads", "receipt.analysis.json", &analysis_with_total("N/A"))
        .await
        .unwrap();

    // Unparsable total: the pass must route to review and dispatch a task
    let response = pipeline(dir.path(), 80.0)
        .digitize(&DigitizeRequest {
            bucket: Some("uploads".into()),
            key: Some("receipt.analysis.json".into()),
            task_token: Some("tok-42".into()),
        })
        .await
        .unwrap();
    assert_eq!(response.routing, Route::HumanReview);
    assert_eq!(response.outcome.total.confidence, 0.0);

    let tasks: Vec<_> = fs::read_dir(dir.path().join("reviews"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tasks.len(), 1);
    let task: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tasks[0].path()).unwrap()).unwrap();
    assert_eq!(task["taskToken"], "tok-42");

    // The reviewer completes; their result object lands in storage
    store
        .put_json(
            "review-results",
            "tok-42/output.json",
            &json!({
                "inputContent": task,
                "humanAnswers": [{
                    "answerContent": {
                        "date": "03/14/2024",
                        "total": "42.50",
                        "vendor": "Acme Store"
                    },
                    "workerId": "worker-7"
                }]
            }),
        )
        .await
        .unwrap();

    let outbox_path = dir.path().join("workflow-outbox.jsonl");
    let resolver = ReviewResolver::new(
        store.clone(),
        Arc::new(OutboxOrchestrator::new(&outbox_path)),
    );
    let stats = resolver
        .process_batch(&StorageEventBatch {
            records: vec![StorageEventRecord {
                event_time: "2024-03-14T12:00:00Z".into(),
                bucket: "review-results".into(),
                key: "tok-42/output.json".into(),
            }],
        })
        .await;
    assert_eq!(stats.resumed, 1);

    let outbox = fs::read_to_string(&outbox_path).unwrap();
    let entry: serde_json::Value = serde_json::from_str(outbox.lines().next().unwrap()).unwrap();
    assert_eq!(entry["taskToken"], "tok-42");
    assert_eq!(entry["output"]["Total"], "42.50");
    assert_eq!(entry["output"]["WorkerId"], "worker-7");
}

#[tokio::test]
async fn lifecycle_events_reach_owner_across_cache_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let table = Arc::new(FsOwnershipTable::new(dir.path().join("ownership")));

    let trigger = json!({
        "detail": {
            "requestParameters": {"bucketName": "uploads", "key": "receipt.jpg"},
            "identity": {"identityId": "identity-9"}
        }
    });
    let first = json!({
        "type": "ExecutionStarted",
        "executionId": "exec-1",
        "details": {"input": trigger.to_string()}
    });
    // The later event has no input at all: only the cache can place it
    let second = json!({
        "type": "TaskStateEntered",
        "executionId": "exec-1",
        "details": {"name": "ExtractFields"}
    });
    let events = vec![
        LogEvent {
            timestamp: 1710414000000,
            message: first.to_string(),
        },
        LogEvent {
            timestamp: 1710414060000,
            message: second.to_string(),
        },
    ];

    let cache = Arc::new(TieredOwnershipCache::new(table.clone()));
    let notifier = ProgressNotifier::new(cache, Arc::new(LogNotificationChannel));
    let stats = notifier.process_batch(&events).await;
    assert_eq!(stats.published, 2);
    assert_eq!(stats.dropped, 0);

    // Derivation was persisted for cold-start recovery
    let record = billscan::clients::OwnershipTable::get(table.as_ref(), "exec-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.identity_id, "identity-9");
    assert_eq!(record.object_uri, "uploads/receipt.jpg");

    // A fresh process (empty fast tier) can still place events for the
    // same execution from the durable record alone
    let cold_cache = Arc::new(TieredOwnershipCache::new(table));
    let cold_notifier = ProgressNotifier::new(cold_cache, Arc::new(LogNotificationChannel));
    let stats = cold_notifier.process_batch(&events[1..]).await;
    assert_eq!(stats.published, 1);
}
