//! Filesystem-backed collaborators for running the pipeline locally.
//!
//! These stand in for the hosted services: buckets become subdirectories
//! under a data root, the durable ownership table becomes one JSON file
//! per execution, and notifications/resume calls land in logs and an
//! outbox file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::models::{AnalysisResult, OwnershipRecord, ReviewInputContent};

use super::{
    ClientError, DocumentAnalyzer, NotificationChannel, ObjectStore, OwnershipTable,
    QualityClassifier, QualityLabel, ReviewDispatcher, WorkflowOrchestrator,
};

/// Suffix of the sidecar object holding a classifier verdict.
const LABELS_SUFFIX: &str = ".labels.json";

/// Suffix of the sidecar object holding a pre-computed analysis result.
const OCR_SUFFIX: &str = ".ocr.json";

/// Replace path-hostile characters so an arbitrary id can name a file.
fn file_key(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Object storage where a bucket is a subdirectory under a data root.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_json(&self, bucket: &str, key: &str) -> Result<serde_json::Value, ClientError> {
        let path = self.object_path(bucket, key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClientError::NotFound(format!("{bucket}/{key}")));
            }
            Err(e) => return Err(ClientError::Io(e)),
        };
        serde_json::from_str(&raw)
            .map_err(|e| ClientError::Malformed(format!("{bucket}/{key}: {e}")))
    }

    async fn put_json(
        &self,
        bucket: &str,
        key: &str,
        body: &serde_json::Value,
    ) -> Result<(), ClientError> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(body)
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        fs::write(&path, raw)?;
        Ok(())
    }
}

/// Durable ownership table as one JSON file per execution id.
///
/// Reads treat expired entries as absent, standing in for the hosted
/// store's own reaping.
pub struct FsOwnershipTable {
    dir: PathBuf,
}

impl FsOwnershipTable {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, execution_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_key(execution_id)))
    }
}

#[async_trait]
impl OwnershipTable for FsOwnershipTable {
    async fn get(&self, execution_id: &str) -> Result<Option<OwnershipRecord>, ClientError> {
        let path = self.record_path(execution_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Io(e)),
        };
        let record: OwnershipRecord = serde_json::from_str(&raw)
            .map_err(|e| ClientError::Malformed(format!("ownership record {execution_id}: {e}")))?;
        if record.is_expired() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn put(&self, record: &OwnershipRecord) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&record.execution_id);
        let raw = serde_json::to_string_pretty(record)
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        fs::write(&path, raw)?;
        Ok(())
    }
}

/// Classifier stand-in that reads its verdict from a sidecar object.
///
/// The hosted classifier is a black box; local runs supply its labels as
/// a `<key>.labels.json` array next to the image.
pub struct SidecarClassifier {
    store: Arc<dyn ObjectStore>,
}

impl SidecarClassifier {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QualityClassifier for SidecarClassifier {
    async fn classify(&self, bucket: &str, key: &str) -> Result<Vec<QualityLabel>, ClientError> {
        let raw = self
            .store
            .get_json(bucket, &format!("{key}{LABELS_SUFFIX}"))
            .await?;
        serde_json::from_value(raw)
            .map_err(|e| ClientError::Malformed(format!("labels for {bucket}/{key}: {e}")))
    }
}

/// Analyzer stand-in that reads a pre-computed result from a sidecar
/// object (`<key>.ocr.json`), since OCR itself runs elsewhere.
pub struct SidecarAnalyzer {
    store: Arc<dyn ObjectStore>,
}

impl SidecarAnalyzer {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentAnalyzer for SidecarAnalyzer {
    async fn analyze(&self, bucket: &str, key: &str) -> Result<AnalysisResult, ClientError> {
        let raw = self
            .store
            .get_json(bucket, &format!("{key}{OCR_SUFFIX}"))
            .await?;
        serde_json::from_value(raw)
            .map_err(|e| ClientError::Malformed(format!("analysis for {bucket}/{key}: {e}")))
    }
}

/// Notification channel that publishes into the log stream.
pub struct LogNotificationChannel;

#[async_trait]
impl NotificationChannel for LogNotificationChannel {
    async fn publish(
        &self,
        channel: &str,
        payload: &serde_json::Value,
    ) -> Result<(), ClientError> {
        tracing::info!(channel, %payload, "notification published");
        Ok(())
    }
}

/// Review dispatcher that writes pending tasks as JSON files.
pub struct FsReviewDispatcher {
    dir: PathBuf,
}

impl FsReviewDispatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReviewDispatcher for FsReviewDispatcher {
    async fn start_review(
        &self,
        task_name: &str,
        input: &ReviewInputContent,
    ) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.json", file_key(task_name)));
        let raw = serde_json::to_string_pretty(input)
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        fs::write(&path, raw)?;
        tracing::info!(task_name, path = %path.display(), "review task dispatched");
        Ok(())
    }
}

/// Orchestrator stand-in that appends resume/fail calls to a JSON-lines
/// outbox file.
pub struct OutboxOrchestrator {
    path: PathBuf,
}

impl OutboxOrchestrator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, line: &serde_json::Value) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowOrchestrator for OutboxOrchestrator {
    async fn resume(&self, token: &str, output: &serde_json::Value) -> Result<(), ClientError> {
        self.append(&json!({
            "at": Utc::now().to_rfc3339(),
            "taskToken": token,
            "output": output,
        }))
    }

    async fn fail(&self, token: &str, error: &str, cause: &str) -> Result<(), ClientError> {
        self.append(&json!({
            "at": Utc::now().to_rfc3339(),
            "taskToken": token,
            "error": error,
            "cause": cause,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_object_store_roundtrip() {
        let (_dir, store) = store();
        let body = json!({"Vendor": "Acme"});
        store.put_json("uploads", "r.json", &body).await.unwrap();
        let loaded = store.get_json("uploads", "r.json").await.unwrap();
        assert_eq!(loaded, body);
    }

    #[tokio::test]
    async fn test_object_store_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get_json("uploads", "missing.json").await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ownership_table_reaps_expired() {
        let dir = tempfile::tempdir().unwrap();
        let table = FsOwnershipTable::new(dir.path());

        let mut record = OwnershipRecord::new("exec-1", "id-1", "uploads/r.jpg");
        table.put(&record).await.unwrap();
        assert!(table.get("exec-1").await.unwrap().is_some());

        record.expires_at = Utc::now().timestamp() - 1;
        table.put(&record).await.unwrap();
        assert!(table.get("exec-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sidecar_classifier_reads_labels() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<FsObjectStore> = Arc::new(FsObjectStore::new(dir.path()));
        store
            .put_json(
                "uploads",
                "receipt.jpg.labels.json",
                &json!([{"Name": "good", "Confidence": 93.0}]),
            )
            .await
            .unwrap();

        let classifier = SidecarClassifier::new(store);
        let labels = classifier.classify("uploads", "receipt.jpg").await.unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "good");
        assert_eq!(labels[0].confidence, 93.0);
    }

    #[tokio::test]
    async fn test_sidecar_analyzer_reads_precomputed_result() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<FsObjectStore> = Arc::new(FsObjectStore::new(dir.path()));
        store
            .put_json(
                "uploads",
                "receipt.jpg.ocr.json",
                &json!({
                    "Blocks": [{"Kind": "LINE", "Text": "Acme Store", "Confidence": 98.0}],
                    "Pages": []
                }),
            )
            .await
            .unwrap();

        let analyzer = SidecarAnalyzer::new(store);
        let analysis = analyzer.analyze("uploads", "receipt.jpg").await.unwrap();
        assert_eq!(analysis.blocks.len(), 1);
        assert_eq!(analysis.blocks[0].text, "Acme Store");
    }

    #[tokio::test]
    async fn test_sidecar_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<FsObjectStore> = Arc::new(FsObjectStore::new(dir.path()));
        let classifier = SidecarClassifier::new(store);
        let err = classifier
            .classify("uploads", "receipt.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_outbox_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let outbox = OutboxOrchestrator::new(&path);
        outbox
            .resume("token-1", &json!({"Vendor": "Acme"}))
            .await
            .unwrap();
        outbox.fail("token-2", "ReviewFailed", "no human responses")
            .await
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["taskToken"], "token-1");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["error"], "ReviewFailed");
    }
}
