use {
    std::{collections::BTreeMap, sync::atomic::{AtomicUsize, Ordering}},
    async_trait::async_trait,
    serde_json::json,
    bank_reviews_core::{
        cleaner::{Cleaner, CleanerConfig},
        entity::{into_review_document, ReviewDocument},
        error::StoreError,
        normalizer::{Normalizer, NormalizerConfig},
        raw::RawRecord,
        retry::RetryPolicy,
        store::{BankStats, MemoryStore, ReviewStore},
        summary::DropReason,
        upload::{UploadConfig, Uploader},
    },
};

/// Fails the first `failures` writes of every batch containing `poisoned_id`.
struct FlakyStore {
    inner: MemoryStore,
    poisoned_id: String,
    failures: usize,
    attempts: AtomicUsize,
    connection_lost: bool,
}

impl FlakyStore {
    fn new(poisoned_id: &str, failures: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            poisoned_id: poisoned_id.to_owned(),
            failures,
            attempts: AtomicUsize::new(0),
            connection_lost: false,
        }
    }

    fn disconnected() -> Self {
        Self {
            connection_lost: true,
            ..Self::new("", 0)
        }
    }
}

#[async_trait]
impl ReviewStore for FlakyStore {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        if self.connection_lost {
            return Err(StoreError::Connection("authentication failed".to_owned()));
        }
        self.inner.ensure_collection().await
    }

    async fn upsert_batch(&self, documents: &[ReviewDocument]) -> Result<usize, StoreError> {
        if documents.iter().any(|v| v.review_id() == self.poisoned_id) {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(StoreError::Write(format!("write conflict on attempt {}", attempt + 1)));
            }
        }
        self.inner.upsert_batch(documents).await
    }

    async fn create_indexes(&self) -> Result<(), StoreError> {
        self.inner.create_indexes().await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }

    async fn count_by_bank(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        self.inner.count_by_bank().await
    }

    async fn count_by_rating(&self) -> Result<BTreeMap<i32, u64>, StoreError> {
        self.inner.count_by_rating().await
    }

    async fn bank_comparison(&self) -> Result<Vec<BankStats>, StoreError> {
        self.inner.bank_comparison().await
    }

    async fn count_by_year(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        self.inner.count_by_year().await
    }

    async fn rating_distribution_by_bank(&self) -> Result<BTreeMap<String, BTreeMap<i32, u64>>, StoreError> {
        self.inner.rating_distribution_by_bank().await
    }

    async fn all_documents(&self) -> Result<Vec<ReviewDocument>, StoreError> {
        self.inner.all_documents().await
    }
}

fn raw(row: usize, value: serde_json::Value) -> RawRecord {
    RawRecord::from_json(row, value).unwrap()
}

fn cleaned_documents() -> (Vec<ReviewDocument>, usize) {
    let records = vec![
        raw(1, json!({"review": "Great app, fast!", "rating": 5, "date": "June 13, 2025", "bank": "Commercial Bank of Ethiopia"})),
        raw(2, json!({"review": "ok", "rating": "4", "date": "2025-06-13", "bank": "BOA"})),
        raw(3, json!({"review": "ok", "rating": 4, "date": "2025-06-13", "bank": "BOA"})),
        raw(4, json!({"review": "App crashes on login", "rating": 1, "date": "not a date", "bank": "Dashen"})),
        raw(5, json!({"review": "App crashes on login", "rating": 1, "date": "2025-06-12", "bank": "Dashen"})),
        raw(6, json!({"review": "Unknown bank review", "rating": 3, "date": "2025-06-12", "bank": "Awash"})),
        raw(7, json!({"review": "Transfers are slow", "rating": 2, "date": "2025-06-11", "bank": "CBE"})),
    ];

    let mut normalizer = Normalizer::new(NormalizerConfig::default());
    let normalized = normalizer.normalize_all(&records);
    assert_eq!(normalized.rejected.count(DropReason::InvalidDate), 1);
    assert_eq!(normalized.rejected.count(DropReason::UnknownBank), 1);

    let cleaned = Cleaner::new(CleanerConfig::default()).clean(normalized.reviews);
    assert_eq!(cleaned.report.dropped.count(DropReason::Duplicate), 1);

    let documents = cleaned.reviews.iter()
        .map(|review| into_review_document(review, "2025-06-14 09:00:00", "2025-06-14T09:05:00"))
        .collect::<Vec<_>>();

    (documents, records.len())
}

#[tokio::test]
async fn raw_records_flow_into_the_store() {
    let (documents, ingested) = cleaned_documents();
    assert_eq!(ingested, 7);
    assert_eq!(documents.len(), 4);

    let ids = documents.iter().map(|v| v.review_id()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["CBE_1", "BOA_1", "Dashen_1", "CBE_2"]);

    let store = MemoryStore::new();
    let uploader = Uploader::new(&store, UploadConfig { batch_size: 2, create_indexes: true }, RetryPolicy::immediate(3));

    let report = uploader.upload(&documents).await.unwrap();
    assert_eq!(report.stored, 4);

    let stats = uploader.verify().await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_bank.get("CBE"), Some(&2));
    assert_eq!(stats.by_bank.get("BOA"), Some(&1));
    assert_eq!(stats.by_rating.get(&1), Some(&1));
}

#[tokio::test]
async fn reuploading_is_idempotent() {
    let (documents, _) = cleaned_documents();
    let store = MemoryStore::new();
    let uploader = Uploader::new(&store, UploadConfig::default(), RetryPolicy::immediate(3));

    uploader.upload(&documents).await.unwrap();
    let before = store.documents();
    uploader.upload(&documents).await.unwrap();

    assert_eq!(store.count().await.unwrap(), documents.len() as u64);
    assert_eq!(store.documents(), before);
}

#[tokio::test]
async fn transient_write_failures_are_retried() {
    let (documents, _) = cleaned_documents();
    let store = FlakyStore::new("BOA_1", 2);
    let uploader = Uploader::new(&store, UploadConfig { batch_size: 1, create_indexes: false }, RetryPolicy::immediate(3));

    let report = uploader.upload(&documents).await.unwrap();

    assert!(report.failed.is_empty());
    assert_eq!(report.stored, 4);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_batches_are_reported_and_skipped() {
    let (documents, _) = cleaned_documents();
    let store = FlakyStore::new("BOA_1", usize::MAX);
    let uploader = Uploader::new(&store, UploadConfig { batch_size: 2, create_indexes: false }, RetryPolicy::immediate(3));

    let report = uploader.upload(&documents).await.unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(report.stored, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 0);
    assert_eq!(report.failed[0].review_ids, vec!["CBE_1".to_owned(), "BOA_1".to_owned()]);
    assert_eq!(report.failed_reviews(), 2);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn connection_failures_abort_the_upload() {
    let (documents, _) = cleaned_documents();
    let store = FlakyStore::disconnected();
    let uploader = Uploader::new(&store, UploadConfig::default(), RetryPolicy::immediate(3));

    let result = uploader.upload(&documents).await;

    assert!(matches!(result, Err(StoreError::Connection(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}
