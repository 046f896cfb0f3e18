use {
    std::collections::BTreeMap,
    tracing::{info, warn, error},
    serde::Serialize,
    crate::{
        entity::ReviewDocument,
        error::StoreError,
        retry::RetryPolicy,
        store::{BankStats, ReviewStore},
    },
};

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub batch_size: usize,
    pub create_indexes: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            create_indexes: true,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FailedBatch {
    pub index: usize,
    pub review_ids: Vec<String>,
    pub error: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub batches: usize,
    pub stored: usize,
    pub failed: Vec<FailedBatch>,
}

impl UploadReport {
    pub fn failed_reviews(&self) -> usize {
        self.failed.iter().map(|v| v.review_ids.len()).sum()
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total: u64,
    pub by_bank: BTreeMap<String, u64>,
    pub by_rating: BTreeMap<i32, u64>,
    pub by_year: BTreeMap<String, u64>,
    pub banks: Vec<BankStats>,
    pub ratings_by_bank: BTreeMap<String, BTreeMap<i32, u64>>,
}

pub struct Uploader<'a, S: ReviewStore + ?Sized> {
    store: &'a S,
    config: UploadConfig,
    retry: RetryPolicy,
}

impl<'a, S: ReviewStore + ?Sized> Uploader<'a, S> {
    pub fn new(store: &'a S, config: UploadConfig, retry: RetryPolicy) -> Self {
        Self {
            store,
            config,
            retry,
        }
    }

    /// Writes documents in batches. A batch that keeps failing after all
    /// retries is reported and skipped, connection failures abort the upload.
    pub async fn upload(&self, documents: &[ReviewDocument]) -> Result<UploadReport, StoreError> {
        self.store.ensure_collection().await?;

        let mut report = UploadReport::default();
        for (index, batch) in documents.chunks(self.config.batch_size.max(1)).enumerate() {
            report.batches += 1;

            match self.upload_batch(index, batch).await? {
                Ok(written) => {
                    report.stored += written;
                    info!("uploaded batch {} ({} reviews, {} total)", index, written, report.stored);
                },
                Err(reason) => {
                    let review_ids = batch.iter().map(|v| v.review_id().to_owned()).collect::<Vec<_>>();
                    error!("giving up on batch {} with reviews {:?}: {}", index, review_ids, reason);
                    report.failed.push(FailedBatch {
                        index,
                        review_ids,
                        error: reason,
                    });
                },
            }
        }

        if self.config.create_indexes {
            self.store.create_indexes().await?;
        }

        info!("upload finished: {} stored, {} failed in {} batches", report.stored, report.failed_reviews(), report.batches);
        Ok(report)
    }

    // outer error aborts the upload, inner error marks only this batch failed
    async fn upload_batch(&self, index: usize, batch: &[ReviewDocument]) -> Result<Result<usize, String>, StoreError> {
        let mut attempt = 1;

        loop {
            match self.store.upsert_batch(batch).await {
                Ok(written) => return Ok(Ok(written)),
                Err(StoreError::Write(reason)) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff(attempt);
                    warn!("batch {} failed on attempt {} ({}), retrying in {:?}", index, attempt, reason, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(StoreError::Write(reason)) => return Ok(Err(reason)),
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn verify(&self) -> Result<StoreStats, StoreError> {
        let stats = StoreStats {
            total: self.store.count().await?,
            by_bank: self.store.count_by_bank().await?,
            by_rating: self.store.count_by_rating().await?,
            by_year: self.store.count_by_year().await?,
            banks: self.store.bank_comparison().await?,
            ratings_by_bank: self.store.rating_distribution_by_bank().await?,
        };

        info!("review store holds {} reviews", stats.total);
        for (bank, count) in &stats.by_bank {
            info!("  {}: {}", bank, count);
        }
        for (rating, count) in &stats.by_rating {
            info!("  rating {}: {}", rating, count);
        }
        for (year, count) in &stats.by_year {
            info!("  {}: {} reviews", year, count);
        }
        for bank in &stats.banks {
            info!("  {}: average rating {:.2}, {} reviews, average length {:.1} chars",
                bank.bank_name, bank.average_rating, bank.total_reviews, bank.average_review_length);
        }
        for (bank, ratings) in &stats.ratings_by_bank {
            let distribution = ratings.iter().map(|(rating, count)| format!("{}: {}", rating, count)).collect::<Vec<_>>();
            info!("  {} ratings: {}", bank, distribution.join(", "));
        }

        Ok(stats)
    }

    pub async fn export(&self) -> Result<Vec<ReviewDocument>, StoreError> {
        let documents = self.store.all_documents().await?;
        info!("read {} reviews for export", documents.len());
        Ok(documents)
    }
}
