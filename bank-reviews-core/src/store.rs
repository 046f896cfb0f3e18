use {
    std::{collections::BTreeMap, sync::Mutex},
    async_trait::async_trait,
    serde::Serialize,
    crate::{
        entity::ReviewDocument,
        error::StoreError,
    },
};

/// Secondary index on the review collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const REVIEW_INDEXES: &[IndexSpec] = &[
    IndexSpec { name: "bank_name", columns: &["bank_name"] },
    IndexSpec { name: "rating", columns: &["rating"] },
    IndexSpec { name: "review_date", columns: &["review_date"] },
    IndexSpec { name: "bank_rating", columns: &["bank_name", "rating"] },
    IndexSpec { name: "date_bank", columns: &["review_date", "bank_name"] },
];

/// Per bank aggregate over the stored reviews.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BankStats {
    pub bank_name: String,
    pub total_reviews: u64,
    pub average_rating: f64,
    pub average_review_length: f64,
}

/// Best rated bank first.
pub fn sort_bank_stats(stats: &mut [BankStats]) {
    stats.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating).then_with(|| a.bank_name.cmp(&b.bank_name)));
}

/// Year part of a `YYYY-MM-DD` review date, imputed dates give `0000`.
pub fn review_year(review_date: &str) -> String {
    review_date.chars().take(4).collect()
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Creates the collection if it does not exist yet.
    async fn ensure_collection(&self) -> Result<(), StoreError>;

    /// Inserts or replaces documents by `review_id`, returns how many were written.
    async fn upsert_batch(&self, documents: &[ReviewDocument]) -> Result<usize, StoreError>;

    async fn create_indexes(&self) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn count_by_bank(&self) -> Result<BTreeMap<String, u64>, StoreError>;

    async fn count_by_rating(&self) -> Result<BTreeMap<i32, u64>, StoreError>;

    /// Review count, average rating and average length per bank, best rated first.
    async fn bank_comparison(&self) -> Result<Vec<BankStats>, StoreError>;

    async fn count_by_year(&self) -> Result<BTreeMap<String, u64>, StoreError>;

    async fn rating_distribution_by_bank(&self) -> Result<BTreeMap<String, BTreeMap<i32, u64>>, StoreError>;

    /// Every stored document, ordered by `review_id`.
    async fn all_documents(&self) -> Result<Vec<ReviewDocument>, StoreError>;
}

/// Store kept in process memory, used for dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, ReviewDocument>>,
    indexes: Mutex<Vec<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, review_id: &str) -> Option<ReviewDocument> {
        self.documents.lock().ok()?.get(review_id).cloned()
    }

    pub fn documents(&self) -> Vec<ReviewDocument> {
        self.documents.lock()
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn index_names(&self) -> Vec<&'static str> {
        self.indexes.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn with_documents<T, F: FnOnce(&mut BTreeMap<String, ReviewDocument>) -> T>(&self, f: F) -> Result<T, StoreError> {
        let mut documents = self.documents.lock()
            .map_err(|_| StoreError::Write("memory store lock poisoned".to_owned()))?;
        Ok(f(&mut documents))
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_batch(&self, documents: &[ReviewDocument]) -> Result<usize, StoreError> {
        self.with_documents(|stored| {
            for document in documents {
                let document = match stored.get(document.review_id()) {
                    Some(existing) => document.clone().merged_over(existing),
                    None => document.clone(),
                };
                stored.insert(document.review_id().to_owned(), document);
            }
            documents.len()
        })
    }

    async fn create_indexes(&self) -> Result<(), StoreError> {
        let mut indexes = self.indexes.lock()
            .map_err(|_| StoreError::Write("memory store lock poisoned".to_owned()))?;
        for index in REVIEW_INDEXES {
            if !indexes.contains(&index.name) {
                indexes.push(index.name);
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.with_documents(|stored| stored.len() as u64)
    }

    async fn count_by_bank(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        self.with_documents(|stored| {
            let mut counts = BTreeMap::new();
            for document in stored.values() {
                *counts.entry(document.bank_name().to_owned()).or_insert(0) += 1;
            }
            counts
        })
    }

    async fn count_by_rating(&self) -> Result<BTreeMap<i32, u64>, StoreError> {
        self.with_documents(|stored| {
            let mut counts = BTreeMap::new();
            for document in stored.values() {
                *counts.entry(document.rating()).or_insert(0) += 1;
            }
            counts
        })
    }

    async fn bank_comparison(&self) -> Result<Vec<BankStats>, StoreError> {
        self.with_documents(|stored| {
            let mut totals: BTreeMap<&str, (u64, i64, i64)> = BTreeMap::new();
            for document in stored.values() {
                let entry = totals.entry(document.bank_name()).or_insert((0, 0, 0));
                entry.0 += 1;
                entry.1 += document.rating() as i64;
                entry.2 += document.review_length();
            }

            let mut stats = totals.into_iter()
                .map(|(bank_name, (count, ratings, lengths))| BankStats {
                    bank_name: bank_name.to_owned(),
                    total_reviews: count,
                    average_rating: ratings as f64 / count as f64,
                    average_review_length: lengths as f64 / count as f64,
                })
                .collect::<Vec<_>>();
            sort_bank_stats(&mut stats);
            stats
        })
    }

    async fn count_by_year(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        self.with_documents(|stored| {
            let mut counts = BTreeMap::new();
            for document in stored.values() {
                *counts.entry(review_year(document.review_date())).or_insert(0) += 1;
            }
            counts
        })
    }

    async fn rating_distribution_by_bank(&self) -> Result<BTreeMap<String, BTreeMap<i32, u64>>, StoreError> {
        self.with_documents(|stored| {
            let mut counts: BTreeMap<String, BTreeMap<i32, u64>> = BTreeMap::new();
            for document in stored.values() {
                *counts.entry(document.bank_name().to_owned())
                    .or_default()
                    .entry(document.rating())
                    .or_insert(0) += 1;
            }
            counts
        })
    }

    async fn all_documents(&self) -> Result<Vec<ReviewDocument>, StoreError> {
        self.with_documents(|stored| stored.values().cloned().collect())
    }
}
