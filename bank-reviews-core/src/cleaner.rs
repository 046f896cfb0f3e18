use {
    std::collections::HashSet,
    tracing::info,
    serde::{Serialize, Deserialize},
    crate::{
        review::{Bank, Review},
        summary::{DropReason, DropTally},
    },
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// How review texts are compared when looking for duplicates.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// Cleaned text must be identical.
    Exact,
    /// Case and punctuation are ignored, digits and links still count.
    Normalized,
}

impl Default for DedupKey {
    fn default() -> Self {
        DedupKey::Normalized
    }
}

#[derive(Debug, Clone)]
pub struct CleanerConfig {
    pub min_review_length: usize,
    pub dedup_key: DedupKey,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            min_review_length: 2,
            dedup_key: DedupKey::Normalized,
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub ingested: usize,
    pub retained: usize,
    pub dropped: DropTally,
}

impl CleaningReport {
    pub fn quality_score(&self) -> f64 {
        if self.ingested == 0 {
            1.0
        } else {
            self.retained as f64 / self.ingested as f64
        }
    }
}

pub struct CleaningOutcome {
    pub reviews: Vec<Review>,
    pub report: CleaningReport,
}

pub struct Cleaner {
    config: CleanerConfig,
}

impl Cleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self {
            config,
        }
    }

    pub fn clean(&self, reviews: Vec<Review>) -> CleaningOutcome {
        let mut report = CleaningReport {
            ingested: reviews.len(),
            ..CleaningReport::default()
        };

        let mut seen_texts: HashSet<(Bank, String)> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut retained = Vec::with_capacity(reviews.len());

        for review in reviews {
            let text = clean_text(review.review_text());
            let review = if text == review.review_text() { review } else { review.with_review_text(text) };

            let drop_reason = if !(MIN_RATING..=MAX_RATING).contains(&review.rating()) {
                Some(DropReason::RatingOutOfRange)
            } else if review.review_length() < self.config.min_review_length.max(1) {
                Some(DropReason::TooShort)
            } else if seen_ids.contains(review.review_id()) {
                Some(DropReason::Duplicate)
            } else if !seen_texts.insert((review.bank_name(), self.dedup_key(review.review_text()))) {
                Some(DropReason::Duplicate)
            } else {
                None
            };

            match drop_reason {
                Some(reason) => {
                    info!("dropping review {}: {}", review.review_id(), reason);
                    report.dropped.record(reason);
                },
                None => {
                    seen_ids.insert(review.review_id().to_owned());
                    retained.push(review);
                },
            }
        }

        report.retained = retained.len();
        info!("cleaning retained {} of {} reviews (quality score {:.2})", report.retained, report.ingested, report.quality_score());

        CleaningOutcome {
            reviews: retained,
            report,
        }
    }

    fn dedup_key(&self, text: &str) -> String {
        match self.config.dedup_key {
            DedupKey::Exact => text.to_owned(),
            DedupKey::Normalized => {
                let normalized = normalized_key(text);
                // texts made only of punctuation or emoji would all collide
                if normalized.is_empty() { text.to_lowercase() } else { normalized }
            },
        }
    }
}

/// Strips control characters and collapses whitespace runs into one space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased `text` with punctuation removed and whitespace collapsed.
pub fn normalized_key(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
