use {
    std::{collections::{BTreeMap, BTreeSet, HashSet}, fmt},
    tracing::{info, warn},
    serde::Serialize,
    chrono::NaiveDate,
    crate::{
        entity::ReviewDocument,
        error::NormalizeError,
        review::{Bank, Review},
        upload::UploadReport,
    },
};

/// Banks with fewer cleaned reviews than this are reported as under-sampled.
pub const MIN_REVIEWS_PER_BANK: usize = 100;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingField,
    InvalidDate,
    InvalidRating,
    UnknownBank,
    RatingOutOfRange,
    TooShort,
    Duplicate,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingField => "missing field",
            DropReason::InvalidDate => "invalid date",
            DropReason::InvalidRating => "invalid rating",
            DropReason::UnknownBank => "unknown bank",
            DropReason::RatingOutOfRange => "rating out of range",
            DropReason::TooShort => "too short",
            DropReason::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&NormalizeError> for DropReason {
    fn from(err: &NormalizeError) -> Self {
        match err {
            NormalizeError::MissingField { .. } => DropReason::MissingField,
            NormalizeError::InvalidDate { .. } => DropReason::InvalidDate,
            NormalizeError::InvalidRating { .. } => DropReason::InvalidRating,
            NormalizeError::UnknownBank { .. } => DropReason::UnknownBank,
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct DropTally {
    counts: BTreeMap<DropReason, usize>,
}

impl DropTally {
    pub fn record(&mut self, reason: DropReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn count(&self, reason: DropReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn merge(&mut self, other: &DropTally) {
        for (reason, count) in &other.counts {
            *self.counts.entry(*reason).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DropReason, usize)> + '_ {
        self.counts.iter().map(|(reason, count)| (*reason, *count))
    }
}

/// Counts reported at the end of a pipeline run.
///
/// Stored and failed reviews are tracked by `review_id`, so writing the same
/// reviews twice in one run counts them once.
#[derive(Serialize, Debug, Clone, Default)]
pub struct RunSummary {
    pub ingested: usize,
    pub dropped: DropTally,
    pub cleaned: usize,
    pub analyzed: usize,
    #[serde(skip)]
    stored_ids: BTreeSet<String>,
    #[serde(skip)]
    failed_ids: BTreeSet<String>,
}

impl RunSummary {
    /// Records the outcome of uploading `documents`. A review that failed in
    /// an earlier upload and is stored now is no longer counted as failed.
    pub fn record_upload(&mut self, documents: &[ReviewDocument], report: &UploadReport) {
        let failed: HashSet<&str> = report.failed.iter()
            .flat_map(|batch| batch.review_ids.iter().map(|v| v.as_str()))
            .collect();

        for document in documents {
            let review_id = document.review_id();
            if failed.contains(review_id) {
                if !self.stored_ids.contains(review_id) {
                    self.failed_ids.insert(review_id.to_owned());
                }
            } else {
                self.failed_ids.remove(review_id);
                self.stored_ids.insert(review_id.to_owned());
            }
        }
    }

    pub fn stored(&self) -> usize {
        self.stored_ids.len()
    }

    pub fn failed(&self) -> usize {
        self.failed_ids.len()
    }

    pub fn log(&self) {
        info!("run summary: ingested {}, dropped {}, cleaned {}, stored {}, failed {}, analyzed {}",
            self.ingested, self.dropped.total(), self.cleaned, self.stored(), self.failed(), self.analyzed);
        for (reason, count) in self.dropped.iter() {
            info!("  dropped ({}): {}", reason, count);
        }
    }
}

/// Shape of the cleaned dataset, reported after preprocessing.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub total_reviews: usize,
    /// Earliest and latest real review date, imputed dates are left out.
    pub date_range: Option<(String, String)>,
    pub by_bank: BTreeMap<Bank, usize>,
    pub by_rating: BTreeMap<i32, usize>,
    pub average_length: f64,
    pub average_word_count: f64,
    pub shortest: usize,
    pub longest: usize,
}

impl DatasetSummary {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut summary = DatasetSummary {
            total_reviews: reviews.len(),
            ..DatasetSummary::default()
        };
        if reviews.is_empty() {
            return summary;
        }

        let mut dates = reviews.iter()
            .map(|v| v.review_date())
            .filter(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok());
        if let Some(first) = dates.next() {
            let (earliest, latest) = dates.fold((first, first), |(earliest, latest), date| (earliest.min(date), latest.max(date)));
            summary.date_range = Some((earliest.to_owned(), latest.to_owned()));
        }

        for review in reviews {
            *summary.by_bank.entry(review.bank_name()).or_insert(0) += 1;
            *summary.by_rating.entry(review.rating()).or_insert(0) += 1;
        }

        let lengths = reviews.iter().map(|v| v.review_length());
        summary.shortest = lengths.clone().min().unwrap_or(0);
        summary.longest = lengths.clone().max().unwrap_or(0);
        summary.average_length = lengths.sum::<usize>() as f64 / reviews.len() as f64;
        summary.average_word_count = reviews.iter().map(|v| v.word_count()).sum::<usize>() as f64 / reviews.len() as f64;

        summary
    }

    /// Banks below `MIN_REVIEWS_PER_BANK`, including banks with no reviews at all.
    pub fn under_sampled_banks(&self) -> Vec<Bank> {
        Bank::ALL.iter()
            .copied()
            .filter(|bank| self.by_bank.get(bank).copied().unwrap_or(0) < MIN_REVIEWS_PER_BANK)
            .collect()
    }

    pub fn log(&self) {
        info!("cleaned dataset: {} reviews", self.total_reviews);
        if let Some((earliest, latest)) = &self.date_range {
            info!("  dates: {} to {}", earliest, latest);
        }

        let percentage = |count: usize| 100.0 * count as f64 / self.total_reviews.max(1) as f64;
        for (bank, count) in &self.by_bank {
            info!("  {}: {} reviews ({:.1}%)", bank.full_name(), count, percentage(*count));
        }
        for (rating, count) in &self.by_rating {
            info!("  {} stars: {} reviews ({:.1}%)", rating, count, percentage(*count));
        }
        info!("  average length {:.1} chars, {:.1} words, shortest {}, longest {}",
            self.average_length, self.average_word_count, self.shortest, self.longest);

        for bank in self.under_sampled_banks() {
            warn!("{} has fewer than {} reviews", bank.full_name(), MIN_REVIEWS_PER_BANK);
        }
    }
}
