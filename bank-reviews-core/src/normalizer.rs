use {
    std::collections::HashMap,
    tracing::{info, warn},
    serde::Deserialize,
    serde_json::Value,
    crate::{
        dates::normalize_review_date,
        error::NormalizeError,
        raw::RawRecord,
        review::{Bank, Review, DEFAULT_SOURCE},
        summary::{DropReason, DropTally},
    },
};

const TEXT_FIELDS: &[&str] = &["review_text", "review", "text", "content"];
const RATING_FIELDS: &[&str] = &["rating", "score", "stars"];
const DATE_FIELDS: &[&str] = &["review_date", "date", "at"];
const BANK_FIELDS: &[&str] = &["bank_name", "bank"];
const SOURCE_FIELDS: &[&str] = &["source"];
const ID_FIELDS: &[&str] = &["review_id", "reviewId", "id"];

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingDatePolicy {
    Reject,
    Impute,
}

impl Default for MissingDatePolicy {
    fn default() -> Self {
        MissingDatePolicy::Reject
    }
}

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub missing_date: MissingDatePolicy,
    pub date_sentinel: String,
    pub default_source: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            missing_date: MissingDatePolicy::Reject,
            date_sentinel: "0000-00-00".to_owned(),
            default_source: DEFAULT_SOURCE.to_owned(),
        }
    }
}

pub struct NormalizationOutcome {
    pub reviews: Vec<Review>,
    pub rejected: DropTally,
}

/// Turns raw scraper records into canonical reviews.
///
/// Review ids missing from the input are assigned as `{bank}_{n}`, with `n`
/// counting records of that bank in input order.
pub struct Normalizer {
    config: NormalizerConfig,
    sequences: HashMap<Bank, u64>,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            sequences: HashMap::new(),
        }
    }

    pub fn normalize(&mut self, raw: &RawRecord) -> Result<Review, NormalizeError> {
        let text = raw.text_field(TEXT_FIELDS).ok_or(NormalizeError::MissingField { field: "review_text" })?;
        let rating = parse_rating(raw.field(RATING_FIELDS).ok_or(NormalizeError::MissingField { field: "rating" })?)?;
        let bank: Bank = raw.text_field(BANK_FIELDS).ok_or(NormalizeError::MissingField { field: "bank_name" })?.parse()?;

        let review_date = match raw.text_field(DATE_FIELDS) {
            Some(value) => normalize_review_date(&value).ok_or(NormalizeError::InvalidDate { value })?,
            None => match self.config.missing_date {
                MissingDatePolicy::Reject => return Err(NormalizeError::MissingField { field: "review_date" }),
                MissingDatePolicy::Impute => self.config.date_sentinel.clone(),
            },
        };

        let source = raw.text_field(SOURCE_FIELDS).unwrap_or_else(|| self.config.default_source.clone());

        let sequence = self.sequences.entry(bank).or_insert(0);
        *sequence += 1;
        let review_id = raw.text_field(ID_FIELDS).unwrap_or_else(|| format!("{}_{}", bank.code(), sequence));

        Ok(Review::new(review_id, text, rating, review_date, bank, source.trim().to_owned()))
    }

    pub fn normalize_all(&mut self, records: &[RawRecord]) -> NormalizationOutcome {
        let mut reviews = Vec::with_capacity(records.len());
        let mut rejected = DropTally::default();

        for record in records {
            match self.normalize(record) {
                Ok(review) => reviews.push(review),
                Err(err) => {
                    warn!("dropping row {}: {}", record.row(), err);
                    rejected.record(DropReason::from(&err));
                },
            }
        }

        info!("normalized {} of {} raw records", reviews.len(), records.len());

        NormalizationOutcome {
            reviews,
            rejected,
        }
    }
}

fn parse_rating(value: &Value) -> Result<i32, NormalizeError> {
    let invalid = || NormalizeError::InvalidRating { value: value.to_string() };

    let number = match value {
        Value::Number(number) => number.as_f64().ok_or_else(invalid)?,
        Value::String(text) => text.trim().parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if !number.is_finite() || number.fract() != 0.0 || number.abs() > i32::MAX as f64 {
        return Err(invalid());
    }

    Ok(number as i32)
}

#[cfg(test)]
mod tests {
    use {
        serde_json::json,
        super::*,
    };

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_json(1, value).unwrap()
    }

    #[test]
    fn normalizes_scraper_record() {
        let mut normalizer = Normalizer::new(NormalizerConfig::default());

        let review = normalizer.normalize(&raw(json!({
            "text": "Great app, fast!",
            "rating": 5,
            "date": "June 13, 2025",
            "bank": "CBE",
        }))).unwrap();

        assert_eq!(review.review_id(), "CBE_1");
        assert_eq!(review.review_date(), "2025-06-13");
        assert_eq!(review.rating(), 5);
        assert_eq!(review.word_count(), 3);
        assert_eq!(review.bank_name(), Bank::Cbe);
        assert_eq!(review.source(), DEFAULT_SOURCE);
    }

    #[test]
    fn missing_rating_is_rejected() {
        let mut normalizer = Normalizer::new(NormalizerConfig::default());

        let err = normalizer.normalize(&raw(json!({
            "text": "Great app, fast!",
            "date": "June 13, 2025",
            "bank": "CBE",
        }))).unwrap_err();

        assert_eq!(err, NormalizeError::MissingField { field: "rating" });
    }

    #[test]
    fn invalid_date_is_rejected() {
        let mut normalizer = Normalizer::new(NormalizerConfig::default());

        let err = normalizer.normalize(&raw(json!({
            "review": "Nice",
            "rating": "4",
            "date": "last tuesday",
            "bank": "BOA",
        }))).unwrap_err();

        assert_eq!(err, NormalizeError::InvalidDate { value: "last tuesday".to_owned() });
    }

    #[test]
    fn missing_date_can_be_imputed() {
        let mut normalizer = Normalizer::new(NormalizerConfig {
            missing_date: MissingDatePolicy::Impute,
            ..NormalizerConfig::default()
        });

        let review = normalizer.normalize(&raw(json!({
            "review": "Nice",
            "rating": 4.0,
            "bank": "Dashen",
        }))).unwrap();

        assert_eq!(review.review_date(), "0000-00-00");
        assert_eq!(review.rating(), 4);
    }

    #[test]
    fn fractional_or_textual_ratings_are_invalid() {
        assert!(matches!(parse_rating(&json!(4.5)), Err(NormalizeError::InvalidRating { .. })));
        assert!(matches!(parse_rating(&json!("five")), Err(NormalizeError::InvalidRating { .. })));
        assert_eq!(parse_rating(&json!(" 3 ")).unwrap(), 3);
        // out of range ratings are left for the cleaner
        assert_eq!(parse_rating(&json!(7)).unwrap(), 7);
    }

    #[test]
    fn ids_count_per_bank_and_explicit_ids_win() {
        let mut normalizer = Normalizer::new(NormalizerConfig::default());
        let record = |bank: &str| raw(json!({ "review": "ok", "rating": 3, "date": "2025-01-01", "bank": bank }));

        let ids: Vec<String> = ["CBE", "BOA", "CBE"].iter()
            .map(|bank| normalizer.normalize(&record(bank)).unwrap().review_id().to_owned())
            .collect();
        assert_eq!(ids, vec!["CBE_1", "BOA_1", "CBE_2"]);

        let explicit = normalizer.normalize(&raw(json!({
            "reviewId": "gp:AOqpTOE", "review": "ok", "rating": 3, "date": "2025-01-01", "bank": "BOA",
        }))).unwrap();
        assert_eq!(explicit.review_id(), "gp:AOqpTOE");
    }

    #[test]
    fn normalize_all_counts_rejections() {
        let mut normalizer = Normalizer::new(NormalizerConfig::default());
        let records = vec![
            RawRecord::from_json(1, json!({ "review": "good", "rating": 5, "date": "2025-01-01", "bank": "CBE" })).unwrap(),
            RawRecord::from_json(2, json!({ "review": "good", "date": "2025-01-01", "bank": "CBE" })).unwrap(),
            RawRecord::from_json(3, json!({ "review": "good", "rating": 5, "date": "never", "bank": "CBE" })).unwrap(),
            RawRecord::from_json(4, json!({ "review": "good", "rating": 5, "date": "2025-01-01", "bank": "Awash" })).unwrap(),
        ];

        let outcome = normalizer.normalize_all(&records);

        assert_eq!(outcome.reviews.len(), 1);
        assert_eq!(outcome.rejected.count(DropReason::MissingField), 1);
        assert_eq!(outcome.rejected.count(DropReason::InvalidDate), 1);
        assert_eq!(outcome.rejected.count(DropReason::UnknownBank), 1);
        assert_eq!(outcome.rejected.total(), 3);
    }
}
