use {
    std::{fs::{self, File}, io::{BufRead, BufReader}, path::Path},
    tracing::{info, warn},
    anyhow::{Context, Result, anyhow},
    serde::{Serialize, Deserialize},
    crate::{
        entity::ReviewDocument,
        raw::RawRecord,
        review::{Bank, Review},
    },
};

pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Row of the cleaned reviews CSV.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CleanedReviewRow {
    pub review_id: String,
    pub review_text: String,
    pub rating: i32,
    pub review_date: String,
    pub bank_name: Bank,
    pub source: String,
    pub review_length: usize,
    pub word_count: usize,
    #[serde(default)]
    pub processed_at: String,
}

impl CleanedReviewRow {
    pub fn from_review(review: &Review, processed_at: &str) -> Self {
        Self {
            review_id: review.review_id().to_owned(),
            review_text: review.review_text().to_owned(),
            rating: review.rating(),
            review_date: review.review_date().to_owned(),
            bank_name: review.bank_name(),
            source: review.source().to_owned(),
            review_length: review.review_length(),
            word_count: review.word_count(),
            processed_at: processed_at.to_owned(),
        }
    }

    /// Derived fields are recomputed from the text; stored values are only
    /// compared.
    pub fn into_review(self) -> Review {
        let review = Review::new(self.review_id, self.review_text, self.rating, self.review_date, self.bank_name, self.source);

        if review.review_length() != self.review_length || review.word_count() != self.word_count {
            warn!("derived fields of review {} did not match its text (stored length {}, words {}), recomputed",
                review.review_id(), self.review_length, self.word_count);
        }

        review
    }
}

/// Loads raw scraper output: JSON lines for `.json`/`.jsonl` files, CSV with
/// a header row otherwise.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    info!("loading raw reviews from {}", path.display());

    let records = match path.extension().and_then(|v| v.to_str()) {
        Some("json") | Some("jsonl") => load_raw_json_lines(path)?,
        _ => load_raw_csv(path)?,
    };

    info!("loaded {} raw records", records.len());
    Ok(records)
}

fn load_raw_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();

    reader.records()
        .enumerate()
        .map(|(index, record)| {
            let record = record.with_context(|| format!("failed to read row {} of {}", index + 1, path.display()))?;
            Ok(RawRecord::from_csv(index + 1, &headers, &record))
        })
        .collect()
}

fn load_raw_json_lines(path: &Path) -> Result<Vec<RawRecord>> {
    let reader = BufReader::new(File::open(path).with_context(|| format!("failed to open {}", path.display()))?);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let value = serde_json::from_str(&line).with_context(|| format!("invalid json on line {}", index + 1))?;
        let record = RawRecord::from_json(index + 1, value).ok_or_else(|| anyhow!("line {} is not a json object", index + 1))?;
        records.push(record);
    }

    Ok(records)
}

pub fn save_cleaned_reviews(path: &Path, reviews: &[Review], processed_at: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    for review in reviews {
        writer.serialize(CleanedReviewRow::from_review(review, processed_at))?;
    }
    writer.flush()?;

    info!("saved {} cleaned reviews to {}", reviews.len(), path.display());
    Ok(())
}

pub fn load_cleaned_reviews(path: &Path) -> Result<Vec<Review>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;

    let reviews = reader.deserialize::<CleanedReviewRow>()
        .map(|row| row.map(CleanedReviewRow::into_review).map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("failed to read cleaned reviews from {}", path.display()))?;

    info!("loaded {} cleaned reviews from {}", reviews.len(), path.display());
    Ok(reviews)
}

/// Writes stored documents as one pretty-printed JSON array.
pub fn export_documents(path: &Path, documents: &[ReviewDocument]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, documents).with_context(|| format!("failed to write {}", path.display()))?;

    info!("exported {} reviews to {}", documents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        std::io::Write,
        crate::{entity::into_review_document, review::DEFAULT_SOURCE},
        super::*,
    };

    #[test]
    fn cleaned_reviews_survive_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/cleaned.csv");
        let reviews = vec![
            Review::new("CBE_1".to_owned(), "Great app, fast!".to_owned(), 5, "2025-06-13".to_owned(), Bank::Cbe, DEFAULT_SOURCE.to_owned()),
            Review::new("BOA_1".to_owned(), "Login \"fails\", again".to_owned(), 1, "2025-06-14".to_owned(), Bank::Boa, DEFAULT_SOURCE.to_owned()),
        ];

        save_cleaned_reviews(&path, &reviews, "2025-06-15 10:00:00").unwrap();

        assert_eq!(load_cleaned_reviews(&path).unwrap(), reviews);
    }

    #[test]
    fn drifted_derived_fields_are_recomputed() {
        let row = CleanedReviewRow {
            review_id: "CBE_1".to_owned(),
            review_text: "Great app, fast!".to_owned(),
            rating: 5,
            review_date: "2025-06-13".to_owned(),
            bank_name: Bank::Cbe,
            source: DEFAULT_SOURCE.to_owned(),
            review_length: 99,
            word_count: 42,
            processed_at: String::new(),
        };

        let review = row.into_review();

        assert_eq!(review.review_length(), 16);
        assert_eq!(review.word_count(), 3);
    }

    #[test]
    fn loads_raw_csv_and_json_lines() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("raw.csv");
        fs::write(&csv_path, "review,rating,date,bank,source\nGood app,5,2025-06-13,CBE,Google Play Store\nBad,,2025-06-13,BOA,\n").unwrap();

        let json_path = dir.path().join("raw.jsonl");
        let mut file = File::create(&json_path).unwrap();
        writeln!(file, r#"{{"text": "Great app, fast!", "rating": 5, "date": "June 13, 2025", "bank": "CBE"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"text": "Slow", "rating": 2, "date": "June 14, 2025", "bank": "BOA"}}"#).unwrap();

        let from_csv = load_raw_records(&csv_path).unwrap();
        assert_eq!(from_csv.len(), 2);
        assert_eq!(from_csv[1].row(), 2);
        assert_eq!(from_csv[1].field(&["rating"]), None);

        let from_json = load_raw_records(&json_path).unwrap();
        assert_eq!(from_json.len(), 2);
        assert_eq!(from_json[1].row(), 3);
    }

    #[test]
    fn exports_documents_as_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export/reviews.json");
        let review = Review::new("CBE_1".to_owned(), "Great app, fast!".to_owned(), 5, "2025-06-13".to_owned(), Bank::Cbe, DEFAULT_SOURCE.to_owned());
        let documents = vec![into_review_document(&review, "2025-06-14 09:00:00", "2025-06-14T09:05:00")];

        export_documents(&path, &documents).unwrap();

        let exported: Vec<ReviewDocument> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported, documents);
    }
}
