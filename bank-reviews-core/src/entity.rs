use {
    typed_builder::TypedBuilder,
    serde::{Serialize, Deserialize},
    crate::review::{Review, SentimentLabel},
};

pub const DATA_VERSION: &str = "1.0";

/// Review as stored in the review collection, keyed by `review_id`.
#[derive(TypedBuilder, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewDocument {
    review_id: String,
    review_text: String,
    rating: i32,
    review_date: String,
    bank_name: String,
    source: String,
    review_length: i64,
    word_count: i64,
    #[builder(default)]
    sentiment_label: Option<String>,
    #[builder(default)]
    sentiment_confidence: Option<f64>,
    #[builder(default)]
    themes: Option<Vec<String>>,
    processed_at: String,
    uploaded_at: String,
    #[builder(default = DATA_VERSION.to_owned())]
    data_version: String,
}

impl ReviewDocument {
    pub fn review_id(&self) -> &str {
        &self.review_id
    }

    pub fn review_text(&self) -> &str {
        &self.review_text
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn review_date(&self) -> &str {
        &self.review_date
    }

    pub fn bank_name(&self) -> &str {
        &self.bank_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn review_length(&self) -> i64 {
        self.review_length
    }

    pub fn word_count(&self) -> i64 {
        self.word_count
    }

    pub fn sentiment_label(&self) -> Option<&str> {
        self.sentiment_label.as_deref()
    }

    pub fn sentiment_confidence(&self) -> Option<f64> {
        self.sentiment_confidence
    }

    pub fn themes(&self) -> Option<&[String]> {
        self.themes.as_deref()
    }

    pub fn processed_at(&self) -> &str {
        &self.processed_at
    }

    pub fn uploaded_at(&self) -> &str {
        &self.uploaded_at
    }

    pub fn data_version(&self) -> &str {
        &self.data_version
    }

    pub fn with_analysis(mut self, label: SentimentLabel, confidence: f32, themes: Vec<String>) -> Self {
        self.sentiment_label = Some(label.as_str().to_owned());
        self.sentiment_confidence = Some(confidence as f64);
        self.themes = Some(themes);
        self
    }

    /// Upsert semantics: analysis fields already stored survive an update
    /// that carries none.
    pub fn merged_over(mut self, existing: &ReviewDocument) -> Self {
        if self.sentiment_label.is_none() {
            self.sentiment_label = existing.sentiment_label.clone();
        }
        if self.sentiment_confidence.is_none() {
            self.sentiment_confidence = existing.sentiment_confidence;
        }
        if self.themes.is_none() {
            self.themes = existing.themes.clone();
        }
        self
    }
}

pub fn into_review_document(review: &Review, processed_at: &str, uploaded_at: &str) -> ReviewDocument {
    ReviewDocument::builder()
        .review_id(review.review_id().to_owned())
        .review_text(review.review_text().to_owned())
        .rating(review.rating())
        .review_date(review.review_date().to_owned())
        .bank_name(review.bank_name().code().to_owned())
        .source(review.source().to_owned())
        .review_length(review.review_length() as i64)
        .word_count(review.word_count() as i64)
        .processed_at(processed_at.to_owned())
        .uploaded_at(uploaded_at.to_owned())
        .build()
}

#[cfg(test)]
mod tests {
    use {
        crate::review::{Bank, DEFAULT_SOURCE},
        super::*,
    };

    fn document() -> ReviewDocument {
        let review = Review::new("CBE_1".to_owned(), "Great app, fast!".to_owned(), 5, "2025-06-13".to_owned(), Bank::Cbe, DEFAULT_SOURCE.to_owned());
        into_review_document(&review, "2025-06-14 09:00:00", "2025-06-14T09:05:00")
    }

    #[test]
    fn document_mirrors_review() {
        let document = document();

        assert_eq!(document.review_id(), "CBE_1");
        assert_eq!(document.bank_name(), "CBE");
        assert_eq!(document.review_length(), 16);
        assert_eq!(document.word_count(), 3);
        assert_eq!(document.data_version(), DATA_VERSION);
        assert_eq!(document.sentiment_label(), None);
    }

    #[test]
    fn merge_keeps_stored_analysis() {
        let analyzed = document().with_analysis(SentimentLabel::Positive, 0.9, vec!["Performance Issues".to_owned()]);

        let merged = document().merged_over(&analyzed);

        assert_eq!(merged.sentiment_label(), Some("positive"));
        assert_eq!(merged.themes().map(|v| v.len()), Some(1));
    }
}
