use {
    std::fmt,
    tracing::warn,
    thiserror::Error,
    serde::Serialize,
    bank_reviews_core::review::SentimentLabel,
    crate::lexicon::LexiconClassifier,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Model,
    Fallback,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationSource::Model => "model",
            ClassificationSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    /// In `[0, 1]`.
    pub confidence: f32,
    /// Signed score in `[-1, 1]`, negative for negative sentiment.
    pub polarity: f32,
    pub source: ClassificationSource,
}

pub trait Classifier {
    fn name(&self) -> &str;

    fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;
}

/// Uses the primary model when there is one and falls back to the lexicon
/// scorer whenever it is missing or fails.
pub struct FallbackClassifier {
    primary: Option<Box<dyn Classifier>>,
    fallback: LexiconClassifier,
}

impl FallbackClassifier {
    pub fn new(primary: Option<Box<dyn Classifier>>, fallback: LexiconClassifier) -> Self {
        Self {
            primary,
            fallback,
        }
    }

    pub fn lexicon_only(fallback: LexiconClassifier) -> Self {
        Self::new(None, fallback)
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn classify(&self, text: &str) -> Classification {
        if let Some(primary) = &self.primary {
            match primary.classify(text) {
                Ok(classification) => return classification,
                Err(err) => warn!("{} failed, using {}: {}", primary.name(), self.fallback.name(), err),
            }
        }

        self.fallback.score(text)
    }
}
