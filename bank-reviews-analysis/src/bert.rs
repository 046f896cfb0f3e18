use {
    tracing::info,
    rust_bert::pipelines::sentiment::{SentimentConfig, SentimentModel, SentimentPolarity},
    bank_reviews_core::review::SentimentLabel,
    crate::sentiment::{Classification, ClassificationSource, Classifier, ClassifierError},
};

pub const MAX_INPUT_CHARS: usize = 512;

/// DistilBERT fine-tuned on SST-2, downloaded on first use.
pub struct BertClassifier {
    model: SentimentModel,
}

impl BertClassifier {
    /// Blocks while the model is fetched and loaded, call it from
    /// `spawn_blocking` inside a runtime.
    pub fn load() -> Result<Self, ClassifierError> {
        let model = SentimentModel::new(SentimentConfig::default())
            .map_err(|err| ClassifierError::Unavailable(err.to_string()))?;

        info!("loaded sentiment model");
        Ok(Self {
            model,
        })
    }
}

impl Classifier for BertClassifier {
    fn name(&self) -> &str {
        "distilbert-sst2"
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let input = truncate(text);

        let sentiment = self.model.predict(&[input.as_str()])
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::Unavailable("model returned no prediction".to_owned()))?;

        let confidence = (sentiment.score as f32).clamp(0.0, 1.0);
        let (label, polarity) = match sentiment.polarity {
            SentimentPolarity::Positive => (SentimentLabel::Positive, confidence),
            SentimentPolarity::Negative => (SentimentLabel::Negative, -confidence),
        };

        Ok(Classification {
            label,
            confidence,
            polarity,
            source: ClassificationSource::Model,
        })
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_INPUT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_characters() {
        let text = "é".repeat(600);

        assert_eq!(truncate(&text).chars().count(), MAX_INPUT_CHARS);
        assert_eq!(truncate("short"), "short");
    }
}
