use {
    std::collections::HashMap,
    once_cell::sync::Lazy,
    bank_reviews_core::{review::SentimentLabel, stemming::stem},
    crate::sentiment::{Classification, ClassificationSource, Classifier, ClassifierError},
};

pub const POLARITY_THRESHOLD: f32 = 0.1;
const NEGATION_FACTOR: f32 = -0.5;
const INTENSIFIER_FACTOR: f32 = 1.3;
const NEGATION_SCOPE: usize = 3;

static VALENCES: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| [
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("brilliant", 0.9),
    ("cool", 0.35),
    ("convenient", 0.5),
    ("easy", 0.43),
    ("efficient", 0.5),
    ("excellent", 1.0),
    ("fantastic", 0.4),
    ("fast", 0.2),
    ("fine", 0.42),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("impressive", 1.0),
    ("love", 0.5),
    ("nice", 0.6),
    ("ok", 0.5),
    ("okay", 0.5),
    ("perfect", 1.0),
    ("polite", 0.5),
    ("quick", 0.33),
    ("reliable", 0.5),
    ("responsive", 0.4),
    ("safe", 0.5),
    ("satisfied", 0.5),
    ("secure", 0.4),
    ("simple", 0.2),
    ("smooth", 0.4),
    ("successful", 0.75),
    ("thank", 0.2),
    ("thanks", 0.2),
    ("useful", 0.3),
    ("wonderful", 1.0),
    ("worth", 0.3),
    ("annoying", -0.8),
    ("awful", -1.0),
    ("bad", -0.7),
    ("broken", -0.4),
    ("bug", -0.5),
    ("buggy", -0.6),
    ("complicated", -0.5),
    ("confusing", -0.3),
    ("crash", -0.6),
    ("declined", -0.4),
    ("delay", -0.4),
    ("difficult", -0.5),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("error", -0.5),
    ("fail", -0.5),
    ("failed", -0.5),
    ("failure", -0.5),
    ("freeze", -0.4),
    ("frozen", -0.4),
    ("frustrating", -0.7),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("lag", -0.4),
    ("locked", -0.3),
    ("poor", -0.4),
    ("problem", -0.4),
    ("rude", -0.3),
    ("scam", -0.8),
    ("slow", -0.3),
    ("stuck", -0.4),
    ("terrible", -1.0),
    ("unhelpful", -0.5),
    ("unreliable", -0.5),
    ("unresponsive", -0.5),
    ("useless", -0.5),
    ("waste", -0.6),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
].into_iter().collect());

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "neither", "nor", "cannot", "hardly",
    "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "werent", "cant", "couldnt", "wont",
    "wouldnt", "shouldnt", "aint", "havent", "hasnt",
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "extremely", "so", "too", "super", "highly", "absolutely", "totally", "incredibly",
];

/// Deterministic valence lexicon scorer.
///
/// Polarity is the mean valence of the sentiment words found, where a word
/// following an intensifier is scaled by 1.3 and a word within three words
/// after a negation is scaled by -0.5. Confidence never exceeds the cap.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    confidence_cap: f32,
}

impl LexiconClassifier {
    pub fn new(confidence_cap: f32) -> Self {
        Self {
            confidence_cap: confidence_cap.clamp(0.0, 1.0),
        }
    }

    pub fn polarity(&self, text: &str) -> f32 {
        let mut valences = Vec::new();
        let mut negation_left = 0;
        let mut intensified = false;

        for word in words(text) {
            if NEGATIONS.contains(&word.as_str()) {
                negation_left = NEGATION_SCOPE;
                intensified = false;
                continue;
            }
            if INTENSIFIERS.contains(&word.as_str()) {
                intensified = true;
                continue;
            }

            if let Some(valence) = valence(&word) {
                let mut valence = valence;
                if intensified {
                    valence *= INTENSIFIER_FACTOR;
                }
                if negation_left > 0 {
                    valence *= NEGATION_FACTOR;
                    negation_left = 0;
                }
                valences.push(valence);
            } else {
                negation_left = negation_left.saturating_sub(1);
            }

            intensified = false;
        }

        if valences.is_empty() {
            0.0
        } else {
            (valences.iter().sum::<f32>() / valences.len() as f32).clamp(-1.0, 1.0)
        }
    }

    pub fn score(&self, text: &str) -> Classification {
        let polarity = self.polarity(text);

        let (label, confidence) = if polarity > POLARITY_THRESHOLD {
            (SentimentLabel::Positive, (polarity + 1.0) / 2.0)
        } else if polarity < -POLARITY_THRESHOLD {
            (SentimentLabel::Negative, (1.0 - polarity) / 2.0)
        } else {
            (SentimentLabel::Neutral, 0.8)
        };

        Classification {
            label,
            confidence: confidence.min(self.confidence_cap),
            polarity,
            source: ClassificationSource::Fallback,
        }
    }
}

impl Classifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        Ok(self.score(text))
    }
}

fn valence(word: &str) -> Option<f32> {
    VALENCES.get(word).copied().or_else(|| VALENCES.get(stem(word).as_str()).copied())
}

// apostrophes are dropped so that "don't" reads as "dont"
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '\u{2019}'))
        .map(|word| word.chars().filter(|c| c.is_alphabetic()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect()
}
