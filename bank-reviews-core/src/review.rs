use {
    std::{fmt, str::FromStr},
    serde::{Serialize, Deserialize},
    crate::{
        error::NormalizeError,
        features::{review_length, word_count},
    },
};

pub const DEFAULT_SOURCE: &str = "Google Play Store";

/// Banks whose mobile apps are tracked.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    #[serde(rename = "CBE")]
    Cbe,
    #[serde(rename = "BOA")]
    Boa,
    #[serde(rename = "Dashen")]
    Dashen,
}

impl Bank {
    pub const ALL: [Bank; 3] = [Bank::Cbe, Bank::Boa, Bank::Dashen];

    pub fn code(&self) -> &'static str {
        match self {
            Bank::Cbe => "CBE",
            Bank::Boa => "BOA",
            Bank::Dashen => "Dashen",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Bank::Cbe => "Commercial Bank of Ethiopia",
            Bank::Boa => "Bank of Abyssinia",
            Bank::Dashen => "Dashen Bank",
        }
    }

    pub fn app_id(&self) -> &'static str {
        match self {
            Bank::Cbe => "com.combanketh.mobilebanking",
            Bank::Boa => "com.boa.boaMobileBanking",
            Bank::Dashen => "com.dashen.dashensuperapp",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Bank {
    type Err = NormalizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Bank::ALL.iter()
            .find(|bank| {
                value.eq_ignore_ascii_case(bank.code())
                    || value.eq_ignore_ascii_case(bank.full_name())
                    || value.eq_ignore_ascii_case(bank.app_id())
            })
            .copied()
            .ok_or_else(|| NormalizeError::UnknownBank { value: value.to_owned() })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [SentimentLabel::Positive, SentimentLabel::Negative, SentimentLabel::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical review record.
///
/// `review_length` and `word_count` are derived from `review_text` and are
/// recomputed by every method that replaces the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    review_id: String,
    review_text: String,
    rating: i32,
    review_date: String,
    bank_name: Bank,
    source: String,
    review_length: usize,
    word_count: usize,
}

impl Review {
    pub fn new(review_id: String, review_text: String, rating: i32, review_date: String, bank_name: Bank, source: String) -> Self {
        Self {
            review_length: review_length(&review_text),
            word_count: word_count(&review_text),
            review_id,
            review_text,
            rating,
            review_date,
            bank_name,
            source,
        }
    }

    pub fn with_review_text(mut self, review_text: String) -> Self {
        self.set_review_text(review_text);
        self
    }

    pub fn set_review_text(&mut self, review_text: String) {
        self.review_length = review_length(&review_text);
        self.word_count = word_count(&review_text);
        self.review_text = review_text;
    }

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

    pub fn bank_name(&self) -> Bank {
        self.bank_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn review_length(&self) -> usize {
        self.review_length
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}
