use {
    std::collections::HashMap,
    serde::Serialize,
    crate::{
        tokenization::{tokenize, is_stopword, matching_text},
        stemming::stem,
    },
};

const MIN_TOKEN_CHARS: usize = 2;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TextFeatures {
    pub review_length: usize,
    pub word_count: usize,
    #[serde(skip)]
    pub tokens: Vec<String>,
    #[serde(skip)]
    pub matching_text: String,
}

pub fn review_length(text: &str) -> usize {
    text.chars().count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercased, stopword-free, stemmed tokens of `text`.
pub fn normalized_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !is_stopword(token))
        .map(|token| stem(&token))
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

pub fn extract(text: &str) -> TextFeatures {
    TextFeatures {
        review_length: review_length(text),
        word_count: word_count(text),
        tokens: normalized_tokens(text),
        matching_text: matching_text(text),
    }
}

/// Most frequent normalized tokens of `text`, ties broken by first occurrence.
pub fn top_keywords(text: &str, top_n: usize) -> Vec<String> {
    let tokens = normalized_tokens(text);

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        counts.entry(token.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked.into_iter()
        .take(top_n)
        .map(|(token, _)| token.to_owned())
        .collect()
}
