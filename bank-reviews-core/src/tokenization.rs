use {
    std::collections::HashSet,
    once_cell::sync::Lazy,
    regex::Regex,
    unicode_segmentation::UnicodeSegmentation,
    stop_words::{get, LANGUAGE},
};

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").unwrap());

// matching text has no apostrophes, so "doesn't" is also listed as "doesnt"
static STOPWORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut words = HashSet::new();
    for word in get(LANGUAGE::English) {
        if word.contains('\'') {
            words.insert(word.replace('\'', ""));
        }
        words.insert(word);
    }
    words
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Lowercase, letters-only, single-spaced form of `text`.
///
/// URLs and e-mail addresses are removed before punctuation and digits are
/// replaced with spaces.
pub fn matching_text(text: &str) -> String {
    let lowercase = text.to_lowercase();
    let without_urls = URL.replace_all(&lowercase, " ");
    let without_emails = EMAIL.replace_all(&without_urls, " ");

    let letters: String = without_emails.chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();

    letters.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokenize(text: &str) -> Vec<String> {
    matching_text(text)
        .unicode_words()
        .map(|word| word.to_owned())
        .collect()
}
