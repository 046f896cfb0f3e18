use {
    once_cell::sync::Lazy,
    rust_stemmers::{Algorithm, Stemmer},
};

static ENGLISH: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Snowball (Porter2) stem of a lowercase English word. Review tokens and
/// theme keywords both go through this so inflected forms meet.
pub fn stem(word: &str) -> String {
    ENGLISH.stem(word).into_owned()
}
