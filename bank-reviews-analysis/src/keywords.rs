use {
    std::collections::{BTreeMap, HashMap, HashSet},
    crate::{
        aggregator::AnalyzedReview,
        themes::Theme,
    },
};

pub const MIN_DOCUMENT_FREQUENCY: usize = 2;
pub const MAX_DOCUMENT_RATIO: f64 = 0.8;
pub const TOP_KEYWORDS: usize = 10;

/// Single tokens followed by pairs of adjacent tokens joined with a space.
pub fn terms(tokens: &[String]) -> Vec<String> {
    tokens.iter()
        .cloned()
        .chain(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])))
        .collect()
}

/// Terms (tokens and adjacent token pairs) ranked by mean tf-idf weight
/// over `documents`.
///
/// Terms found in fewer than two documents or in more than 80% of them are
/// ignored.
pub fn tfidf_keywords(documents: &[&[String]], top_n: usize) -> Vec<(String, f64)> {
    let total_documents = documents.len();
    if total_documents == 0 {
        return Vec::new();
    }

    let documents = documents.iter().map(|tokens| terms(tokens)).collect::<Vec<_>>();

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for document in &documents {
        let unique: HashSet<&str> = document.iter().map(|v| v.as_str()).collect();
        for term in unique {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    let mut weights: HashMap<&str, f64> = HashMap::new();
    for document in documents.iter().filter(|v| !v.is_empty()) {
        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        for term in document.iter() {
            *term_counts.entry(term.as_str()).or_insert(0) += 1;
        }

        for (term, count) in term_counts {
            let df = document_frequency[term];
            if df < MIN_DOCUMENT_FREQUENCY || df as f64 > MAX_DOCUMENT_RATIO * total_documents as f64 {
                continue;
            }

            let tf = count as f64 / document.len() as f64;
            let idf = (total_documents as f64 / df as f64).ln();
            *weights.entry(term).or_insert(0.0) += tf * idf;
        }
    }

    let mut ranked = weights.into_iter()
        .map(|(term, weight)| (term.to_owned(), weight / total_documents as f64))
        .filter(|(_, weight)| *weight > 0.0)
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_n);

    ranked
}

/// Top keywords of the reviews carrying each theme. Themes without reviews
/// are left out.
pub fn theme_keywords(reviews: &[AnalyzedReview], top_n: usize) -> BTreeMap<Theme, Vec<String>> {
    Theme::ALL.iter()
        .filter_map(|theme| {
            let documents = reviews.iter()
                .filter(|v| v.has_theme(*theme))
                .map(|v| v.features.tokens.as_slice())
                .collect::<Vec<_>>();

            if documents.is_empty() {
                return None;
            }

            let keywords = tfidf_keywords(&documents, top_n).into_iter().map(|(term, _)| term).collect();
            Some((*theme, keywords))
        })
        .collect()
}
