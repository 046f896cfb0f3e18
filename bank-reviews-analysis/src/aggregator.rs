use {
    std::collections::BTreeMap,
    serde::Serialize,
    bank_reviews_core::{
        entity::{into_review_document, ReviewDocument},
        features::{extract, TextFeatures},
        review::{Bank, Review, SentimentLabel},
    },
    crate::{
        sentiment::{Classification, FallbackClassifier},
        themes::{Theme, ThemeMatcher},
    },
};

const TOP_THEMES: usize = 5;

#[derive(Debug, Clone)]
pub struct AnalyzedReview {
    pub review: Review,
    pub features: TextFeatures,
    pub classification: Classification,
    /// Declaration order, no repeats.
    pub themes: Vec<Theme>,
}

impl AnalyzedReview {
    pub fn theme_names(&self) -> Vec<String> {
        self.themes.iter().map(|theme| theme.name().to_owned()).collect()
    }

    pub fn has_theme(&self, theme: Theme) -> bool {
        self.themes.contains(&theme)
    }

    pub fn to_document(&self, processed_at: &str, uploaded_at: &str) -> ReviewDocument {
        into_review_document(&self.review, processed_at, uploaded_at)
            .with_analysis(self.classification.label, self.classification.confidence, self.theme_names())
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentBreakdown {
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    pub fn percentages(&self) -> SentimentShares {
        let total = self.total();

        SentimentShares {
            positive: percentage(self.positive, total),
            negative: percentage(self.negative, total),
            neutral: percentage(self.neutral, total),
        }
    }

    pub fn ratios(&self) -> SentimentShares {
        let shares = self.percentages();

        SentimentShares {
            positive: shares.positive / 100.0,
            negative: shares.negative / 100.0,
            neutral: shares.neutral / 100.0,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct SentimentShares {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ThemeStats {
    pub count: usize,
    pub mean_confidence: f64,
    pub mean_polarity: f64,
    pub breakdown: SentimentBreakdown,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BankSummary {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub sentiment: SentimentBreakdown,
    pub sentiment_percentages: SentimentShares,
    pub average_confidence: f64,
    pub top_theme: Option<Theme>,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PolarityStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SentimentSummary {
    pub total_reviews: usize,
    pub distribution: SentimentBreakdown,
    pub percentages: SentimentShares,
    pub average_confidence: f64,
    pub polarity: PolarityStats,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ThemeSummary {
    pub total_reviews: usize,
    pub counts: BTreeMap<Theme, usize>,
    pub percentages: BTreeMap<Theme, f64>,
    pub most_common: Vec<(Theme, usize)>,
    pub average_themes_per_review: f64,
    pub reviews_with_themes: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ThemeSentiment {
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    pub neutral_ratio: f64,
    pub total_reviews: usize,
    pub average_confidence: f64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct AnalysisSummary {
    pub by_bank_theme: BTreeMap<Bank, BTreeMap<Theme, ThemeStats>>,
    pub banks: BTreeMap<Bank, BankSummary>,
    pub sentiment: SentimentSummary,
    pub themes: ThemeSummary,
    pub theme_sentiment: BTreeMap<Theme, ThemeSentiment>,
}

/// Classifies and tags reviews, then rolls results up per bank and theme.
pub struct Aggregator {
    classifier: FallbackClassifier,
    matcher: ThemeMatcher,
}

impl Aggregator {
    pub fn new(classifier: FallbackClassifier, matcher: ThemeMatcher) -> Self {
        Self {
            classifier,
            matcher,
        }
    }

    pub fn analyze(&self, review: Review) -> AnalyzedReview {
        let features = extract(review.review_text());
        let classification = self.classifier.classify(review.review_text());
        let themes = self.matcher.match_features(&features);

        AnalyzedReview {
            review,
            features,
            classification,
            themes,
        }
    }

    pub fn summarize(&self, reviews: &[AnalyzedReview]) -> AnalysisSummary {
        summarize(reviews)
    }
}

pub fn summarize(reviews: &[AnalyzedReview]) -> AnalysisSummary {
    AnalysisSummary {
        by_bank_theme: by_bank_theme(reviews),
        banks: bank_summaries(reviews),
        sentiment: sentiment_summary(reviews),
        themes: theme_summary(reviews),
        theme_sentiment: theme_sentiment(reviews),
    }
}

fn by_bank_theme(reviews: &[AnalyzedReview]) -> BTreeMap<Bank, BTreeMap<Theme, ThemeStats>> {
    let mut result: BTreeMap<Bank, BTreeMap<Theme, ThemeStats>> = BTreeMap::new();

    for review in reviews {
        for theme in &review.themes {
            let stats = result.entry(review.review.bank_name()).or_default().entry(*theme).or_default();
            stats.count += 1;
            stats.mean_confidence += review.classification.confidence as f64;
            stats.mean_polarity += review.classification.polarity as f64;
            stats.breakdown.record(review.classification.label);
        }
    }

    // sums into means
    for stats in result.values_mut().flat_map(|themes| themes.values_mut()) {
        stats.mean_confidence /= stats.count as f64;
        stats.mean_polarity /= stats.count as f64;
    }

    result
}

fn bank_summaries(reviews: &[AnalyzedReview]) -> BTreeMap<Bank, BankSummary> {
    let mut by_bank: BTreeMap<Bank, Vec<&AnalyzedReview>> = BTreeMap::new();
    for review in reviews {
        by_bank.entry(review.review.bank_name()).or_default().push(review);
    }

    by_bank.into_iter()
        .map(|(bank, reviews)| {
            let mut sentiment = SentimentBreakdown::default();
            let mut theme_counts = BTreeMap::new();
            for review in &reviews {
                sentiment.record(review.classification.label);
                for theme in &review.themes {
                    *theme_counts.entry(*theme).or_insert(0usize) += 1;
                }
            }

            let summary = BankSummary {
                total_reviews: reviews.len(),
                average_rating: mean(reviews.iter().map(|v| v.review.rating() as f64)),
                sentiment,
                sentiment_percentages: sentiment.percentages(),
                average_confidence: mean(reviews.iter().map(|v| v.classification.confidence as f64)),
                top_theme: most_frequent(&theme_counts),
            };

            (bank, summary)
        })
        .collect()
}

fn sentiment_summary(reviews: &[AnalyzedReview]) -> SentimentSummary {
    let mut distribution = SentimentBreakdown::default();
    for review in reviews {
        distribution.record(review.classification.label);
    }

    let polarities = reviews.iter().map(|v| v.classification.polarity as f64).collect::<Vec<_>>();
    let polarity = if polarities.is_empty() {
        PolarityStats::default()
    } else {
        PolarityStats {
            mean: mean(polarities.iter().copied()),
            min: polarities.iter().copied().fold(f64::INFINITY, f64::min),
            max: polarities.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    };

    SentimentSummary {
        total_reviews: reviews.len(),
        distribution,
        percentages: distribution.percentages(),
        average_confidence: mean(reviews.iter().map(|v| v.classification.confidence as f64)),
        polarity,
    }
}

fn theme_summary(reviews: &[AnalyzedReview]) -> ThemeSummary {
    let counts: BTreeMap<Theme, usize> = Theme::ALL.iter()
        .map(|theme| (*theme, reviews.iter().filter(|v| v.has_theme(*theme)).count()))
        .collect();

    let percentages = counts.iter()
        .map(|(theme, count)| (*theme, percentage(*count, reviews.len())))
        .collect();

    // stable sort keeps declaration order between equal counts
    let mut most_common = counts.iter().map(|(theme, count)| (*theme, *count)).collect::<Vec<_>>();
    most_common.sort_by(|a, b| b.1.cmp(&a.1));
    most_common.truncate(TOP_THEMES);

    ThemeSummary {
        total_reviews: reviews.len(),
        counts,
        percentages,
        most_common,
        average_themes_per_review: mean(reviews.iter().map(|v| v.themes.len() as f64)),
        reviews_with_themes: reviews.iter().filter(|v| !v.themes.is_empty()).count(),
    }
}

fn theme_sentiment(reviews: &[AnalyzedReview]) -> BTreeMap<Theme, ThemeSentiment> {
    Theme::ALL.iter()
        .filter_map(|theme| {
            let tagged = reviews.iter().filter(|v| v.has_theme(*theme)).collect::<Vec<_>>();
            if tagged.is_empty() {
                return None;
            }

            let mut breakdown = SentimentBreakdown::default();
            for review in &tagged {
                breakdown.record(review.classification.label);
            }
            let ratios = breakdown.ratios();

            Some((*theme, ThemeSentiment {
                positive_ratio: ratios.positive,
                negative_ratio: ratios.negative,
                neutral_ratio: ratios.neutral,
                total_reviews: tagged.len(),
                average_confidence: mean(tagged.iter().map(|v| v.classification.confidence as f64)),
            }))
        })
        .collect()
}

/// Highest count wins, ties go to the theme declared first.
pub fn most_frequent(counts: &BTreeMap<Theme, usize>) -> Option<Theme> {
    counts.iter()
        .filter(|(_, count)| **count > 0)
        .fold(None, |best: Option<(Theme, usize)>, (theme, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((*theme, *count)),
        })
        .map(|(theme, _)| theme)
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { part as f64 * 100.0 / total as f64 }
}

#[cfg(test)]
mod tests {
    use {
        bank_reviews_core::review::DEFAULT_SOURCE,
        crate::{lexicon::LexiconClassifier, sentiment::ClassificationSource},
        super::*,
    };

    fn aggregator() -> Aggregator {
        Aggregator::new(FallbackClassifier::lexicon_only(LexiconClassifier::new(0.6)), ThemeMatcher::new())
    }

    fn review(id: &str, text: &str, rating: i32, bank: Bank) -> Review {
        Review::new(id.to_owned(), text.to_owned(), rating, "2025-06-13".to_owned(), bank, DEFAULT_SOURCE.to_owned())
    }

    fn analyzed() -> Vec<AnalyzedReview> {
        let aggregator = aggregator();
        vec![
            review("CBE_1", "Great app, fast!", 5, Bank::Cbe),
            review("CBE_2", "Terrible, transfer failed and app is slow", 1, Bank::Cbe),
            review("CBE_3", "I opened it yesterday", 3, Bank::Cbe),
            review("BOA_1", "Login is broken, very bad", 1, Bank::Boa),
        ].into_iter().map(|review| aggregator.analyze(review)).collect()
    }

    #[test]
    fn analyze_classifies_and_tags() {
        let review = aggregator().analyze(review("CBE_1", "Great app, fast!", 5, Bank::Cbe));

        assert_eq!(review.classification.label, SentimentLabel::Positive);
        assert_eq!(review.classification.source, ClassificationSource::Fallback);
        assert_eq!(review.themes, vec![Theme::PerformanceIssues]);
        assert_eq!(review.features.word_count, 3);
    }

    #[test]
    fn groups_by_bank_and_theme() {
        let summary = summarize(&analyzed());

        let performance = &summary.by_bank_theme[&Bank::Cbe][&Theme::PerformanceIssues];
        assert_eq!(performance.count, 2);
        assert_eq!(performance.breakdown.positive, 1);
        assert_eq!(performance.breakdown.negative, 1);
        assert!(summary.by_bank_theme[&Bank::Boa].contains_key(&Theme::AccountAccess));
        assert!(!summary.by_bank_theme.contains_key(&Bank::Dashen));
    }

    #[test]
    fn bank_summary_has_top_theme_and_rating() {
        let summary = summarize(&analyzed());

        let cbe = &summary.banks[&Bank::Cbe];
        assert_eq!(cbe.total_reviews, 3);
        assert_eq!(cbe.average_rating, 3.0);
        assert_eq!(cbe.top_theme, Some(Theme::PerformanceIssues));
        assert_eq!(cbe.sentiment.total(), 3);

        // Login tags Security Features and Account Access once each
        assert_eq!(summary.banks[&Bank::Boa].top_theme, Some(Theme::SecurityFeatures));
    }

    #[test]
    fn overall_summaries() {
        let reviews = analyzed();
        let summary = summarize(&reviews);

        assert_eq!(summary.sentiment.total_reviews, 4);
        assert_eq!(summary.sentiment.distribution.neutral, 1);
        assert_eq!(summary.themes.reviews_with_themes, 3);
        assert_eq!(summary.themes.most_common[0], (Theme::PerformanceIssues, 2));
        assert_eq!(summary.themes.most_common.len(), 5);
        assert_eq!(summary.theme_sentiment[&Theme::PerformanceIssues].total_reviews, 2);
        assert_eq!(summary.theme_sentiment[&Theme::PerformanceIssues].positive_ratio, 0.5);
        assert!(!summary.theme_sentiment.contains_key(&Theme::FeatureRequests));
    }

    #[test]
    fn most_frequent_prefers_declaration_order() {
        let counts: BTreeMap<Theme, usize> = [(Theme::AccountAccess, 2), (Theme::UiUxIssues, 2), (Theme::CustomerSupport, 1)].into_iter().collect();

        assert_eq!(most_frequent(&counts), Some(Theme::UiUxIssues));
        assert_eq!(most_frequent(&BTreeMap::new()), None);
    }

    #[test]
    fn empty_input_summarizes_to_zeroes() {
        let summary = summarize(&[]);

        assert!(summary.banks.is_empty());
        assert_eq!(summary.sentiment.average_confidence, 0.0);
        assert_eq!(summary.themes.average_themes_per_review, 0.0);
    }
}
