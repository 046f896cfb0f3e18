use {
    std::{collections::BTreeMap, fs, path::{Path, PathBuf}},
    tracing::info,
    anyhow::{Context, Result},
    serde::Serialize,
    bank_reviews_core::review::Bank,
    crate::{
        aggregator::{AnalysisSummary, AnalyzedReview, BankSummary, SentimentSummary, ThemeSentiment, ThemeStats, ThemeSummary},
        themes::Theme,
    },
};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// a theme counts as a pain point or a driver once this share of its reviews agree
const DOMINANT_SHARE: f64 = 0.5;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReviewAnalysisRow<'a> {
    pub review_id: &'a str,
    pub review_text: &'a str,
    pub rating: i32,
    pub review_date: &'a str,
    pub bank_name: Bank,
    pub source: &'a str,
    pub review_length: usize,
    pub word_count: usize,
    pub sentiment_label: &'static str,
    pub sentiment_confidence: f32,
    pub sentiment_polarity: f32,
    pub sentiment_source: &'static str,
    pub themes: String,
    pub theme_count: usize,
}

impl<'a> ReviewAnalysisRow<'a> {
    pub fn from_analyzed(analyzed: &'a AnalyzedReview) -> Self {
        let review = &analyzed.review;

        Self {
            review_id: review.review_id(),
            review_text: review.review_text(),
            rating: review.rating(),
            review_date: review.review_date(),
            bank_name: review.bank_name(),
            source: review.source(),
            review_length: review.review_length(),
            word_count: review.word_count(),
            sentiment_label: analyzed.classification.label.as_str(),
            sentiment_confidence: analyzed.classification.confidence,
            sentiment_polarity: analyzed.classification.polarity,
            sentiment_source: analyzed.classification.source.as_str(),
            themes: analyzed.theme_names().join(", "),
            theme_count: analyzed.themes.len(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BankComparisonRow {
    pub bank_name: Bank,
    pub total_reviews: usize,
    pub average_rating: f64,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
    pub average_confidence: f64,
    pub top_theme: String,
}

impl BankComparisonRow {
    pub fn new(bank: Bank, summary: &BankSummary) -> Self {
        Self {
            bank_name: bank,
            total_reviews: summary.total_reviews,
            average_rating: summary.average_rating,
            positive_pct: summary.sentiment_percentages.positive,
            negative_pct: summary.sentiment_percentages.negative,
            neutral_pct: summary.sentiment_percentages.neutral,
            average_confidence: summary.average_confidence,
            top_theme: summary.top_theme.map(|v| v.name().to_owned()).unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    PainPoint,
    Driver,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub bank: Bank,
    pub kind: RecommendationKind,
    pub theme: Theme,
    pub share: f64,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct Insights<'a> {
    pub timestamp: &'a str,
    pub total_reviews: usize,
    pub sentiment_summary: &'a SentimentSummary,
    pub theme_summary: &'a ThemeSummary,
    pub bank_analysis: &'a BTreeMap<Bank, BankSummary>,
    pub bank_theme_analysis: &'a BTreeMap<Bank, BTreeMap<Theme, ThemeStats>>,
    pub theme_sentiment_correlation: &'a BTreeMap<Theme, ThemeSentiment>,
    pub theme_keywords: &'a BTreeMap<Theme, Vec<String>>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub review_analysis: PathBuf,
    pub insights: PathBuf,
    pub bank_comparison: PathBuf,
}

/// For every bank, the theme with the largest negative share becomes a pain
/// point and the theme with the largest positive share a driver, when that
/// share reaches one half. Ties go to the theme declared first.
pub fn recommendations(summary: &AnalysisSummary) -> Vec<Recommendation> {
    let mut result = Vec::new();

    for (bank, themes) in &summary.by_bank_theme {
        let share = |stats: &ThemeStats, count: usize| count as f64 / stats.count.max(1) as f64;

        if let Some((theme, negative)) = dominant(themes, |stats| share(stats, stats.breakdown.negative)) {
            result.push(Recommendation {
                bank: *bank,
                kind: RecommendationKind::PainPoint,
                theme,
                share: negative,
                message: format!("{}: fix {} ({:.0}% of these reviews are negative)", bank.full_name(), theme, negative * 100.0),
            });
        }

        if let Some((theme, positive)) = dominant(themes, |stats| share(stats, stats.breakdown.positive)) {
            result.push(Recommendation {
                bank: *bank,
                kind: RecommendationKind::Driver,
                theme,
                share: positive,
                message: format!("{}: keep investing in {} ({:.0}% of these reviews are positive)", bank.full_name(), theme, positive * 100.0),
            });
        }
    }

    result
}

fn dominant<F: Fn(&ThemeStats) -> f64>(themes: &BTreeMap<Theme, ThemeStats>, share: F) -> Option<(Theme, f64)> {
    themes.iter()
        .map(|(theme, stats)| (*theme, share(stats)))
        .filter(|(_, share)| *share >= DOMINANT_SHARE)
        .fold(None, |best: Option<(Theme, f64)>, (theme, share)| match best {
            Some((_, best_share)) if best_share >= share => best,
            _ => Some((theme, share)),
        })
}

pub fn write_reports(
    output_dir: &Path,
    timestamp: &str,
    reviews: &[AnalyzedReview],
    summary: &AnalysisSummary,
    theme_keywords: &BTreeMap<Theme, Vec<String>>,
) -> Result<ReportPaths> {
    fs::create_dir_all(output_dir).with_context(|| format!("failed to create {}", output_dir.display()))?;

    let paths = ReportPaths {
        review_analysis: output_dir.join(format!("review_analysis_{}.csv", timestamp)),
        insights: output_dir.join(format!("insights_{}.json", timestamp)),
        bank_comparison: output_dir.join(format!("bank_comparison_{}.csv", timestamp)),
    };

    let mut writer = csv::Writer::from_path(&paths.review_analysis)
        .with_context(|| format!("failed to create {}", paths.review_analysis.display()))?;
    for review in reviews {
        writer.serialize(ReviewAnalysisRow::from_analyzed(review))?;
    }
    writer.flush()?;

    let insights = Insights {
        timestamp,
        total_reviews: reviews.len(),
        sentiment_summary: &summary.sentiment,
        theme_summary: &summary.themes,
        bank_analysis: &summary.banks,
        bank_theme_analysis: &summary.by_bank_theme,
        theme_sentiment_correlation: &summary.theme_sentiment,
        theme_keywords,
        recommendations: recommendations(summary),
    };
    fs::write(&paths.insights, serde_json::to_string_pretty(&insights)?)
        .with_context(|| format!("failed to write {}", paths.insights.display()))?;

    let mut writer = csv::Writer::from_path(&paths.bank_comparison)
        .with_context(|| format!("failed to create {}", paths.bank_comparison.display()))?;
    for (bank, bank_summary) in &summary.banks {
        writer.serialize(BankComparisonRow::new(*bank, bank_summary))?;
    }
    writer.flush()?;

    info!("saved analysis reports to {}", output_dir.display());
    Ok(paths)
}
