use {
    std::fs,
    bank_reviews_core::review::{Bank, Review, SentimentLabel, DEFAULT_SOURCE},
    bank_reviews_analysis::{
        aggregator::{summarize, Aggregator, AnalyzedReview},
        keywords::{theme_keywords, TOP_KEYWORDS},
        lexicon::LexiconClassifier,
        report::{recommendations, write_reports, RecommendationKind},
        sentiment::FallbackClassifier,
        themes::{Theme, ThemeMatcher},
    },
};

fn analyzed() -> Vec<AnalyzedReview> {
    let aggregator = Aggregator::new(FallbackClassifier::lexicon_only(LexiconClassifier::new(0.6)), ThemeMatcher::new());

    [
        ("CBE_1", "Great app, fast!", 5, Bank::Cbe),
        ("CBE_2", "Transfer failed, terrible", 1, Bank::Cbe),
        ("CBE_3", "Transfer failed again, bad", 1, Bank::Cbe),
        ("BOA_1", "Very good and easy interface", 5, Bank::Boa),
        ("BOA_2", "Nice design, easy to use", 4, Bank::Boa),
        ("Dashen_1", "I opened it yesterday", 3, Bank::Dashen),
    ]
        .into_iter()
        .map(|(id, text, rating, bank)| Review::new(id.to_owned(), text.to_owned(), rating, "2025-06-13".to_owned(), bank, DEFAULT_SOURCE.to_owned()))
        .map(|review| aggregator.analyze(review))
        .collect()
}

#[test]
fn recommendations_name_pain_points_and_drivers() {
    let summary = summarize(&analyzed());

    let recommendations = recommendations(&summary);

    let cbe_pain = recommendations.iter()
        .find(|v| v.bank == Bank::Cbe && v.kind == RecommendationKind::PainPoint)
        .unwrap();
    assert_eq!(cbe_pain.theme, Theme::TransactionIssues);
    assert_eq!(cbe_pain.share, 1.0);

    let boa_driver = recommendations.iter()
        .find(|v| v.bank == Bank::Boa && v.kind == RecommendationKind::Driver)
        .unwrap();
    assert_eq!(boa_driver.theme, Theme::UiUxIssues);
    assert!(boa_driver.message.starts_with("Bank of Abyssinia"));

    assert!(recommendations.iter().all(|v| v.bank != Bank::Dashen));
}

#[test]
fn theme_keywords_come_from_tagged_reviews() {
    let reviews = analyzed();

    let keywords = theme_keywords(&reviews, TOP_KEYWORDS);

    // "transfer" and "failed" appear in every transaction review
    assert_eq!(keywords.get(&Theme::TransactionIssues), Some(&Vec::new()));
    assert!(!keywords.contains_key(&Theme::FeatureRequests));
}

#[test]
fn writes_all_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("reports");
    let reviews = analyzed();
    let summary = summarize(&reviews);
    let keywords = theme_keywords(&reviews, TOP_KEYWORDS);

    let paths = write_reports(&output_dir, "20250614_090000", &reviews, &summary, &keywords).unwrap();

    assert_eq!(paths.review_analysis, output_dir.join("review_analysis_20250614_090000.csv"));
    assert_eq!(paths.insights, output_dir.join("insights_20250614_090000.json"));
    assert_eq!(paths.bank_comparison, output_dir.join("bank_comparison_20250614_090000.csv"));

    let mut analysis = csv::Reader::from_path(&paths.review_analysis).unwrap();
    let headers = analysis.headers().unwrap().clone();
    assert_eq!(&headers[0], "review_id");
    assert!(headers.iter().any(|v| v == "sentiment_label"));
    let rows = analysis.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(&rows[0][0], "CBE_1");
    assert_eq!(&rows[0][headers.iter().position(|v| v == "sentiment_label").unwrap()], SentimentLabel::Positive.as_str());
    assert_eq!(&rows[0][headers.iter().position(|v| v == "themes").unwrap()], "Performance Issues");

    let insights: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.insights).unwrap()).unwrap();
    assert_eq!(insights["timestamp"], "20250614_090000");
    assert_eq!(insights["total_reviews"], 6);
    assert_eq!(insights["bank_analysis"]["CBE"]["total_reviews"], 3);
    assert_eq!(insights["theme_summary"]["counts"]["Transaction Issues"], 2);
    assert!(insights["recommendations"].as_array().unwrap().len() >= 2);

    let comparison = csv::Reader::from_path(&paths.bank_comparison).unwrap()
        .into_records()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(comparison.len(), 3);
    assert_eq!(&comparison[0][0], "CBE");
    assert_eq!(&comparison[2][0], "Dashen");
    assert_eq!(&comparison[2][7], "");
}
