use {
    tracing::info,
    anyhow::Result,
    chrono::{Local, Utc},
    bank_reviews_core::{
        config::{AnalysisStepConfig, DatabaseConfig, UploadStepConfig},
        data_loading::load_cleaned_reviews,
        summary::RunSummary,
    },
    bank_reviews_analysis::{
        aggregator::Aggregator,
        keywords::{theme_keywords, TOP_KEYWORDS},
        lexicon::LexiconClassifier,
        report::{write_reports, TIMESTAMP_FORMAT},
        sentiment::{Classifier, FallbackClassifier},
        themes::ThemeMatcher,
    },
    crate::{
        progress::Progress,
        upload::upload_documents,
        utils::processed_at_now,
    },
};

/// Cleaned reviews CSV to sentiment and theme reports.
pub async fn analysis_step(
    config: &AnalysisStepConfig,
    upload: &UploadStepConfig,
    database: &DatabaseConfig,
    summary: &mut RunSummary,
) -> Result<()> {
    info!("running analysis step");

    let reviews = load_cleaned_reviews(&config.input_path())?;

    let primary = if config.use_model { load_model().await } else { None };
    let classifier = FallbackClassifier::new(primary, LexiconClassifier::new(config.fallback_confidence_cap()));
    if !classifier.has_primary() {
        info!("classifying with the lexicon scorer only");
    }
    let aggregator = Aggregator::new(classifier, ThemeMatcher::new());

    let mut progress = Progress::new("analyzing reviews".to_owned(), reviews.len() as u64);
    let mut analyzed = Vec::with_capacity(reviews.len());
    for review in reviews {
        analyzed.push(aggregator.analyze(review));
        progress.update();
    }
    progress.finish();
    summary.analyzed = analyzed.len();

    let analysis = aggregator.summarize(&analyzed);
    let keywords = theme_keywords(&analyzed, TOP_KEYWORDS);

    info!("sentiment: {:.1}% positive, {:.1}% negative, {:.1}% neutral",
        analysis.sentiment.percentages.positive, analysis.sentiment.percentages.negative, analysis.sentiment.percentages.neutral);
    info!("reviews with themes: {}, average themes per review: {:.2}",
        analysis.themes.reviews_with_themes, analysis.themes.average_themes_per_review);
    for (bank, bank_summary) in &analysis.banks {
        info!("  {}: {} reviews, average rating {:.2}, top theme {}",
            bank.full_name(),
            bank_summary.total_reviews,
            bank_summary.average_rating,
            bank_summary.top_theme.map(|v| v.name()).unwrap_or("none"));
    }

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let paths = write_reports(&config.output_dir(), &timestamp, &analyzed, &analysis, &keywords)?;
    info!("analysis data: {}", paths.review_analysis.display());
    info!("insights: {}", paths.insights.display());
    info!("bank comparison: {}", paths.bank_comparison.display());

    if config.persist_results {
        let processed_at = processed_at_now();
        let uploaded_at = Utc::now().to_rfc3339();
        let documents = analyzed.iter()
            .map(|review| review.to_document(&processed_at, &uploaded_at))
            .collect::<Vec<_>>();

        upload_documents(upload, database, &documents, summary).await?;
    }

    Ok(())
}

#[cfg(feature = "bert")]
async fn load_model() -> Option<Box<dyn Classifier>> {
    use {tracing::warn, bank_reviews_analysis::bert::BertClassifier};

    match tokio::task::spawn_blocking(BertClassifier::load).await {
        Ok(Ok(model)) => Some(Box::new(model) as Box<dyn Classifier>),
        Ok(Err(err)) => {
            warn!("{}", err);
            None
        },
        Err(err) => {
            warn!("sentiment model loader crashed: {}", err);
            None
        },
    }
}

#[cfg(not(feature = "bert"))]
async fn load_model() -> Option<Box<dyn Classifier>> {
    info!("built without the bert feature, no sentiment model available");
    None
}
