use {
    tracing::info,
    anyhow::Result,
    bank_reviews_core::{
        cleaner::Cleaner,
        config::{CleaningConfig, PreprocessStepConfig},
        data_loading::{load_raw_records, save_cleaned_reviews},
        normalizer::Normalizer,
        summary::{DatasetSummary, RunSummary},
    },
    crate::utils::processed_at_now,
};

/// Raw scraper output to the cleaned reviews CSV.
pub fn preprocess_step(config: &PreprocessStepConfig, cleaning: &CleaningConfig, summary: &mut RunSummary) -> Result<()> {
    info!("running preprocess step");

    let records = load_raw_records(&config.input_path())?;
    summary.ingested += records.len();

    let normalized = Normalizer::new(cleaning.normalizer_config()).normalize_all(&records);
    summary.dropped.merge(&normalized.rejected);

    let cleaned = Cleaner::new(cleaning.cleaner_config()).clean(normalized.reviews);
    summary.dropped.merge(&cleaned.report.dropped);
    summary.cleaned = cleaned.reviews.len();

    save_cleaned_reviews(&config.output_path(), &cleaned.reviews, &processed_at_now())?;

    DatasetSummary::from_reviews(&cleaned.reviews).log();

    Ok(())
}
