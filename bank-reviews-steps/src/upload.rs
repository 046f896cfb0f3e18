use {
    tracing::{info, warn},
    anyhow::{Context, Result},
    chrono::Utc,
    bank_reviews_core::{
        config::{DatabaseConfig, UploadStepConfig},
        data_loading::{export_documents, load_cleaned_reviews},
        database::Database,
        entity::{into_review_document, ReviewDocument},
        summary::RunSummary,
        upload::{UploadConfig, Uploader},
    },
    crate::utils::processed_at_now,
};

/// Cleaned reviews CSV to the review store.
pub async fn upload_step(config: &UploadStepConfig, database: &DatabaseConfig, summary: &mut RunSummary) -> Result<()> {
    info!("running upload step");

    let reviews = load_cleaned_reviews(&config.input_path())?;
    let processed_at = processed_at_now();
    let uploaded_at = Utc::now().to_rfc3339();
    let documents = reviews.iter()
        .map(|review| into_review_document(review, &processed_at, &uploaded_at))
        .collect::<Vec<_>>();

    upload_documents(config, database, &documents, summary).await
}

/// Shared with the analysis step, which writes its results back.
pub async fn upload_documents(config: &UploadStepConfig, database: &DatabaseConfig, documents: &[ReviewDocument], summary: &mut RunSummary) -> Result<()> {
    let database = Database::connect(database).await.context("failed to connect to review store")?;

    let upload_config = UploadConfig {
        batch_size: config.batch_size(),
        create_indexes: config.create_indexes,
    };
    let uploader = Uploader::new(&database, upload_config, config.retry().policy());

    let report = uploader.upload(documents).await.context("upload aborted")?;
    summary.record_upload(documents, &report);

    for failed in &report.failed {
        warn!("batch {} was not stored ({}): {}", failed.index, failed.error, failed.review_ids.join(", "));
    }

    uploader.verify().await.context("failed to verify review store")?;

    if let Some(path) = config.export_path() {
        let stored = uploader.export().await.context("failed to read reviews for export")?;
        export_documents(path, &stored)?;
    }

    Ok(())
}
