mod analysis;
mod preprocess;
mod progress;
mod upload;
mod utils;

use {
    tracing::{info, error},
    bank_reviews_core::{
        config::Config,
        error::ConfigError,
        summary::RunSummary,
    },
    crate::{
        analysis::analysis_step,
        preprocess::preprocess_step,
        upload::upload_step,
        utils::init_logging,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_load();
    init_logging(config.as_ref().map(|v| v.logging.json).unwrap_or(false));
    let config = match config {
        Ok(config) => config,
        Err(err @ ConfigError::Read(_)) => Config::fallback(err),
        Err(err) => {
            error!("{}", err);
            return Err(err.into());
        },
    };

    info!("bank reviews pipeline");

    let mut summary = RunSummary::default();
    let result = run(&config, &mut summary).await;
    summary.log();

    result
}

async fn run(config: &Config, summary: &mut RunSummary) -> anyhow::Result<()> {
    let steps = &config.steps;
    let infra = config.infra();

    if steps.preprocess.enabled {
        preprocess_step(&steps.preprocess, &config.cleaning, summary)?;
    }

    if steps.upload.enabled {
        upload_step(&steps.upload, infra.database(), summary).await?;
    }

    if steps.analysis.enabled {
        analysis_step(&steps.analysis, &steps.upload, infra.database(), summary).await?;
    }

    Ok(())
}
