use {
    tracing::{Level, Metadata},
    tracing_subscriber::{
        prelude::*,
        filter::filter_fn,
        FmtSubscriber,
    },
    chrono::Local,
    bank_reviews_core::data_loading::PROCESSED_AT_FORMAT,
};

pub fn init_logging(json: bool) {
    if json {
        FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .json()
            .finish()
            .with(filter_fn(is_reported))
            .init();
    } else {
        FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .finish()
            .with(filter_fn(is_reported))
            .init();
    }
}

// sqlx logs every statement at info
fn is_reported(metadata: &Metadata<'_>) -> bool {
    if metadata.target().starts_with("sqlx::query") {
        *metadata.level() <= Level::WARN
    } else {
        true
    }
}

pub fn processed_at_now() -> String {
    Local::now().format(PROCESSED_AT_FORMAT).to_string()
}
