use thiserror::Error;

/// Reasons a raw record cannot become a canonical review.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("could not parse date '{value}'")]
    InvalidDate { value: String },
    #[error("rating '{value}' is not a whole number")]
    InvalidRating { value: String },
    #[error("unknown bank '{value}'")]
    UnknownBank { value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network, TLS or authentication failure. Aborts the whole upload.
    #[error("connection to review store failed: {0}")]
    Connection(String),
    /// A single batch could not be written. Retried by the uploader.
    #[error("failed to write batch: {0}")]
    Write(String),
    #[error("invalid identifier '{0}': only ascii letters, digits and underscores are allowed")]
    InvalidIdentifier(String),
    #[error("review store is not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Write(err.to_string())
        }
    }
}

fn is_connection_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err.code()
            // class 28: invalid authorization, 3D000: unknown database
            .map(|code| code.starts_with("28") || code == "3D000")
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_connection_errors() {
        assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::Connection(_)));
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Write(_)));
    }
}
