use {
    std::{fs::read_to_string, path::{Path, PathBuf}, time::Duration},
    tracing::warn,
    serde::Deserialize,
    crate::{
        error::ConfigError,
        cleaner::{CleanerConfig, DedupKey},
        normalizer::{NormalizerConfig, MissingDatePolicy},
        retry::RetryPolicy,
        review::DEFAULT_SOURCE,
    },
};

pub const ENV_DATABASE_URI: &str = "REVIEWS_DATABASE_URI";
pub const ENV_DATABASE_NAME: &str = "REVIEWS_DATABASE_NAME";
pub const ENV_COLLECTION_NAME: &str = "REVIEWS_COLLECTION_NAME";

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub steps: StepsConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    pub infra: Option<InfraConfig>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

#[derive(Deserialize, Debug)]
pub struct StepsConfig {
    #[serde(default)]
    pub preprocess: PreprocessStepConfig,
    #[serde(default)]
    pub upload: UploadStepConfig,
    #[serde(default)]
    pub analysis: AnalysisStepConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PreprocessStepConfig {
    pub enabled: bool,
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct UploadStepConfig {
    pub enabled: bool,
    input_path: Option<PathBuf>,
    batch_size: Option<usize>,
    #[serde(default = "default_true")]
    pub create_indexes: bool,
    #[serde(default)]
    retry: RetryConfig,
    export_path: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AnalysisStepConfig {
    pub enabled: bool,
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub use_model: bool,
    fallback_confidence_cap: Option<f32>,
    #[serde(default)]
    pub persist_results: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RetryConfig {
    max_attempts: Option<u32>,
    initial_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CleaningConfig {
    min_review_length: Option<usize>,
    #[serde(default)]
    dedup_key: DedupKey,
    #[serde(default)]
    missing_date: MissingDatePolicy,
    date_sentinel: Option<String>,
    default_source: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct InfraConfig {
    #[serde(default)]
    database: DatabaseConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    connection_string: Option<String>,
    database_name: Option<String>,
    collection_name: Option<String>,
    max_connections: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            steps: StepsConfig::default(),
            cleaning: CleaningConfig::default(),
            infra: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
        }
    }
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessStepConfig::default(),
            upload: UploadStepConfig::default(),
            analysis: AnalysisStepConfig::default(),
        }
    }
}

impl Default for PreprocessStepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_path: None,
            output_path: None,
        }
    }
}

impl Default for UploadStepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            input_path: None,
            batch_size: None,
            create_indexes: true,
            retry: RetryConfig::default(),
            export_path: None,
        }
    }
}

impl Default for AnalysisStepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_path: None,
            output_dir: None,
            use_model: true,
            fallback_confidence_cap: None,
            persist_results: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: None,
            max_backoff_ms: None,
            multiplier: None,
            jitter: None,
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_review_length: None,
            dedup_key: DedupKey::default(),
            missing_date: MissingDatePolicy::default(),
            date_sentinel: None,
            default_source: None,
        }
    }
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            database_name: None,
            collection_name: None,
            max_connections: None,
        }
    }
}

impl Config {
    /// Reads `./config.toml`, then `/config/config.toml`, and applies the
    /// environment overrides.
    pub fn try_load() -> Result<Self, ConfigError> {
        let mut config = Self::load_first(&["./config.toml", "/config/config.toml"])?;

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses the first file of `paths` that can be read. A file that exists
    /// but does not parse is an error, the next path is not tried.
    pub fn load_first<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut last_err = None;
        for path in paths {
            match read_to_string(path) {
                Ok(contents) => return Self::from_toml_str(&contents),
                Err(err) => last_err = Some(err),
            }
        }

        Err(ConfigError::Read(last_err.unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no config path given"))))
    }

    /// Defaults plus environment overrides, used when no config file can be read.
    pub fn fallback(err: ConfigError) -> Self {
        warn!("failed to read config, using defaults: {}", err);

        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_toml_str(value: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(value)?)
    }

    /// Overrides database settings with values from the environment.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let mut infra = self.infra();
        infra.database.apply_env(lookup);
        self.infra = Some(infra);
    }

    pub fn infra(&self) -> InfraConfig {
        self.infra.as_ref().cloned().unwrap_or_default()
    }
}

impl PreprocessStepConfig {
    pub fn input_path(&self) -> PathBuf {
        self.input_path.clone().unwrap_or_else(|| PathBuf::from("data/all_reviews_raw.csv"))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| PathBuf::from("data/cleaned_reviews.csv"))
    }
}

impl UploadStepConfig {
    pub fn input_path(&self) -> PathBuf {
        self.input_path.clone().unwrap_or_else(|| PathBuf::from("data/cleaned_reviews.csv"))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(100).max(1)
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Where stored reviews are dumped as JSON after upload, if anywhere.
    pub fn export_path(&self) -> Option<&Path> {
        self.export_path.as_deref()
    }
}

impl AnalysisStepConfig {
    pub fn input_path(&self) -> PathBuf {
        self.input_path.clone().unwrap_or_else(|| PathBuf::from("data/cleaned_reviews.csv"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("reports"))
    }

    pub fn fallback_confidence_cap(&self) -> f32 {
        self.fallback_confidence_cap.unwrap_or(0.6).clamp(0.0, 1.0)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();

        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            initial_backoff: self.initial_backoff_ms.map(Duration::from_millis).unwrap_or(defaults.initial_backoff),
            max_backoff: self.max_backoff_ms.map(Duration::from_millis).unwrap_or(defaults.max_backoff),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}

impl CleaningConfig {
    pub fn normalizer_config(&self) -> NormalizerConfig {
        let defaults = NormalizerConfig::default();

        NormalizerConfig {
            missing_date: self.missing_date,
            date_sentinel: self.date_sentinel.clone().unwrap_or(defaults.date_sentinel),
            default_source: self.default_source.clone().unwrap_or_else(|| DEFAULT_SOURCE.to_owned()),
        }
    }

    pub fn cleaner_config(&self) -> CleanerConfig {
        let defaults = CleanerConfig::default();

        CleanerConfig {
            min_review_length: self.min_review_length.unwrap_or(defaults.min_review_length),
            dedup_key: self.dedup_key,
        }
    }
}

impl InfraConfig {
    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }
}

impl DatabaseConfig {
    pub fn new(connection_string: Option<String>) -> Self {
        Self {
            connection_string,
            ..Self::default()
        }
    }

    pub fn connection_string(&self) -> Option<&String> {
        self.connection_string.as_ref()
    }

    pub fn database_name(&self) -> &str {
        self.database_name.as_deref().unwrap_or("customer_reviews")
    }

    pub fn collection_name(&self) -> &str {
        self.collection_name.as_deref().unwrap_or("reviews")
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(5)
    }

    pub fn with_database_name(mut self, database_name: &str) -> Self {
        self.database_name = Some(database_name.to_owned());
        self
    }

    pub fn with_collection_name(mut self, collection_name: &str) -> Self {
        self.collection_name = Some(collection_name.to_owned());
        self
    }

    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(uri) = lookup(ENV_DATABASE_URI) {
            self.connection_string = Some(uri);
        }
        if let Some(name) = lookup(ENV_DATABASE_NAME) {
            self.database_name = Some(name);
        }
        if let Some(name) = lookup(ENV_COLLECTION_NAME) {
            self.collection_name = Some(name);
        }
    }
}
