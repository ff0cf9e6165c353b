use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ingest_carbon::{CarbonIngesterConfig, Rules};
use ingest_log::LogConfig;
use ingest_statsd::MetricsClientConfig;
use serde::{Deserialize, Serialize};

/// Indicates config related errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Parsing or emitting YAML failed.
    #[error("could not parse yaml config")]
    BadYaml,
    /// Invalid config value.
    #[error("invalid config value")]
    InvalidValue,
}

/// Defines the origin of a config error.
#[derive(Debug, Default)]
enum ConfigErrorSource {
    /// An error occurring independently.
    #[default]
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating from a specific field.
    Field(&'static str),
}

impl fmt::Display for ConfigErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::File(path) => write!(f, " (file {})", path.display()),
            Self::Field(name) => write!(f, " (field {name})"),
        }
    }
}

/// Indicates config related errors.
#[derive(Debug, thiserror::Error)]
#[error("{kind}{origin}")]
pub struct ConfigError {
    kind: ConfigErrorKind,
    origin: ConfigErrorSource,
    #[source]
    error: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ConfigError {
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            origin: ConfigErrorSource::None,
            error: None,
        }
    }

    fn wrap<E>(error: E, kind: ConfigErrorKind) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            error: Some(Box::new(error)),
            ..Self::new(kind)
        }
    }

    fn for_field<E>(error: E, field: &'static str) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap(error, ConfigErrorKind::InvalidValue).field(field)
    }

    fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.origin = ConfigErrorSource::File(path.as_ref().to_path_buf());
        self
    }

    fn field(mut self, name: &'static str) -> Self {
        self.origin = ConfigErrorSource::Field(name);
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

/// Controls internal reporting to statsd.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Hostname and port of the statsd server.
    ///
    /// Defaults to `None`, which disables internal metrics.
    pub statsd: Option<String>,
    /// Common prefix that should be added to all metrics.
    ///
    /// Defaults to `"ingest"`.
    pub prefix: String,
    /// Default tags to apply to all metrics.
    pub default_tags: BTreeMap<String, String>,
    /// Global sample rate for all emitted metrics between `0.0` and `1.0`.
    ///
    /// Defaults to `1.0`.
    pub sample_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            statsd: None,
            prefix: "ingest".to_owned(),
            default_tags: BTreeMap::new(),
            sample_rate: 1.0,
        }
    }
}

/// The full configuration of the ingestion front end.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LogConfig,
    /// Internal metrics configuration.
    pub metrics: MetricsConfig,
    /// Carbon ingestion rules.
    pub carbon: CarbonIngesterConfig,
}

impl Config {
    /// Loads and validates the configuration from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let file = fs::File::open(path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(path))?;
        let config: Self = serde_yaml::from_reader(io::BufReader::new(file))
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(path))?;

        config.validate().map_err(|e| e.file(path))?;
        Ok(config)
    }

    /// Parses and validates the configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml))?;

        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.carbon_rules()?;

        let rate = self.metrics.sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(
                ConfigError::new(ConfigErrorKind::InvalidValue).field("metrics.sample_rate")
            );
        }

        Ok(())
    }

    /// Compiles the carbon ingestion rules.
    pub fn carbon_rules(&self) -> Result<Rules, ConfigError> {
        Rules::compile(&self.carbon).map_err(|e| ConfigError::for_field(e, "carbon.rules"))
    }

    /// Initializes logging.
    pub fn init_logging(&self) {
        ingest_log::init(&self.logging);
    }

    /// Initializes the global statsd client if a statsd server is configured.
    pub fn init_metrics(&self) -> Result<(), ConfigError> {
        let Some(host) = self.metrics.statsd.as_deref() else {
            return Ok(());
        };

        ingest_statsd::init(MetricsClientConfig {
            prefix: &self.metrics.prefix,
            host,
            default_tags: self.metrics.default_tags.clone(),
            default_sample_rate: self.metrics.sample_rate.into(),
        })
        .map_err(|e| ConfigError::for_field(e, "metrics.statsd"))
    }
}
