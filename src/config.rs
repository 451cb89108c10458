//! Probe configuration: loading, validation, and defaults
//!
//! Configuration is read once at startup from a YAML (or JSON) file and is
//! immutable afterwards. Anything invalid is fatal before probing starts —
//! there is no such thing as a runtime configuration error.

use crate::store::StoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration failures are startup-fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse configuration as YAML or JSON: {0}")]
    Parse(String),

    #[error("missing mandatory key '{0}'")]
    MissingKey(&'static str),

    #[error("missing or zero key '{0}'")]
    ZeroKey(&'static str),
}

/// Log output settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSection {
    /// Emit JSON lines instead of the compact human format
    #[serde(default)]
    pub json: bool,

    /// Minimum level to emit
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Metrics endpoint and cycle cadence
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExporterSection {
    /// Port the scrape endpoint listens on
    #[serde(default)]
    pub port: u16,

    /// HTTP path that serves the metrics
    #[serde(default)]
    pub path: String,

    /// Seconds between probe cycles
    #[serde(default)]
    pub interval_duration: u64,

    /// Metric namespace prefix; empty means the built-in default
    #[serde(default)]
    pub namespace: String,
}

impl ExporterSection {
    /// Interval between probe cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_duration)
    }

    /// Configured namespace, or the built-in default when empty
    pub fn namespace(&self) -> &str {
        if self.namespace.is_empty() {
            crate::metrics::DEFAULT_NAMESPACE
        } else {
            &self.namespace
        }
    }
}

/// Object-store endpoint, keys, and feature toggles
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Section {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub bucket: String,

    /// Key of the object the download step reads
    #[serde(default, rename = "download_file_name")]
    pub download_key: String,

    /// Local path of the expected download content
    #[serde(default)]
    pub download_file_path: PathBuf,

    /// Key the upload steps write
    #[serde(default, rename = "upload_file_name")]
    pub upload_key: String,

    /// Local path of the upload payload
    #[serde(default)]
    pub upload_file_path: PathBuf,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default)]
    pub enable_multipart_upload_check: bool,

    // Key spelling is inherited config surface; kept for compatibility.
    #[serde(default, rename = "enable_versionning_check")]
    pub enable_versioning_check: bool,

    /// Accepted for config compatibility; no locking probe step exists.
    #[serde(default)]
    pub enable_locking_object_check: bool,

    #[serde(default)]
    pub s3_force_path_style: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogSection,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub s3: S3Section,
}

impl Config {
    /// Load and validate a configuration file. YAML is tried first, then
    /// JSON; the YAML error is reported when both fail.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        match serde_yaml::from_str(content) {
            Ok(config) => Ok(config),
            Err(yaml_err) => serde_json::from_str(content)
                .map_err(|_| ConfigError::Parse(yaml_err.to_string())),
        }
    }

    /// Check every mandatory key, naming the offender.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s3 = &self.s3;
        if s3.url.is_empty() {
            return Err(ConfigError::MissingKey("s3.url"));
        }
        if s3.bucket.is_empty() {
            return Err(ConfigError::MissingKey("s3.bucket"));
        }
        if s3.region.is_empty() {
            return Err(ConfigError::MissingKey("s3.region"));
        }
        if s3.download_key.is_empty() {
            return Err(ConfigError::MissingKey("s3.download_file_name"));
        }
        if s3.download_file_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey("s3.download_file_path"));
        }
        if s3.upload_key.is_empty() {
            return Err(ConfigError::MissingKey("s3.upload_file_name"));
        }
        if s3.upload_file_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey("s3.upload_file_path"));
        }
        if s3.api_key.is_empty() {
            return Err(ConfigError::MissingKey("s3.api_key"));
        }
        if s3.secret_access_key.is_empty() {
            return Err(ConfigError::MissingKey("s3.secret_access_key"));
        }

        let exporter = &self.exporter;
        if exporter.path.is_empty() {
            return Err(ConfigError::MissingKey("exporter.path"));
        }
        if exporter.port == 0 {
            return Err(ConfigError::ZeroKey("exporter.port"));
        }
        if exporter.interval_duration == 0 {
            return Err(ConfigError::ZeroKey("exporter.interval_duration"));
        }

        Ok(())
    }

    /// Connection settings for the S3 backend
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            endpoint: self.s3.url.clone(),
            region: self.s3.region.clone(),
            bucket: self.s3.bucket.clone(),
            access_key: self.s3.api_key.clone(),
            secret_key: self.s3.secret_access_key.clone(),
            force_path_style: self.s3.s3_force_path_style,
        }
    }

    /// Step selection for the probe cycle
    pub fn cycle_options(&self) -> crate::probe::CycleOptions {
        crate::probe::CycleOptions {
            upload_key: self.s3.upload_key.clone(),
            download_key: self.s3.download_key.clone(),
            multipart_check: self.s3.enable_multipart_upload_check,
            versioning_check: self.s3.enable_versioning_check,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_YAML: &str = r#"
log:
  json: true
  level: debug
exporter:
  port: 9190
  path: /metrics
  interval_duration: 30
  namespace: storageprobe
s3:
  url: http://minio.example.net:9000
  region: us-east-1
  bucket: probe-bucket
  download_file_name: canary-download.bin
  download_file_path: /etc/probe/download.bin
  upload_file_name: canary-upload.bin
  upload_file_path: /etc/probe/upload.bin
  api_key: AKIA000
  secret_access_key: secret000
  enable_versionning_check: true
  enable_multipart_upload_check: true
  s3_force_path_style: true
"#;

    #[test]
    fn test_parse_valid_yaml() {
        let config = Config::parse(VALID_YAML).unwrap();
        config.validate().unwrap();

        assert!(config.log.json);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.exporter.port, 9190);
        assert_eq!(config.exporter.interval(), Duration::from_secs(30));
        assert_eq!(config.exporter.namespace(), "storageprobe");
        assert_eq!(config.s3.download_key, "canary-download.bin");
        assert!(config.s3.enable_versioning_check);
        assert!(config.s3.enable_multipart_upload_check);
        assert!(!config.s3.enable_locking_object_check);
        assert!(config.s3.s3_force_path_style);
    }

    #[test]
    fn test_parse_json_fallback() {
        let json = r#"{
            "exporter": {"port": 9190, "path": "/metrics", "interval_duration": 10},
            "s3": {
                "url": "http://localhost:9000", "region": "r", "bucket": "b",
                "download_file_name": "d", "download_file_path": "/d",
                "upload_file_name": "u", "upload_file_path": "/u",
                "api_key": "k", "secret_access_key": "s"
            }
        }"#;
        let config = Config::parse(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.s3.bucket, "b");
    }

    #[test]
    fn test_flags_default_false() {
        let config = Config::parse(VALID_YAML).unwrap();
        // Only the toggles present in the file are set
        assert!(!config.s3.enable_locking_object_check);

        let minimal = VALID_YAML
            .replace("  enable_versionning_check: true\n", "")
            .replace("  enable_multipart_upload_check: true\n", "");
        let config = Config::parse(&minimal).unwrap();
        assert!(!config.s3.enable_versioning_check);
        assert!(!config.s3.enable_multipart_upload_check);
    }

    #[test]
    fn test_validation_names_the_missing_key() {
        let cases = [
            ("  url: http://minio.example.net:9000\n", "s3.url"),
            ("  bucket: probe-bucket\n", "s3.bucket"),
            ("  region: us-east-1\n", "s3.region"),
            (
                "  download_file_name: canary-download.bin\n",
                "s3.download_file_name",
            ),
            (
                "  download_file_path: /etc/probe/download.bin\n",
                "s3.download_file_path",
            ),
            (
                "  upload_file_name: canary-upload.bin\n",
                "s3.upload_file_name",
            ),
            (
                "  upload_file_path: /etc/probe/upload.bin\n",
                "s3.upload_file_path",
            ),
            ("  api_key: AKIA000\n", "s3.api_key"),
            ("  secret_access_key: secret000\n", "s3.secret_access_key"),
            ("  path: /metrics\n", "exporter.path"),
        ];

        for (line, expected_key) in cases {
            let without = VALID_YAML.replace(line, "");
            let err = Config::parse(&without).unwrap().validate().unwrap_err();
            assert!(
                format!("{}", err).contains(expected_key),
                "expected '{}' in '{}'",
                expected_key,
                err
            );
        }
    }

    #[test]
    fn test_zero_port_and_interval_rejected() {
        let zero_port = VALID_YAML.replace("port: 9190", "port: 0");
        let err = Config::parse(&zero_port).unwrap().validate().unwrap_err();
        assert!(format!("{}", err).contains("exporter.port"));

        let zero_interval = VALID_YAML.replace("interval_duration: 30", "interval_duration: 0");
        let err = Config::parse(&zero_interval)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(format!("{}", err).contains("exporter.interval_duration"));
    }

    #[test]
    fn test_namespace_defaults_when_empty() {
        let without = VALID_YAML.replace("  namespace: storageprobe\n", "");
        let config = Config::parse(&without).unwrap();
        assert_eq!(config.exporter.namespace(), "bucketprobe");
    }

    #[test]
    fn test_unparseable_content_reports_parse_error() {
        let err = Config::parse(": not valid : yaml : [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_store_config_and_cycle_options_mapping() {
        let config = Config::parse(VALID_YAML).unwrap();

        let store = config.store_config();
        assert_eq!(store.endpoint, "http://minio.example.net:9000");
        assert!(store.force_path_style);

        let opts = config.cycle_options();
        assert_eq!(opts.upload_key, "canary-upload.bin");
        assert_eq!(opts.download_key, "canary-download.bin");
        assert!(opts.multipart_check);
        assert!(opts.versioning_check);
    }
}
