//! Configuration loading and validation for the gateway sidecar.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Secrets Manager identifier of the token encryption key. **Required.**
    pub key_secret_id: String,

    /// S3 bucket holding the stored token envelopes. **Required.**
    pub token_bucket: String,

    /// S3 key prefix under which envelope objects live.
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,

    /// HTTP header carrying the candidate plaintext token.
    #[serde(default = "default_token_header")]
    pub token_header_name: String,

    /// HTTP header carrying the URI of the request being authorized
    /// (the reverse proxy's auth subrequest sets this).
    #[serde(default = "default_original_uri_header")]
    pub original_uri_header: String,

    /// Path prefix that requires a valid token.
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,

    /// Comma-separated path prefixes exempt from token checks even when they
    /// fall under the protected prefix.
    #[serde(default)]
    pub excluded_prefixes: String,

    /// How often (seconds) to re-fetch the encryption key from Secrets Manager.
    #[serde(default = "default_key_refresh_interval")]
    pub key_refresh_interval_secs: u64,

    /// How often (seconds) to refresh the cached envelope listing from S3.
    #[serde(default = "default_token_refresh_interval")]
    pub token_refresh_interval_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// OTLP endpoint for span export. When unset, telemetry stays local.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_token_prefix() -> String {
    "tokens/".into()
}
fn default_token_header() -> String {
    "x-api-token".into()
}
fn default_original_uri_header() -> String {
    "x-original-uri".into()
}
fn default_protected_prefix() -> String {
    "/".into()
}
fn default_key_refresh_interval() -> u64 {
    3600
}
fn default_token_refresh_interval() -> u64 {
    300
}
fn default_http_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The excluded path prefixes, split out of their comma-separated form.
    pub fn excluded_prefix_list(&self) -> Vec<String> {
        self.excluded_prefixes
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.key_secret_id, "KEY_SECRET_ID")?;
        ensure_non_empty(&self.token_bucket, "TOKEN_BUCKET")?;
        ensure_non_empty(&self.protected_prefix, "PROTECTED_PREFIX")?;

        if self.key_refresh_interval_secs == 0 {
            anyhow::bail!("KEY_REFRESH_INTERVAL_SECS must be > 0");
        }
        if self.token_refresh_interval_secs == 0 {
            anyhow::bail!("TOKEN_REFRESH_INTERVAL_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            key_secret_id: "tokengate/encryption-key".into(),
            token_bucket: "bucket".into(),
            token_prefix: default_token_prefix(),
            token_header_name: default_token_header(),
            original_uri_header: default_original_uri_header(),
            protected_prefix: default_protected_prefix(),
            excluded_prefixes: String::new(),
            key_refresh_interval_secs: default_key_refresh_interval(),
            token_refresh_interval_secs: default_token_refresh_interval(),
            http_port: default_http_port(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_token_prefix(), "tokens/");
        assert_eq!(default_token_header(), "x-api-token");
        assert_eq!(default_original_uri_header(), "x-original-uri");
        assert_eq!(default_protected_prefix(), "/");
        assert_eq!(default_key_refresh_interval(), 3600);
        assert_eq!(default_token_refresh_interval(), 300);
        assert_eq!(default_http_port(), 8080);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_base_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_secret_id() {
        let cfg = Config {
            key_secret_id: "".into(),
            ..base_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_bucket() {
        let cfg = Config {
            token_bucket: "  ".into(),
            ..base_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_refresh_interval() {
        let cfg = Config {
            token_refresh_interval_secs: 0,
            ..base_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn excluded_prefixes_split_and_trimmed() {
        let cfg = Config {
            excluded_prefixes: "/health, /public ,,/static".into(),
            ..base_config()
        };
        assert_eq!(
            cfg.excluded_prefix_list(),
            vec!["/health", "/public", "/static"]
        );
    }

    #[test]
    fn empty_excluded_prefixes_yield_no_entries() {
        assert!(base_config().excluded_prefix_list().is_empty());
    }
}
