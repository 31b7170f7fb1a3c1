//! Process configuration, read once at startup and injected into the notifier.

use anyhow::{bail, Context};
use bitbucket::Credentials;
use notification::{ErrorStatusPolicy, DEFAULT_API_BASE};

/// Port the push listener binds when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    /// `USERNAME` / `PASSWORD`. Missing variables become empty strings.
    pub credentials: Credentials,
    /// `BITBUCKET_API_BASE`.
    pub api_base: String,
    /// `FAIL_ON_ERROR_STATUS`.
    pub error_status_policy: ErrorStatusPolicy,
    /// `PORT`.
    pub port: u16,
    /// `OTEL_EXPORTER_OTLP_ENDPOINT`. Traces are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` if it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            lookup("USERNAME").unwrap_or_default(),
            lookup("PASSWORD").unwrap_or_default(),
        );

        let api_base = lookup("BITBUCKET_API_BASE")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let fail_on_error_status = match lookup("FAIL_ON_ERROR_STATUS") {
            Some(value) => parse_flag(&value).context("FAIL_ON_ERROR_STATUS")?,
            None => false,
        };
        let error_status_policy = if fail_on_error_status {
            ErrorStatusPolicy::Fail
        } else {
            ErrorStatusPolicy::Ignore
        };

        let port = match lookup("PORT").filter(|value| !value.is_empty()) {
            Some(value) => value
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{value}'"))?,
            None => DEFAULT_PORT,
        };

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|value| !value.is_empty());

        Ok(Self {
            credentials,
            api_base,
            error_status_policy,
            port,
            otlp_endpoint,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => bail!("expected a boolean, got '{other}'"),
    }
}
