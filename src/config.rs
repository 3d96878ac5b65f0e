//! Misskey instance configuration.
//!
//! Sources, highest priority first:
//!   --instance URL
//!   MISSKEY_URL
//!   MISSKEY_PROTOCOL (default https) + MISSKEY_DOMAIN + MISSKEY_PATH
//!
//! The access token only comes from MISSKEY_API_TOKEN so it never shows up in
//! process listings.

use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no Misskey instance configured (use --instance, MISSKEY_URL or MISSKEY_DOMAIN)")]
    MissingInstance,

    #[error("unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("invalid instance URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

/// Resolved settings for [`crate::misskey::MisskeyClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Instance root, always ending with '/'.
    pub base_url: Url,
    pub token: Option<SecretString>,
    pub timeout: Duration,
}

/// Raw, unvalidated inputs gathered from the CLI and the environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigSources {
    pub url: Option<String>,
    pub protocol: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigSources {
    pub fn from_env() -> Self {
        Self {
            url: env_non_empty("MISSKEY_URL"),
            protocol: env_non_empty("MISSKEY_PROTOCOL"),
            domain: env_non_empty("MISSKEY_DOMAIN"),
            path: env_non_empty("MISSKEY_PATH"),
            token: env_non_empty("MISSKEY_API_TOKEN"),
            timeout_secs: None,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl ClientConfig {
    pub fn resolve(sources: ConfigSources) -> Result<Self, ConfigError> {
        let base_url = match (&sources.url, &sources.domain) {
            (Some(url), _) => parse_instance_url(url)?,
            (None, Some(domain)) => instance_url(
                sources.protocol.as_deref().unwrap_or("https"),
                domain,
                sources.path.as_deref().unwrap_or(""),
            )?,
            (None, None) => return Err(ConfigError::MissingInstance),
        };

        Ok(Self {
            base_url,
            token: sources
                .token
                .map(|t| SecretString::from(t.trim().to_string())),
            timeout: Duration::from_secs(
                sources
                    .timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

/// Assemble an instance root from its parts, e.g. ("https", "misskey.io", "").
pub fn instance_url(protocol: &str, domain: &str, path: &str) -> Result<Url, ConfigError> {
    let protocol = protocol.trim().trim_end_matches("://");
    let domain = domain.trim().trim_matches('/');
    if domain.is_empty() {
        return Err(ConfigError::MissingInstance);
    }
    let path = path.trim().trim_matches('/');
    let raw = if path.is_empty() {
        format!("{protocol}://{domain}/")
    } else {
        format!("{protocol}://{domain}/{path}/")
    };
    parse_instance_url(&raw)
}

/// Parse a full instance URL; only http(s) is accepted. The result always
/// ends with '/' so endpoint paths can be appended directly.
pub fn parse_instance_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingInstance);
    }
    let mut url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidUrl {
        input: trimmed.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
