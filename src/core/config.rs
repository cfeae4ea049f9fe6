//! Purpose: Load service credentials and endpoints once, before any operation runs.
//! Exports: `Config`, `RunOptions`, env var name constants.
//! Role: Explicit configuration value handed to the task runner (no global state).
//! Invariants: All three credentials are present and non-blank or loading fails.
//! Invariants: Endpoint bases parse as http(s) URLs without query or fragment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::error::{Error, ErrorKind};
use super::spider::{DEFAULT_TIMEOUT, POLL_INTERVAL};

pub const ENV_SCRAPER_TOKEN: &str = "THORDATA_SCRAPER_TOKEN";
pub const ENV_PUBLIC_TOKEN: &str = "THORDATA_PUBLIC_TOKEN";
pub const ENV_PUBLIC_KEY: &str = "THORDATA_PUBLIC_KEY";
pub const ENV_SCRAPER_API_BASE: &str = "THORDATA_SCRAPER_API_BASE";
pub const ENV_WEB_API_BASE: &str = "THORDATA_WEB_API_BASE";

pub const DEFAULT_SCRAPER_API_BASE: &str = "https://scraperapi.thordata.com";
pub const DEFAULT_WEB_API_BASE: &str = "https://api.thordata.com/api/web-scraper-api";

#[derive(Clone)]
pub struct Config {
    pub scraper_token: String,
    pub public_token: String,
    pub public_key: String,
    pub scraper_api_base: Url,
    pub web_api_base: Url,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("scraper_token", &"<redacted>")
            .field("public_token", &"<redacted>")
            .field("public_key", &"<redacted>")
            .field("scraper_api_base", &self.scraper_api_base.as_str())
            .field("web_api_base", &self.web_api_base.as_str())
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, Error> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    Error::new(ErrorKind::Config)
                        .with_message(format!("missing required credential {name}"))
                        .with_hint(format!(
                            "Set {ENV_SCRAPER_TOKEN}, {ENV_PUBLIC_TOKEN} and {ENV_PUBLIC_KEY} in the environment or a .env file."
                        ))
                })
        };
        let scraper_token = required(ENV_SCRAPER_TOKEN)?;
        let public_token = required(ENV_PUBLIC_TOKEN)?;
        let public_key = required(ENV_PUBLIC_KEY)?;

        let scraper_api_base = parse_base_url(
            ENV_SCRAPER_API_BASE,
            lookup(ENV_SCRAPER_API_BASE).as_deref(),
            DEFAULT_SCRAPER_API_BASE,
        )?;
        let web_api_base = parse_base_url(
            ENV_WEB_API_BASE,
            lookup(ENV_WEB_API_BASE).as_deref(),
            DEFAULT_WEB_API_BASE,
        )?;

        Ok(Self {
            scraper_token,
            public_token,
            public_key,
            scraper_api_base,
            web_api_base,
        })
    }
}

fn parse_base_url(name: &str, raw: Option<&str>, default: &str) -> Result<Url, Error> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default);
    let mut url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Config)
            .with_message(format!("{name} is not a valid URL"))
            .with_source(err)
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::new(ErrorKind::Config)
            .with_message(format!("{name} must use http or https")));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::new(ErrorKind::Config)
            .with_message(format!("{name} must not include query or fragment")));
    }
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    Ok(url)
}

/// Per-invocation knobs supplied on the command line.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub max_wait: Duration,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            output_dir: PathBuf::from("output"),
        }
    }
}
