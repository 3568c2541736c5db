//! Application configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional `folio.toml`
//! in the working directory, then raw environment variables (`PORT`,
//! `SITE_URL`, ...). Keys are matched case-insensitively.

pub mod site;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
    value::UncasedStr,
};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

use crate::edge::routing::{DEFAULT_RESUME_PATH, ResumePathError, ResumeRouter};

pub use site::{SiteUrl, SiteUrlError};

const CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid RESUME_PATH")]
    ResumePath(#[from] ResumePathError),
    #[error("invalid SSR_DOWNSTREAM URL {value:?}")]
    Downstream {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Log level for this crate's targets; `RUST_LOG` overrides it entirely.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the site. Invalid or missing values fall back to
    /// [`site::FALLBACK_SITE_URL`].
    #[serde(default)]
    pub site_url: Option<String>,
    /// Directory of pre-built site assets, including the resume.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Base URL of the server-side renderer, if any.
    #[serde(default)]
    pub ssr_downstream: Option<String>,
    #[serde(default = "default_resume_path")]
    pub resume_path: String,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            port: default_port(),
            site_url: None,
            static_dir: default_static_dir(),
            ssr_downstream: None,
            resume_path: default_resume_path(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Config {
    /// Load from `folio.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::raw().map(|k| {
                if k == UncasedStr::new("RAILWAY_DEPLOYMENT_DRAINING_SECONDS") {
                    "SHUTDOWN_TIMEOUT".into()
                } else {
                    k.into()
                }
            }))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.resume_router()?;

        if let Some(ref downstream) = self.ssr_downstream {
            url::Url::parse(downstream).map_err(|source| ConfigError::Downstream {
                value: downstream.clone(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn resume_router(&self) -> Result<ResumeRouter, ConfigError> {
        Ok(ResumeRouter::new(&self.resume_path)?)
    }

    pub fn site(&self) -> SiteUrl {
        SiteUrl::resolve(self.site_url.as_deref())
    }

    /// Downstream base URL without a trailing slash.
    pub fn ssr_downstream(&self) -> Option<String> {
        self.ssr_downstream
            .as_deref()
            .map(|s| s.trim_end_matches('/').to_owned())
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_resume_path() -> String {
    DEFAULT_RESUME_PATH.to_owned()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

/// Accepts integer seconds (as Railway provides) or a duration string like `"90s"` or `"2m"`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => {
            let parsed = fundu::DurationParser::with_all_time_units()
                .parse(text.trim())
                .map_err(|e| D::Error::custom(format!("invalid duration {text:?}: {e}")))?;
            parsed
                .try_into()
                .map_err(|e| D::Error::custom(format!("invalid duration {text:?}: {e}")))
        }
    }
}
