//! Public site URL and the canonical origin derived from it.

use url::Url;

/// Used when `SITE_URL` is unset or invalid.
pub const FALLBACK_SITE_URL: &str = "https://example.com";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SiteUrlError {
    #[error("invalid site URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("site URL must use http or https, got {0:?}")]
    Scheme(String),
}

/// A normalized site URL: no trailing slash, http(s) only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrl {
    url: String,
    origin: String,
}

impl SiteUrl {
    pub fn parse(raw: &str) -> Result<Self, SiteUrlError> {
        let parsed = Url::parse(raw.trim())?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SiteUrlError::Scheme(parsed.scheme().to_owned()));
        }

        // http(s) URLs always have a tuple origin.
        let origin = parsed.origin().ascii_serialization();

        Ok(Self {
            url: parsed.as_str().trim_end_matches('/').to_owned(),
            origin,
        })
    }

    /// Parse `raw`, falling back to [`FALLBACK_SITE_URL`].
    pub fn resolve(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            tracing::info!(fallback = FALLBACK_SITE_URL, "SITE_URL not set, using fallback");
            return Self::fallback();
        };

        match Self::parse(raw) {
            Ok(site) => site,
            Err(e) => {
                tracing::warn!(error = %e, value = raw, fallback = FALLBACK_SITE_URL, "ignoring invalid SITE_URL");
                Self::fallback()
            }
        }
    }

    fn fallback() -> Self {
        Self {
            url: FALLBACK_SITE_URL.to_owned(),
            origin: FALLBACK_SITE_URL.to_owned(),
        }
    }

    /// Full URL, e.g. `https://example.com/portfolio`.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Origin used for CORS, e.g. `https://example.com`.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}
