//! Host-based routing for the resume subdomain.
//!
//! Any request whose `Host` starts with `resume.` is served the resume asset
//! through an internal rewrite; the address bar keeps the original URL. The
//! prefix check runs on the raw header bytes: no port stripping, no case
//! folding.

use axum::http::uri::PathAndQuery;

const RESUME_HOST_PREFIX: &str = "resume.";

/// Default location of the resume artifact inside the static directory.
pub const DEFAULT_RESUME_PATH: &str = "/resume.pdf";

/// What the edge layer should do with a request's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    PassThrough,
    RewriteToResume { path: String },
}

impl RouteDecision {
    pub fn is_rewrite(&self) -> bool {
        matches!(self, RouteDecision::RewriteToResume { .. })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResumePathError {
    #[error("resume path must be absolute, got {0:?}")]
    Relative(String),
    #[error("resume path {0:?} is not a valid URI path")]
    Invalid(String),
    #[error("resume path {0:?} must not carry a query or fragment")]
    NotBarePath(String),
}

#[derive(Debug, Clone)]
pub struct ResumeRouter {
    resume_path: PathAndQuery,
}

impl Default for ResumeRouter {
    fn default() -> Self {
        Self {
            resume_path: PathAndQuery::from_static(DEFAULT_RESUME_PATH),
        }
    }
}

impl ResumeRouter {
    /// Accepts only a bare absolute path, so the rewrite target is always a
    /// valid request path.
    pub fn new(resume_path: &str) -> Result<Self, ResumePathError> {
        if !resume_path.starts_with('/') {
            return Err(ResumePathError::Relative(resume_path.to_owned()));
        }

        let parsed = PathAndQuery::try_from(resume_path)
            .map_err(|_| ResumePathError::Invalid(resume_path.to_owned()))?;

        // The parser drops fragments silently.
        if parsed.query().is_some() || parsed.as_str() != resume_path {
            return Err(ResumePathError::NotBarePath(resume_path.to_owned()));
        }

        Ok(Self {
            resume_path: parsed,
        })
    }

    pub fn resume_path(&self) -> &str {
        self.resume_path.path()
    }

    pub(crate) fn resume_target(&self) -> &PathAndQuery {
        &self.resume_path
    }

    /// Classify a request by its `Host` header value and path.
    pub fn decide(&self, host: Option<&str>, path: &str) -> RouteDecision {
        let is_resume_host = host.is_some_and(|h| h.starts_with(RESUME_HOST_PREFIX));

        // Already canonical: rewriting again would loop.
        if !is_resume_host || path == self.resume_path() {
            return RouteDecision::PassThrough;
        }

        RouteDecision::RewriteToResume {
            path: self.resume_path().to_owned(),
        }
    }
}
