//! Application state shared by the site handlers.

use std::time::Duration;

use crate::config::SiteUrl;

/// Upper bound for a single render on the downstream SSR server.
const SSR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub site: SiteUrl,
    /// Base URL of the SSR server without a trailing slash, if one is configured.
    pub ssr_downstream: Option<String>,
    pub ssr_client: reqwest::Client,
}

impl AppState {
    pub fn new(site: SiteUrl, ssr_downstream: Option<String>) -> Result<Self, reqwest::Error> {
        // Redirects from the renderer are passed through to the browser untouched.
        // The renderer is a private sibling service, never reached through a proxy.
        let ssr_client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(SSR_TIMEOUT)
            .build()?;

        Ok(Self {
            site,
            ssr_downstream,
            ssr_client,
        })
    }
}
