use std::path::Path;
use std::time::Duration;

use loginguard_core::nav::{resolve_site, ServiceEntry};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("services request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("failed to read site config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Client for the sibling-service listing.
pub struct NavClient {
    agent: ureq::Agent,
    services_url: String,
    fallback_site: String,
}

impl NavClient {
    pub fn new(services_url: &str, fallback_site: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            services_url: services_url.to_string(),
            fallback_site: fallback_site.to_string(),
        }
    }

    /// Current site key from a local site config file.
    ///
    /// An unreadable file is an error; a file without `login.project`
    /// resolves to the fallback site.
    pub fn site_from_file(&self, path: &Path) -> Result<String, NavError> {
        let text = std::fs::read_to_string(path).map_err(|source| NavError::Config {
            path: path.display().to_string(),
            source,
        })?;
        Ok(resolve_site(&text, &self.fallback_site))
    }

    /// Current site key from a config served over HTTP, falling back on any
    /// failure.
    pub fn site_from_url(&self, config_url: &str) -> String {
        let text = self
            .agent
            .get(config_url)
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string());
        match text {
            Ok(text) => resolve_site(&text, &self.fallback_site),
            Err(e) => {
                tracing::warn!(url = config_url, error = %e, "site config fetch failed; using fallback site");
                self.fallback_site.clone()
            }
        }
    }

    /// Services listed for `site`. Non-2xx responses and malformed bodies
    /// are errors.
    pub fn fetch_services(&self, site: &str) -> Result<Vec<ServiceEntry>, NavError> {
        tracing::debug!(url = %self.services_url, site, "fetching service list");
        let services: Vec<ServiceEntry> = self
            .agent
            .get(&self.services_url)
            .query("site", site)
            .header("Content-Type", "application/json")
            .call()?
            .body_mut()
            .read_json()?;
        tracing::info!(site, count = services.len(), "service list loaded");
        Ok(services)
    }

    /// Services for `site`, or an empty menu when the listing is unavailable.
    pub fn services_or_empty(&self, site: &str) -> Vec<ServiceEntry> {
        self.fetch_services(site).unwrap_or_else(|e| {
            tracing::warn!(site, error = %e, "service list unavailable; leaving dropdown empty");
            Vec::new()
        })
    }
}
