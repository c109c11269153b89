//! Scraping proxy transport.
//!
//! The proxy takes the target search url as a query parameter and deals
//! with basic bot defenses on its side; we only speak plain HTTP GET to
//! it. Fixed timeout and no retries: a hung source burns its timeout and
//! gets skipped by the caller.

use crate::config::DiscoveryConfig;
use anyhow::anyhow;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

pub trait SearchFetcher: Send + Sync {
    /// Fetch the raw HTML body for a target search url.
    fn fetch(&self, target_url: &str) -> anyhow::Result<String>;
}

pub struct ProxyFetcher {
    config: DiscoveryConfig,
}

impl ProxyFetcher {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }
}

impl SearchFetcher for ProxyFetcher {
    fn fetch(&self, target_url: &str) -> anyhow::Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;

        let mut request = client.get(&self.config.endpoint).query(&[
            ("url", target_url),
            ("country_code", self.config.country_code.as_str()),
        ]);

        if let Some(ref api_key) = self.config.api_key {
            request = request.query(&[("api_key", api_key.as_str())]);
        }

        if let Some(ref token) = self.config.auth_token {
            request = request.header(AUTHORIZATION, format!("Basic {token}"));
        } else if let Some(ref username) = self.config.username {
            let credentials = format!(
                "{username}:{}",
                self.config.password.as_deref().unwrap_or_default()
            );
            request = request.header(AUTHORIZATION, format!("Basic {}", STANDARD.encode(credentials)));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("proxy returned {status} for {target_url}"));
        }

        Ok(response.text()?)
    }
}
