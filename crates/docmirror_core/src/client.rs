use std::env;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;

use crate::config::MirrorConfig;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRIES: usize = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 350;

/// Source of raw page text. The mirror pipeline only ever asks for a URL's
/// body, so tests inject an in-memory implementation and never touch the
/// network.
pub trait PageFetcher: Sync {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Shared blocking HTTP client with per-request timeout and bounded
/// retries. `rayon` workers borrow one instance concurrently; `Client`
/// handles its own connection pooling.
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
    retries: usize,
    retry_delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let timeout_ms = env_u64("DOCMIRROR_HTTP_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS);
        let retries = env_u64("DOCMIRROR_HTTP_RETRIES")
            .map(|value| value as usize)
            .unwrap_or(DEFAULT_RETRIES);
        let retry_delay_ms =
            env_u64("DOCMIRROR_HTTP_RETRY_DELAY_MS").unwrap_or(DEFAULT_RETRY_DELAY_MS);

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            user_agent: config.user_agent(),
            retries,
            retry_delay_ms,
        })
    }

    fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.clone())
            .header("Accept", "text/markdown, text/plain;q=0.9, */*;q=0.5")
            .send()
            .with_context(|| format!("failed to fetch {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} while fetching {}", status.as_u16(), url);
        }
        response
            .text()
            .with_context(|| format!("failed to read response body from {url}"))
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let mut last_error = None;
        for attempt in 0..=self.retries {
            match self.fetch_once(url) {
                Ok(text) => return Ok(text),
                Err(error) => {
                    last_error = Some(error);
                    if attempt < self.retries {
                        sleep(Duration::from_millis(
                            self.retry_delay_ms.saturating_mul(attempt as u64 + 1),
                        ));
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("request failed: {url}")))
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
}
