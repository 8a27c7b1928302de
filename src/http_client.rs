use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

const DEFAULT_TIMEOUT_SECS: u64 = 8;

// SofaScore serves a stub page to obvious non-browser agents.
const BROWSER_UA: &str = "Mozilla/5.0";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let timeout = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(2, 12);
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("failed to build http client")
    })
}

/// Blocking GET seam. Production goes through the shared reqwest client;
/// tests substitute a fixture-backed implementation.
pub trait Fetch {
    fn get_text(&self, url: &str) -> Result<String>;
}

pub struct HttpFetch;

impl Fetch for HttpFetch {
    fn get_text(&self, url: &str) -> Result<String> {
        let client = http_client()?;
        let resp = client
            .get(url)
            .header(USER_AGENT, BROWSER_UA)
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, error_snippet(&body)));
        }
        Ok(body)
    }
}

fn error_snippet(body: &str) -> String {
    body.trim()
        .replace('\n', " ")
        .replace('\r', " ")
        .chars()
        .take(220)
        .collect()
}
