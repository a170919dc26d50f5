use std::future::Future;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::holiday::{Country, Holiday};

pub const DEFAULT_SOURCE_URL: &str = "http://localhost:5000/api/holidays";

/// Supplier of holiday and country lists. Errors are reported to the caller;
/// the controller is responsible for degrading to an empty list.
pub trait HolidaySource {
    fn list_holidays(
        &self,
        country: &str,
        year: i32,
    ) -> impl Future<Output = anyhow::Result<Vec<Holiday>>>;

    fn list_countries(&self) -> impl Future<Output = anyhow::Result<Vec<Country>>>;
}

#[derive(Debug, Clone)]
pub struct HttpHolidaySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHolidaySource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            bail!("holiday source URL is empty");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for holiday source")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn countries_url(&self) -> String {
        format!("{}/countries", self.base_url)
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> anyhow::Result<String> {
        let parsed = if query.is_empty() {
            reqwest::Url::parse(url)
        } else {
            reqwest::Url::parse_with_params(url, query)
        };
        let url = parsed.with_context(|| format!("invalid holiday source URL: {url}"))?;
        let url = url.as_str();
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("failed requesting {url}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body from {url}"))?;

        if !status.is_success() {
            warn!(url, status = %status, "holiday source returned non-success status");
            return Err(anyhow!("holiday source returned HTTP {status} for {url}"));
        }

        debug!(url, bytes = body.len(), "holiday source responded");
        Ok(body)
    }
}

impl HolidaySource for HttpHolidaySource {
    #[tracing::instrument(skip(self))]
    async fn list_holidays(&self, country: &str, year: i32) -> anyhow::Result<Vec<Holiday>> {
        let query = [("country", country.to_string()), ("year", year.to_string())];
        let body = self.get_text(&self.base_url, &query).await?;
        decode_holidays(&body)
    }

    #[tracing::instrument(skip(self))]
    async fn list_countries(&self) -> anyhow::Result<Vec<Country>> {
        let url = self.countries_url();
        let body = self.get_text(&url, &[]).await?;
        decode_countries(&body)
    }
}

pub fn decode_holidays(body: &str) -> anyhow::Result<Vec<Holiday>> {
    decode_list(body, "holiday")
}

pub fn decode_countries(body: &str) -> anyhow::Result<Vec<Country>> {
    decode_list(body, "country")
}

fn decode_list<T: DeserializeOwned>(body: &str, what: &str) -> anyhow::Result<Vec<T>> {
    serde_json::from_str(body).with_context(|| format!("failed decoding {what} list"))
}
