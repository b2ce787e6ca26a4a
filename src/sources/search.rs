use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;

use crate::calendar::DrawCalendar;
use crate::draw::{DrawRecord, FetchTarget};
use crate::error::{ExtractError, FetchError};
use crate::extract::markup::extract_markup_record;
use crate::source::{DrawSource, RawContent};

const SOURCE_NAME: &str = "search-page";

/// Best-effort scrape of a search results page that shows the newest draw.
///
/// Serves [`FetchTarget::Latest`] only. The page does not reliably carry a
/// date, so the record's date comes from the calendar.
pub struct SearchPageSource {
    url: String,
    client: reqwest::Client,
    calendar: DrawCalendar,
}

impl SearchPageSource {
    pub fn new(url: &str, user_agent: &str, timeout: Duration, calendar: DrawCalendar) -> Result<Self> {
        // Browser-like headers, the page serves a stripped variant to bots
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.to_string(),
            client,
            calendar,
        })
    }
}

#[async_trait]
impl DrawSource for SearchPageSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn supports(&self, target: FetchTarget) -> bool {
        target == FetchTarget::Latest
    }

    async fn fetch(&self, target: FetchTarget) -> Result<RawContent, FetchError> {
        if !self.supports(target) {
            return Err(FetchError::Unsupported {
                source_name: SOURCE_NAME,
                target,
            });
        }

        debug!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("⚠️ {} answered HTTP {}", SOURCE_NAME, status);
            return Err(FetchError::unavailable(SOURCE_NAME, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;
        Ok(RawContent::new(body))
    }

    fn extract(&self, raw: &RawContent) -> Result<DrawRecord, ExtractError> {
        extract_markup_record(&raw.body, &self.calendar)
    }
}
