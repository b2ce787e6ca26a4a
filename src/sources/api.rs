use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use url::Url;

use crate::draw::{DrawRecord, FetchTarget};
use crate::error::{ExtractError, FetchError};
use crate::extract::api::{extract_api_record, LottoNumberPayload};
use crate::source::{DrawSource, RawContent};

const SOURCE_NAME: &str = "lottery-api";
const METHOD: &str = "getLottoNumber";

/// Round-indexed JSON endpoint of the lottery operator.
///
/// `GET {base}?method=getLottoNumber&drwNo={round}`. Does not serve
/// [`FetchTarget::Latest`].
#[derive(Clone)]
pub struct LotteryApiSource {
    base_url: Url,
    client: reqwest::Client,
}

impl LotteryApiSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid API url {}", base_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { base_url, client })
    }

    pub fn round_url(&self, round: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("method", METHOD)
            .append_pair("drwNo", &round.to_string());
        url
    }
}

#[async_trait]
impl DrawSource for LotteryApiSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn supports(&self, target: FetchTarget) -> bool {
        matches!(target, FetchTarget::Round(_))
    }

    async fn fetch(&self, target: FetchTarget) -> Result<RawContent, FetchError> {
        let round = match target {
            FetchTarget::Round(r) => r,
            FetchTarget::Latest => {
                return Err(FetchError::Unsupported {
                    source_name: SOURCE_NAME,
                    target,
                })
            }
        };

        let url = self.round_url(round);
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("⚠️ {} answered HTTP {} for round {}", SOURCE_NAME, status, round);
            return Err(FetchError::unavailable(SOURCE_NAME, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        // A well-formed payload with a non-success status means the round is not drawn yet.
        if let Ok(payload) = LottoNumberPayload::parse(&body) {
            if !payload.is_success() {
                return Err(FetchError::NotPublished {
                    source_name: SOURCE_NAME,
                    target,
                });
            }
        }

        Ok(RawContent::new(body))
    }

    fn extract(&self, raw: &RawContent) -> Result<DrawRecord, ExtractError> {
        extract_api_record(&raw.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> LotteryApiSource {
        LotteryApiSource::new("https://www.dhlottery.co.kr/common.do", Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn round_url_carries_method_and_round() {
        assert_eq!(
            source().round_url(1206).as_str(),
            "https://www.dhlottery.co.kr/common.do?method=getLottoNumber&drwNo=1206"
        );
    }

    #[test]
    fn only_round_targets_are_supported() {
        let s = source();
        assert!(s.supports(FetchTarget::Round(1)));
        assert!(!s.supports(FetchTarget::Latest));
    }

    #[tokio::test]
    async fn latest_is_refused_without_a_request() {
        let err = source().fetch(FetchTarget::Latest).await.unwrap_err();
        assert!(matches!(err, FetchError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let s = LotteryApiSource::new("http://127.0.0.1:1/common.do", Duration::from_secs(2)).unwrap();
        let err = s.fetch(FetchTarget::Round(1)).await.unwrap_err();
        assert!(err.is_transient());
    }
}
