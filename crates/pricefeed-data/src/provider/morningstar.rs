//! Morningstar 시세 헤더 조회.
//!
//! `GET {base_url}{path}?t={provider_symbol}` 로 시세 헤더 HTML을 받아옵니다.
//! 재시도는 하지 않으며, 실패한 요청은 해당 항목의 `Fetch` 에러로 반환됩니다.
//!
//! ## 사용 예시
//! ```rust,ignore
//! let source = MorningstarQuoteSource::new(QuoteSourceConfig::default())?;
//! let document = source.fetch(&ProviderSymbol::from("XLON:VOD")).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use pricefeed_core::{ProviderSymbol, QuoteError, QuoteResult, QuoteSource, RawDocument};

/// 시세 조회 설정.
#[derive(Debug, Clone)]
pub struct QuoteSourceConfig {
    /// 기본 URL (예: "http://quotes.morningstar.com")
    pub base_url: String,
    /// 시세 헤더 경로
    pub path: String,
    /// 요청 타임아웃 (`None`이면 무제한)
    pub timeout: Option<Duration>,
    /// User-Agent 헤더
    pub user_agent: String,
}

impl Default for QuoteSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://quotes.morningstar.com".to_string(),
            path: "/stockq/c-header".to_string(),
            timeout: Some(Duration::from_secs(30)),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Morningstar 시세 헤더 조회기.
pub struct MorningstarQuoteSource {
    client: Client,
    url: String,
}

impl MorningstarQuoteSource {
    /// 설정으로 생성. HTTP 클라이언트 생성 실패 시 에러를 반환합니다.
    pub fn new(config: QuoteSourceConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: format!("{}{}", config.base_url.trim_end_matches('/'), config.path),
        })
    }

    /// 시세 헤더 URL (쿼리 제외)
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuoteSource for MorningstarQuoteSource {
    fn name(&self) -> &str {
        "morningstar"
    }

    async fn fetch(&self, symbol: &ProviderSymbol) -> QuoteResult<RawDocument> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("t", symbol.as_str())])
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "요청 시간 초과".to_string()
                } else {
                    format!("HTTP 요청 실패: {}", e)
                };
                QuoteError::fetch(symbol.as_str(), reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::fetch(
                symbol.as_str(),
                format!("비정상 응답: HTTP {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuoteError::fetch(symbol.as_str(), format!("응답 본문 읽기 실패: {}", e)))?;

        if body.trim().is_empty() {
            return Err(QuoteError::fetch(symbol.as_str(), "빈 응답"));
        }

        tracing::debug!(provider_symbol = %symbol, bytes = body.len(), "시세 헤더 수신");
        Ok(RawDocument::new(body))
    }
}
