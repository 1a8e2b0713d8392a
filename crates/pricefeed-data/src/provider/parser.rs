//! Morningstar 시세 헤더 파서.
//!
//! 시세 헤더 HTML에서 요소 ID로 세 필드를 추출합니다:
//! - `#last-price-value`: 최종 가격
//! - `#curency`: 통화 코드 (제공자 측 철자 그대로)
//! - `#asOfDate`: 기준 시각 (`MM/dd/YYYY HH:mm:ss`, 미국 동부 시간)
//!
//! 영국 주식은 펜스(GBX) 단위로 제공되므로 100으로 나누어 파운드로 환산합니다.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use pricefeed_core::{
    MoneyExt, NormalizedQuote, Price, ProviderSymbol, QuoteError, QuoteParser, QuoteResult,
    RawDocument, SymbolResolver, MAX_MONEY_PRECISION,
};

/// 파서 설정.
///
/// 시간대는 문서에서 추론하지 않고 항상 설정값을 사용합니다.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// 가격 요소 ID
    pub price_field: String,
    /// 통화 코드 요소 ID
    pub currency_field: String,
    /// 기준 시각 요소 ID
    pub date_field: String,
    /// 기준 시각 형식 (chrono strftime)
    pub date_pattern: String,
    /// 제공자 시각의 원본 시간대
    pub source_zone: Tz,
    /// 저장 시 사용할 대상 시간대
    pub target_zone: Tz,
    /// 보조 통화 단위 코드 (펜스)
    pub minor_unit_currency: String,
    /// 보조 통화 단위 → 기본 단위 제수
    pub minor_unit_divisor: Decimal,
    /// 금액 최대 소수점 자릿수
    pub max_precision: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            price_field: "last-price-value".to_string(),
            currency_field: "curency".to_string(),
            date_field: "asOfDate".to_string(),
            date_pattern: "%m/%d/%Y %H:%M:%S".to_string(),
            source_zone: chrono_tz::America::New_York,
            target_zone: chrono_tz::Europe::Vienna,
            minor_unit_currency: "GBX".to_string(),
            minor_unit_divisor: Decimal::ONE_HUNDRED,
            max_precision: MAX_MONEY_PRECISION,
        }
    }
}

impl ParserConfig {
    /// IANA 시간대 이름으로 원본/대상 시간대를 설정합니다.
    pub fn with_zones(mut self, source: &str, target: &str) -> Result<Self, String> {
        self.source_zone = parse_zone(source)?;
        self.target_zone = parse_zone(target)?;
        Ok(self)
    }

    /// 금액 최대 소수점 자릿수를 설정합니다.
    pub fn with_max_precision(mut self, max_precision: u32) -> Self {
        self.max_precision = max_precision;
        self
    }
}

/// IANA 시간대 이름 파싱.
pub fn parse_zone(name: &str) -> Result<Tz, String> {
    Tz::from_str(name.trim()).map_err(|e| format!("잘못된 시간대 '{}': {}", name, e))
}

/// Morningstar 시세 헤더 파서.
pub struct MorningstarQuoteParser {
    config: ParserConfig,
    resolver: Arc<dyn SymbolResolver>,
}

impl MorningstarQuoteParser {
    pub fn new(config: ParserConfig, resolver: Arc<dyn SymbolResolver>) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// 요소 ID로 텍스트 추출. 요소가 없거나 비어 있으면 `None`.
    fn extract_text(&self, document: &Html, id: &str) -> Option<String> {
        let selector = Selector::parse(&format!("[id=\"{}\"]", id)).ok()?;

        document.select(&selector).next().and_then(|el| {
            let text = el.text().collect::<String>();
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        })
    }

    /// 통화 코드에 따른 가격 정규화.
    ///
    /// 보조 통화 단위(GBX)와 정확히 일치할 때만 제수로 나누고, 아니면 그대로 반환합니다.
    fn normalize_price(&self, price: Price, currency: &str) -> Option<Price> {
        if currency == self.config.minor_unit_currency {
            price.div_with_precision(self.config.minor_unit_divisor, self.config.max_precision)
        } else {
            Some(price)
        }
    }

    /// 원본 시간대의 벽시계 시각을 대상 시간대로 변환.
    ///
    /// 서머타임 종료로 중복되는 시각은 앞선 시각을 사용합니다.
    fn parse_timestamp(&self, text: &str) -> Result<DateTime<Tz>, String> {
        let naive = NaiveDateTime::parse_from_str(text.trim(), &self.config.date_pattern)
            .map_err(|e| format!("기준 시각 형식 오류 '{}': {}", text, e))?;

        let local = self
            .config
            .source_zone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                format!(
                    "{} 시간대에 존재하지 않는 시각: {}",
                    self.config.source_zone.name(),
                    text
                )
            })?;

        Ok(local.with_timezone(&self.config.target_zone))
    }
}

impl QuoteParser for MorningstarQuoteParser {
    fn parse(
        &self,
        document: &RawDocument,
        provider_symbol: &ProviderSymbol,
    ) -> QuoteResult<NormalizedQuote> {
        let symbol = provider_symbol.as_str();
        let html = Html::parse_document(document.as_str());

        // 가격
        let price_text = self
            .extract_text(&html, &self.config.price_field)
            .ok_or_else(|| {
                QuoteError::parse(symbol, format!("가격 필드 없음: #{}", self.config.price_field))
            })?;
        let price = parse_price(&price_text)
            .ok_or_else(|| QuoteError::parse(symbol, format!("잘못된 가격: '{}'", price_text)))?;

        // 통화
        let currency = self
            .extract_text(&html, &self.config.currency_field)
            .ok_or_else(|| {
                QuoteError::parse(
                    symbol,
                    format!("통화 필드 없음: #{}", self.config.currency_field),
                )
            })?;
        let price = self.normalize_price(price, &currency).ok_or_else(|| {
            QuoteError::parse(symbol, format!("가격 환산 실패: {} {}", price, currency))
        })?;

        // 기준 시각
        let date_text = self
            .extract_text(&html, &self.config.date_field)
            .ok_or_else(|| {
                QuoteError::parse(symbol, format!("기준 시각 필드 없음: #{}", self.config.date_field))
            })?;
        let timestamp = self
            .parse_timestamp(&date_text)
            .map_err(|reason| QuoteError::parse(symbol, reason))?;

        Ok(NormalizedQuote::new(
            self.resolver.to_canonical_symbol(provider_symbol),
            price,
            timestamp,
        ))
    }
}

/// 가격 문자열 파싱 (천 단위 쉼표 제거).
///
/// "1,234.50" -> 1234.50, 음수나 숫자가 아닌 값은 `None`
fn parse_price(text: &str) -> Option<Price> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let price = Decimal::from_str(&cleaned).ok()?;

    if price.is_sign_negative() && !price.is_zero() {
        return None;
    }

    Some(price)
}
