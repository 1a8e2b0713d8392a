//! 시세 문서 및 정규화된 시세 레코드.

use chrono::DateTime;
use chrono_tz::Tz;

use super::{Price, Symbol};

/// 시세 제공자가 반환한 원본 응답.
///
/// 파싱 단계에서 한 번 소비되고 버려집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument(String);

impl RawDocument {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 정규화된 시세.
///
/// 가격은 항상 0 이상이며, 시각은 애플리케이션이 정한 대상 시간대로 표현됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuote {
    /// 중립 심볼
    pub symbol: Symbol,
    /// 정규화된 가격 (GBX → GBP 변환 적용)
    pub price: Price,
    /// 대상 시간대 기준 시세 시각
    pub timestamp: DateTime<Tz>,
}

impl NormalizedQuote {
    pub fn new(symbol: Symbol, price: Price, timestamp: DateTime<Tz>) -> Self {
        Self {
            symbol,
            price,
            timestamp,
        }
    }
}
