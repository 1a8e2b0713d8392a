//! 시세 수집 파이프라인의 에러 타입.
//!
//! 항목 단위 에러(심볼 변환, 조회, 파싱)는 해당 항목만 건너뛰고,
//! 저장 에러는 배치 전체를 중단시킵니다.

use thiserror::Error;

/// 시세 수집 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// 심볼을 데이터 소스 심볼로 변환할 수 없음
    #[error("심볼 변환 에러: {symbol}: {reason}")]
    Resolution { symbol: String, reason: String },

    /// 네트워크/전송 실패 또는 비정상 응답
    #[error("시세 조회 에러: {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    /// 필수 필드 누락 또는 파싱 실패
    #[error("시세 파싱 에러: {symbol}: {reason}")]
    Parse { symbol: String, reason: String },

    /// 트랜잭션 커밋 실패
    #[error("저장 에러: {0}")]
    Persistence(String),
}

/// 시세 수집 작업을 위한 Result 타입.
pub type QuoteResult<T> = Result<T, QuoteError>;

impl QuoteError {
    pub fn resolution(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence(reason.into())
    }

    /// 배치 전체를 중단해야 하는 에러인지 확인합니다.
    ///
    /// 저장 계층 에러만 치명적이며, 나머지는 해당 항목만 건너뜁니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, QuoteError::Persistence(_))
    }

    /// 에러와 관련된 심볼 (있는 경우).
    pub fn symbol(&self) -> Option<&str> {
        match self {
            QuoteError::Resolution { symbol, .. }
            | QuoteError::Fetch { symbol, .. }
            | QuoteError::Parse { symbol, .. } => Some(symbol),
            QuoteError::Persistence(_) => None,
        }
    }

    /// 로그/통계용 에러 분류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::Resolution { .. } => "resolution",
            QuoteError::Fetch { .. } => "fetch",
            QuoteError::Parse { .. } => "parse",
            QuoteError::Persistence(_) => "persistence",
        }
    }
}
