//! 시세 제공자 추상화.
//!
//! 데이터 소스별로 이 trait들을 구현하면 파이프라인은 소스 중립적으로 동작합니다.
//!
//! # 구현 예시
//!
//! ```ignore
//! pub struct MorningstarQuoteSource {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl QuoteSource for MorningstarQuoteSource {
//!     fn name(&self) -> &str { "morningstar" }
//!
//!     async fn fetch(&self, symbol: &ProviderSymbol) -> QuoteResult<RawDocument> {
//!         // HTTP 요청
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::{NormalizedQuote, ProviderSymbol, QuoteResult, RawDocument, Symbol};

/// 심볼 변환기.
///
/// 변환은 손실이 있을 수 있지만, 왕복 변환 결과는 같은 종목을 가리켜야 합니다.
pub trait SymbolResolver: Send + Sync {
    /// 중립 심볼을 데이터 소스 심볼로 변환합니다.
    fn to_provider_symbol(&self, symbol: &Symbol) -> QuoteResult<ProviderSymbol>;

    /// 데이터 소스 심볼을 중립 심볼로 되돌립니다.
    fn to_canonical_symbol(&self, provider_symbol: &ProviderSymbol) -> Symbol;
}

/// 원본 시세 문서 조회.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 데이터 소스 이름.
    fn name(&self) -> &str;

    /// 데이터 소스 심볼 하나의 시세 문서를 조회합니다.
    ///
    /// 네트워크 실패나 비정상 응답은 `QuoteError::Fetch`로 반환합니다.
    async fn fetch(&self, symbol: &ProviderSymbol) -> QuoteResult<RawDocument>;
}

/// 시세 문서 파서.
///
/// 부수 효과가 없는 순수 변환이어야 합니다.
pub trait QuoteParser: Send + Sync {
    fn parse(
        &self,
        document: &RawDocument,
        provider_symbol: &ProviderSymbol,
    ) -> QuoteResult<NormalizedQuote>;
}
