//! 시세 데이터 소스 및 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - Morningstar 시세 헤더 조회 (HTTP)
//! - Morningstar HTML 시세 파서 (GBX 환산, 시간대 변환)
//! - 거래소 접미사 기반 심볼 변환기
//! - PostgreSQL 가격 저장소 (현재가 + 가격 이력)

pub mod provider;
pub mod storage;

pub use provider::{
    ExchangeSuffixResolver, MorningstarQuoteParser, MorningstarQuoteSource, ParserConfig,
    QuoteSourceConfig,
};
pub use storage::PgPriceStore;
