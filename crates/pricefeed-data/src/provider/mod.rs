//! 데이터 Provider 모듈.
//!
//! ## Morningstar
//! - `MorningstarQuoteSource`: 시세 헤더 HTML 조회
//! - `MorningstarQuoteParser`: 가격/통화/기준시각 추출 및 정규화
//!
//! ## 심볼 변환
//! - `ExchangeSuffixResolver`: Yahoo 형식(`VOD.L`) ↔ Morningstar 형식(`XLON:VOD`)

pub mod morningstar;
pub mod parser;
pub mod symbol_converter;

pub use morningstar::{MorningstarQuoteSource, QuoteSourceConfig};
pub use parser::{MorningstarQuoteParser, ParserConfig};
pub use symbol_converter::ExchangeSuffixResolver;
