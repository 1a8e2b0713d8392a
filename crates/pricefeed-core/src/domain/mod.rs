//! 수집 파이프라인의 외부 협력자 추상화.
//!
//! - [`SymbolResolver`] - 중립 심볼 ↔ 데이터 소스 심볼 변환
//! - [`QuoteSource`] - 데이터 소스 심볼로 원본 시세 문서 조회
//! - [`QuoteParser`] - 원본 문서 → 정규화된 시세
//! - [`PriceStore`] - 현재가 갱신 + 가격 이력 추가 (원자적)

mod price_store;
mod quote_provider;

pub use price_store::PriceStore;
pub use quote_provider::{QuoteParser, QuoteSource, SymbolResolver};
