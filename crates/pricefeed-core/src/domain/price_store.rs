//! 시세 저장소 추상화.

use async_trait::async_trait;

use crate::{NormalizedQuote, QuoteResult};

/// 정규화된 시세 저장소.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// 현재가 갱신과 가격 이력 추가를 하나의 트랜잭션으로 커밋합니다.
    ///
    /// 둘 중 하나라도 실패하면 전체가 롤백되고 `QuoteError::Persistence`를 반환합니다.
    async fn save_quote(&self, quote: &NormalizedQuote) -> QuoteResult<()>;
}
