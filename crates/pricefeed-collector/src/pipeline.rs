//! 순차 시세 수집 파이프라인.
//!
//! 종목마다 아래 단계를 순서대로 실행하며, 두 종목의 작업이 겹치지 않습니다:
//! 1. 심볼 변환 (실패 시 건너뜀)
//! 2. 시세 조회 (실패 시 건너뜀)
//! 3. 파싱 (실패 시 건너뜀)
//! 4. 저장 (실패 시 배치 중단)
//! 5. 진행률 보고

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use pricefeed_core::{
    quote_span, PriceStore, QuoteError, QuoteParser, QuoteResult, QuoteSource, Symbol,
    SymbolResolver,
};

use crate::{BatchOutcome, BatchReport, BatchRun};

/// 시세 수집 파이프라인.
pub struct QuotePipeline {
    resolver: Arc<dyn SymbolResolver>,
    source: Arc<dyn QuoteSource>,
    parser: Arc<dyn QuoteParser>,
    store: Arc<dyn PriceStore>,
    /// 종목 간 딜레이 (Rate limiting)
    request_delay: Duration,
}

impl QuotePipeline {
    pub fn new(
        resolver: Arc<dyn SymbolResolver>,
        source: Arc<dyn QuoteSource>,
        parser: Arc<dyn QuoteParser>,
        store: Arc<dyn PriceStore>,
    ) -> Self {
        Self {
            resolver,
            source,
            parser,
            store,
            request_delay: Duration::ZERO,
        }
    }

    /// 종목 간 딜레이 설정. 딜레이 중 취소되면 즉시 중단합니다.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// 심볼 목록 전체를 처리합니다.
    ///
    /// # Arguments
    /// * `symbols` - 중립 심볼 목록 (입력 순서대로 처리)
    /// * `cancel` - 취소 토큰 (종목 경계에서 확인)
    /// * `on_progress` - 진행 상황 콜백 (저장 완료 수, 전체 수)
    pub async fn run<F>(
        &self,
        symbols: &[Symbol],
        cancel: &CancellationToken,
        on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(usize, usize) + Send,
    {
        let start = Instant::now();
        let mut run = BatchRun::new(symbols.len());

        tracing::info!(
            source = self.source.name(),
            total = symbols.len(),
            "시세 수집 시작"
        );

        let outcome = self.drive(symbols, &mut run, cancel, on_progress).await;
        if outcome == BatchOutcome::Cancelled {
            run.mark_cancelled();
        }
        run.set_elapsed(start.elapsed());

        BatchReport::new(outcome, run)
    }

    async fn drive<F>(
        &self,
        symbols: &[Symbol],
        run: &mut BatchRun,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> BatchOutcome
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = symbols.len();

        for (idx, symbol) in symbols.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(remaining = total - idx, "취소 요청, 남은 종목 중단");
                return BatchOutcome::Cancelled;
            }

            if idx > 0 && !self.request_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.request_delay) => {}
                    _ = cancel.cancelled() => {
                        tracing::info!(remaining = total - idx, "취소 요청, 남은 종목 중단");
                        return BatchOutcome::Cancelled;
                    }
                }
            }

            tracing::debug!(
                symbol = %symbol,
                progress = format!("{}/{}", idx + 1, total),
                "처리 시작"
            );

            let result = self
                .process_item(symbol)
                .instrument(quote_span!("quote_item", symbol))
                .await;

            match result {
                Ok(()) => {
                    let completed = run.record_success();
                    on_progress(completed, total);
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(symbol = %symbol, error = %e, "저장 실패, 배치 중단");
                    return BatchOutcome::Failed(e.to_string());
                }
                Err(e) => {
                    run.record_skip(&e);
                    match &e {
                        QuoteError::Fetch { .. } => {
                            tracing::error!(symbol = %symbol, error = %e, "시세 조회 실패, 건너뜀")
                        }
                        _ => tracing::warn!(
                            symbol = %symbol,
                            kind = e.kind(),
                            error = %e,
                            "종목 건너뜀"
                        ),
                    }
                }
            }
        }

        // 마지막 종목 처리 중 들어온 취소도 취소로 보고
        if cancel.is_cancelled() {
            return BatchOutcome::Cancelled;
        }

        BatchOutcome::Completed
    }

    /// 종목 하나 처리: 변환 → 조회 → 파싱 → 저장
    async fn process_item(&self, symbol: &Symbol) -> QuoteResult<()> {
        let provider_symbol = self.resolver.to_provider_symbol(symbol)?;
        let document = self.source.fetch(&provider_symbol).await?;
        let quote = self.parser.parse(&document, &provider_symbol)?;
        drop(document);

        self.store.save_quote(&quote).await?;

        tracing::debug!(
            provider_symbol = %provider_symbol,
            price = %quote.price,
            timestamp = %quote.timestamp,
            "저장 완료"
        );
        Ok(())
    }
}
