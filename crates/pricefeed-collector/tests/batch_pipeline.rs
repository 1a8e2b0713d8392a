//! 메모리 협력자를 사용한 배치 세션/파이프라인 통합 테스트.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use pricefeed_collector::{
    BatchOutcome, BatchReport, BatchSession, BroadcastNotifier, CompletionNotifier, ProgressSink,
    QuotePipeline,
};
use pricefeed_core::{
    NormalizedQuote, PriceStore, ProviderSymbol, QuoteError, QuoteResult, QuoteSource, RawDocument,
    Symbol, SymbolResolver,
};
use pricefeed_data::{ExchangeSuffixResolver, MorningstarQuoteParser, ParserConfig};

// ==================== 테스트 협력자 ====================

fn quote_html(price: &str) -> String {
    format!(
        r#"<html><body>
        <span id="last-price-value">{}</span>
        <span id="curency">USD</span>
        <span id="asOfDate">03/15/2024 16:00:00</span>
        </body></html>"#,
        price
    )
}

/// 제공자 심볼별로 응답을 정해둔 시세 소스.
#[derive(Default)]
struct ScriptedSource {
    failing: HashSet<String>,
    broken: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn failing(symbols: &[&str]) -> Self {
        Self {
            failing: symbols.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, symbol: &ProviderSymbol) -> QuoteResult<RawDocument> {
        self.calls.lock().unwrap().push(symbol.to_string());

        if self.failing.contains(symbol.as_str()) {
            return Err(QuoteError::fetch(symbol.as_str(), "connection reset"));
        }
        if self.broken.contains(symbol.as_str()) {
            return Ok(RawDocument::new("<html><body>maintenance</body></html>"));
        }
        Ok(RawDocument::new(quote_html("10.50")))
    }
}

/// 첫 조회에서 해제 신호를 기다리는 시세 소스.
struct GatedSource {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl QuoteSource for GatedSource {
    fn name(&self) -> &str {
        "gated"
    }

    async fn fetch(&self, _symbol: &ProviderSymbol) -> QuoteResult<RawDocument> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(RawDocument::new(quote_html("1.00")))
    }
}

/// 두 번째 조회에서 패닉하는 시세 소스 (작업 태스크 비정상 종료 재현).
#[derive(Default)]
struct PanickingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl QuoteSource for PanickingSource {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn fetch(&self, _symbol: &ProviderSymbol) -> QuoteResult<RawDocument> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
            panic!("quote source crashed");
        }
        Ok(RawDocument::new(quote_html("3.00")))
    }
}

/// 저장된 시세를 기록하고, 지정한 순번(1부터)에서 실패하는 저장소.
#[derive(Default)]
struct RecordingStore {
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    saved: Mutex<Vec<NormalizedQuote>>,
}

impl RecordingStore {
    fn saved_symbols(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.symbol.to_string())
            .collect()
    }
}

#[async_trait]
impl PriceStore for RecordingStore {
    async fn save_quote(&self, quote: &NormalizedQuote) -> QuoteResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(QuoteError::persistence("connection refused"));
        }
        self.saved.lock().unwrap().push(quote.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    started: Mutex<Vec<usize>>,
    progress: Mutex<Vec<(usize, usize)>>,
}

impl ProgressSink for RecordingSink {
    fn started(&self, total: usize) {
        self.started.lock().unwrap().push(total);
    }

    fn progress(&self, completed: usize, total: usize) {
        self.progress.lock().unwrap().push((completed, total));
    }
}

#[derive(Default)]
struct RecordingNotifier {
    reports: Mutex<Vec<BatchReport>>,
}

impl CompletionNotifier for RecordingNotifier {
    fn notify(&self, report: &BatchReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

fn pipeline(source: Arc<dyn QuoteSource>, store: Arc<dyn PriceStore>) -> QuotePipeline {
    let resolver: Arc<dyn SymbolResolver> = Arc::new(ExchangeSuffixResolver::default());
    let parser = Arc::new(MorningstarQuoteParser::new(
        ParserConfig::default(),
        resolver.clone(),
    ));
    QuotePipeline::new(resolver, source, parser, store)
}

fn symbols(list: &str) -> Vec<Symbol> {
    Symbol::parse_list(list)
}

// ==================== 세션 ====================

#[tokio::test]
async fn test_fetch_failure_is_skipped() {
    let source = Arc::new(ScriptedSource::failing(&["BBB"]));
    let store = Arc::new(RecordingStore::default());
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(source.clone(), store.clone()),
        sink.clone(),
        notifier.clone(),
    );
    let report = session
        .start(symbols("AAA,BBB,CCC"))
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.run.completed(), 2);
    assert_eq!(report.run.fetch_failures(), 1);
    assert_eq!(source.calls(), vec!["AAA", "BBB", "CCC"]);
    assert_eq!(store.saved_symbols(), vec!["AAA", "CCC"]);

    assert_eq!(*sink.started.lock().unwrap(), vec![3]);
    assert_eq!(*sink.progress.lock().unwrap(), vec![(1, 3), (2, 3)]);

    let reports = notifier.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, BatchOutcome::Completed);
}

#[tokio::test]
async fn test_resolution_and_parse_failures_are_skipped() {
    let source = Arc::new(ScriptedSource {
        broken: ["CCC".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let store = Arc::new(RecordingStore::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(source.clone(), store.clone()),
        Arc::new(RecordingSink::default()),
        notifier.clone(),
    );
    let report = session
        .start(symbols("VOD.L,FOO.ZZ,CCC"))
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.run.completed(), 1);
    assert_eq!(report.run.resolve_failures(), 1);
    assert_eq!(report.run.parse_failures(), 1);
    // 변환에 실패한 종목은 조회하지 않음
    assert_eq!(source.calls(), vec!["XLON:VOD", "CCC"]);

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].symbol, Symbol::from("VOD.L"));
    assert_eq!(saved[0].price, dec!(10.50));
}

#[tokio::test]
async fn test_persistence_failure_aborts_batch() {
    let source = Arc::new(ScriptedSource::default());
    let store = Arc::new(RecordingStore {
        fail_on_call: Some(2),
        ..Default::default()
    });
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(source.clone(), store.clone()),
        sink.clone(),
        notifier.clone(),
    );
    let report = session
        .start(symbols("AAA,BBB,CCC"))
        .unwrap()
        .wait()
        .await
        .unwrap();

    match &report.outcome {
        BatchOutcome::Failed(reason) => assert!(reason.contains("connection refused")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(report.run.completed(), 1);
    assert_eq!(source.calls(), vec!["AAA", "BBB"]);
    assert_eq!(*sink.progress.lock().unwrap(), vec![(1, 3)]);
    assert_eq!(notifier.reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_batch_does_nothing() {
    let source = Arc::new(ScriptedSource::default());
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(source.clone(), Arc::new(RecordingStore::default())),
        sink.clone(),
        notifier.clone(),
    );

    assert!(session.start(Vec::new()).is_none());
    assert!(source.calls().is_empty());
    assert!(sink.started.lock().unwrap().is_empty());
    assert!(sink.progress.lock().unwrap().is_empty());
    assert!(notifier.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_all_fetches_fail_still_completes() {
    let source = Arc::new(ScriptedSource::failing(&["AAA", "BBB"]));
    let store = Arc::new(RecordingStore::default());
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(source, store.clone()),
        sink.clone(),
        notifier.clone(),
    );
    let report = session
        .start(symbols("AAA,BBB"))
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.run.completed(), 0);
    assert_eq!(report.run.skipped(), 2);
    assert!(store.saved_symbols().is_empty());
    assert!(sink.progress.lock().unwrap().is_empty());
    assert_eq!(notifier.reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_stops_at_item_boundary() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let source = Arc::new(GatedSource {
        entered: entered.clone(),
        release: release.clone(),
        calls: AtomicUsize::new(0),
    });
    let store = Arc::new(RecordingStore::default());
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(source.clone(), store.clone()),
        sink.clone(),
        notifier.clone(),
    );
    let handle = session.start(symbols("AAA,BBB,CCC")).unwrap();

    // 첫 종목 조회 중에 취소 (두 번 호출해도 통지는 한 번)
    entered.notified().await;
    handle.cancel();
    handle.cancel();
    assert!(handle.is_cancelled());
    release.notify_one();

    let report = handle.wait().await.unwrap();

    assert_eq!(report.outcome, BatchOutcome::Cancelled);
    assert!(report.run.is_cancelled());
    // 처리 중이던 종목은 끝까지 저장됨
    assert_eq!(store.saved_symbols(), vec!["AAA"]);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    // 취소 이후 진행률은 전달되지 않음
    assert!(sink.progress.lock().unwrap().is_empty());

    let reports = notifier.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, BatchOutcome::Cancelled);
}

#[tokio::test]
async fn test_worker_panic_reports_failed_once() {
    let store = Arc::new(RecordingStore::default());
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let session = BatchSession::new(
        pipeline(Arc::new(PanickingSource::default()), store.clone()),
        sink.clone(),
        notifier.clone(),
    );
    let report = session
        .start(symbols("AAA,BBB,CCC"))
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert!(matches!(report.outcome, BatchOutcome::Failed(_)));
    // 이미 진행률로 알린 저장 완료 수는 유지
    assert_eq!(report.run.completed(), 1);
    assert_eq!(report.run.total(), 3);
    assert_eq!(store.saved_symbols(), vec!["AAA"]);
    assert_eq!(*sink.progress.lock().unwrap(), vec![(1, 3)]);

    let reports = notifier.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, report.outcome);
}

#[tokio::test]
async fn test_broadcast_notifier_receives_report() {
    let notifier = Arc::new(BroadcastNotifier::new(4));
    let mut rx = notifier.subscribe();

    let session = BatchSession::new(
        pipeline(
            Arc::new(ScriptedSource::default()),
            Arc::new(RecordingStore::default()),
        ),
        Arc::new(RecordingSink::default()),
        notifier,
    )
    .with_notify_runtime(tokio::runtime::Handle::current());

    let handle = session.start(symbols("VOD.L")).unwrap();
    assert_eq!(handle.total(), 1);
    handle.wait().await.unwrap();

    let report = rx.recv().await.unwrap();
    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.run.completed(), 1);
}

// ==================== 파이프라인 ====================

#[tokio::test]
async fn test_pipeline_cancelled_before_start() {
    let source = Arc::new(ScriptedSource::default());
    let pipeline = pipeline(source.clone(), Arc::new(RecordingStore::default()));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = pipeline
        .run(&symbols("AAA,BBB"), &cancel, |_, _| {})
        .await;

    assert_eq!(report.outcome, BatchOutcome::Cancelled);
    assert_eq!(report.run.completed(), 0);
    assert!(source.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_request_delay_between_items() {
    let source = Arc::new(ScriptedSource::default());
    let pipeline = pipeline(source.clone(), Arc::new(RecordingStore::default()))
        .with_request_delay(Duration::from_secs(30));

    let started = tokio::time::Instant::now();
    let report = pipeline
        .run(&symbols("AAA,BBB,CCC"), &CancellationToken::new(), |_, _| {})
        .await;

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.run.completed(), 3);
    // 첫 종목 앞에는 대기 없음: 종목 사이 두 번만 대기
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(90), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_request_delay() {
    let source = Arc::new(ScriptedSource::default());
    let pipeline = Arc::new(
        pipeline(source.clone(), Arc::new(RecordingStore::default()))
            .with_request_delay(Duration::from_secs(60)),
    );
    let cancel = CancellationToken::new();

    let started = tokio::time::Instant::now();
    let task = {
        let pipeline = Arc::clone(&pipeline);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            pipeline
                .run(&symbols("AAA,BBB,CCC"), &cancel, |_, _| {})
                .await
        })
    };

    // 첫 종목 저장 후 대기 중에 취소
    tokio::time::sleep(Duration::from_secs(5)).await;
    cancel.cancel();
    let report = task.await.unwrap();

    assert_eq!(report.outcome, BatchOutcome::Cancelled);
    assert_eq!(report.run.completed(), 1);
    assert_eq!(source.calls(), vec!["AAA"]);
    // 대기 시간을 다 채우지 않고 중단
    assert!(started.elapsed() < Duration::from_secs(60));
}

proptest! {
    #[test]
    fn prop_progress_is_monotonic_and_bounded(mask in proptest::collection::vec(any::<bool>(), 1..12)) {
        let names: Vec<String> = (0..mask.len()).map(|i| format!("SYM{}", i)).collect();
        let failing: Vec<&str> = names
            .iter()
            .zip(&mask)
            .filter(|(_, fail)| **fail)
            .map(|(name, _)| name.as_str())
            .collect();
        let expected = mask.iter().filter(|fail| !**fail).count();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let source = Arc::new(ScriptedSource::failing(&failing));
        let pipeline = pipeline(source, Arc::new(RecordingStore::default()));
        let list: Vec<Symbol> = names.iter().map(|n| Symbol::from(n.as_str())).collect();

        let mut seen = Vec::new();
        let report = runtime.block_on(pipeline.run(
            &list,
            &CancellationToken::new(),
            |completed, total| seen.push((completed, total)),
        ));

        prop_assert_eq!(&report.outcome, &BatchOutcome::Completed);
        prop_assert_eq!(report.run.completed(), expected);
        prop_assert!(report.run.completed() <= report.run.total());
        prop_assert_eq!(seen.len(), expected);
        for (i, (completed, total)) in seen.iter().enumerate() {
            prop_assert_eq!(*completed, i + 1);
            prop_assert_eq!(*total, list.len());
        }
    }
}
