//! 배치 세션.
//!
//! 실행 하나의 수명주기를 관리합니다:
//! - 작업 태스크: 파이프라인을 백그라운드에서 실행
//! - 통지 태스크: 진행률/최종 결과를 호출자 컨텍스트에서 전달
//!
//! 최종 결과는 작업 태스크가 완전히 종료된 뒤 정확히 한 번 전달됩니다.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use pricefeed_core::Symbol;

use crate::{
    BatchOutcome, BatchReport, BatchRun, CompletionNotifier, ProgressSink, QuotePipeline, Result,
};

/// 작업 태스크 → 통지 태스크 이벤트
enum SessionEvent {
    Progress { completed: usize, total: usize },
    Finished(BatchReport),
}

/// 배치 세션.
pub struct BatchSession {
    pipeline: Arc<QuotePipeline>,
    progress: Arc<dyn ProgressSink>,
    notifier: Arc<dyn CompletionNotifier>,
    /// 통지 태스크를 실행할 런타임 (기본: 호출 시점의 런타임)
    notify_runtime: Option<Handle>,
}

impl BatchSession {
    pub fn new(
        pipeline: QuotePipeline,
        progress: Arc<dyn ProgressSink>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            progress,
            notifier,
            notify_runtime: None,
        }
    }

    /// 통지를 전달할 런타임을 지정합니다 (예: UI 상태를 갱신하는 런타임).
    pub fn with_notify_runtime(mut self, handle: Handle) -> Self {
        self.notify_runtime = Some(handle);
        self
    }

    /// 배치를 시작합니다.
    ///
    /// 빈 목록이면 아무 것도 하지 않고 `None`을 반환합니다
    /// (조회, 저장, 진행률, 완료 통지 모두 없음).
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn start(&self, symbols: Vec<Symbol>) -> Option<RunHandle> {
        if symbols.is_empty() {
            tracing::debug!("갱신할 심볼 없음, 배치 생략");
            return None;
        }

        let total = symbols.len();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        self.progress.started(total);

        let pipeline = Arc::clone(&self.pipeline);
        let worker_cancel = cancel.clone();
        let worker = tokio::spawn(async move {
            let progress_tx = tx.clone();
            let report = pipeline
                .run(&symbols, &worker_cancel, move |completed, total| {
                    let _ = progress_tx.send(SessionEvent::Progress { completed, total });
                })
                .await;
            let _ = tx.send(SessionEvent::Finished(report));
        });

        let dispatch = dispatch_events(
            rx,
            worker,
            cancel.clone(),
            Arc::clone(&self.progress),
            Arc::clone(&self.notifier),
            total,
        );
        let dispatcher = match &self.notify_runtime {
            Some(handle) => handle.spawn(dispatch),
            None => tokio::spawn(dispatch),
        };

        Some(RunHandle {
            cancel,
            total,
            dispatcher,
        })
    }
}

/// 통지 태스크: 진행률 전달 후 최종 결과를 한 번 통지합니다.
async fn dispatch_events(
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    worker: JoinHandle<()>,
    cancel: CancellationToken,
    progress: Arc<dyn ProgressSink>,
    notifier: Arc<dyn CompletionNotifier>,
    total: usize,
) -> BatchReport {
    let mut finished = None;
    // 작업 태스크가 결과 없이 죽었을 때 보고할 저장 완료 수
    let mut last_completed = 0;

    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Progress { completed, total } => {
                last_completed = completed;
                // 취소 후에는 진행률 통지 중단
                if !cancel.is_cancelled() {
                    progress.progress(completed, total);
                }
            }
            SessionEvent::Finished(report) => {
                finished = Some(report);
                break;
            }
        }
    }
    drop(rx);

    // 작업 태스크의 자원이 모두 해제된 뒤에 통지
    let worker_result = worker.await;

    let report = match (finished, worker_result) {
        (Some(report), _) => report,
        (None, Err(e)) => {
            tracing::error!(error = %e, "작업 태스크 비정상 종료");
            BatchReport::new(
                BatchOutcome::Failed(format!("작업 태스크 비정상 종료: {}", e)),
                BatchRun::from_progress(total, last_completed),
            )
        }
        (None, Ok(())) => BatchReport::new(
            BatchOutcome::Failed("작업 태스크가 결과 없이 종료".to_string()),
            BatchRun::from_progress(total, last_completed),
        ),
    };

    notifier.notify(&report);
    report
}

/// 실행 중인 배치의 핸들.
pub struct RunHandle {
    cancel: CancellationToken,
    total: usize,
    dispatcher: JoinHandle<BatchReport>,
}

impl RunHandle {
    /// 배치 취소를 요청합니다. 여러 번 호출해도 결과는 한 번만 통지됩니다.
    ///
    /// 처리 중인 종목은 끝까지 진행되고, 다음 종목부터 중단됩니다.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(total = self.total, "배치 취소 요청");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 핸들을 소비하지 않고 취소하기 위한 토큰 (예: Ctrl-C 핸들러)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 최종 결과가 통지될 때까지 대기합니다.
    pub async fn wait(self) -> Result<BatchReport> {
        Ok(self.dispatcher.await?)
    }
}
