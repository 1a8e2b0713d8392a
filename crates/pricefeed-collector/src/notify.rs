//! 진행률 / 완료 통지.
//!
//! 두 trait 모두 fire-and-forget이며 블로킹하면 안 됩니다.
//! 호출은 항상 세션의 통지 태스크에서 이루어집니다.

use tokio::sync::broadcast;

use crate::{BatchOutcome, BatchReport};

/// 진행률 수신자.
pub trait ProgressSink: Send + Sync {
    /// 배치 시작 (처리할 종목 수). 빈 목록이면 호출되지 않습니다.
    fn started(&self, _total: usize) {}

    /// 종목 하나가 저장될 때마다 호출됩니다.
    fn progress(&self, completed: usize, total: usize);
}

/// 최종 결과 수신자. 배치당 정확히 한 번 호출됩니다.
pub trait CompletionNotifier: Send + Sync {
    fn notify(&self, report: &BatchReport);
}

/// 로그로 진행률과 결과를 남기는 기본 구현.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl ProgressSink for LogNotifier {
    fn started(&self, total: usize) {
        tracing::info!(total = total, "가격 갱신 시작");
    }

    fn progress(&self, completed: usize, total: usize) {
        tracing::info!(progress = format!("{}/{}", completed, total), "가격 갱신 중");
    }
}

impl CompletionNotifier for LogNotifier {
    fn notify(&self, report: &BatchReport) {
        match &report.outcome {
            BatchOutcome::Completed => tracing::info!(
                completed = report.run.completed(),
                total = report.run.total(),
                "가격 다운로드 완료"
            ),
            BatchOutcome::Failed(reason) => {
                tracing::error!(reason = %reason, completed = report.run.completed(), "가격 다운로드 실패")
            }
            BatchOutcome::Cancelled => tracing::debug!("가격 다운로드 취소됨"),
        }
    }
}

/// 최종 결과를 broadcast 채널로 발행.
///
/// 가격 갱신 후 화면/캐시를 다시 읽어야 하는 구성요소가 구독합니다.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<BatchReport>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchReport> {
        self.sender.subscribe()
    }
}

impl CompletionNotifier for BroadcastNotifier {
    fn notify(&self, report: &BatchReport) {
        // 구독자가 없으면 버림
        if self.sender.send(report.clone()).is_err() {
            tracing::trace!("완료 이벤트 구독자 없음");
        }
    }
}
