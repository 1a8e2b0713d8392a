//! 배치 실행 카운터.

use pricefeed_core::QuoteError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 배치 한 번의 진행 상태.
///
/// 실행 하나가 단독으로 소유하며, `completed`는 단조 증가하고 `total`을 넘지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRun {
    /// 입력 심볼 수
    total: usize,
    /// 저장까지 성공한 종목 수
    completed: usize,
    /// 취소 여부
    cancelled: bool,
    /// 심볼 변환 실패로 건너뛴 수
    resolve_failures: usize,
    /// 조회 실패로 건너뛴 수
    fetch_failures: usize,
    /// 파싱 실패로 건너뛴 수
    parse_failures: usize,
    /// 소요 시간
    #[serde(skip)]
    elapsed: Duration,
}

impl BatchRun {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 진행률 통지로만 알려진 상태에서 복원 (작업 태스크가 결과 없이 종료된 경우)
    pub(crate) fn from_progress(total: usize, completed: usize) -> Self {
        Self {
            completed: completed.min(total),
            ..Self::new(total)
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn resolve_failures(&self) -> usize {
        self.resolve_failures
    }

    pub fn fetch_failures(&self) -> usize {
        self.fetch_failures
    }

    pub fn parse_failures(&self) -> usize {
        self.parse_failures
    }

    /// 건너뛴 종목 수 (변환/조회/파싱 실패 합계)
    pub fn skipped(&self) -> usize {
        self.resolve_failures + self.fetch_failures + self.parse_failures
    }

    /// 저장 성공 1건 기록. 갱신된 `completed`를 반환합니다.
    pub fn record_success(&mut self) -> usize {
        debug_assert!(self.completed < self.total, "completed가 total을 초과");
        self.completed = (self.completed + 1).min(self.total);
        self.completed
    }

    /// 항목 단위 실패 1건 기록.
    pub fn record_skip(&mut self, err: &QuoteError) {
        match err {
            QuoteError::Resolution { .. } => self.resolve_failures += 1,
            QuoteError::Fetch { .. } => self.fetch_failures += 1,
            QuoteError::Parse { .. } => self.parse_failures += 1,
            QuoteError::Persistence(_) => {}
        }
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            completed = self.completed,
            resolve_failures = self.resolve_failures,
            fetch_failures = self.fetch_failures,
            parse_failures = self.parse_failures,
            cancelled = self.cancelled,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "배치 종료"
        );
    }
}
