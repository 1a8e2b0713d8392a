//! 배치 종료 결과.

use serde::Serialize;

use crate::BatchRun;

/// 배치 실행의 최종 결과. 실행당 정확히 한 번 통지됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// 모든 종목 처리 시도 완료 (개별 종목 성공 여부와 무관)
    Completed,
    /// 저장 계층 등 치명적 오류로 중단
    Failed(String),
    /// 호출자 요청으로 중단
    Cancelled,
}

impl BatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// 최종 결과와 실행 카운터.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub run: BatchRun,
}

impl BatchReport {
    pub fn new(outcome: BatchOutcome, run: BatchRun) -> Self {
        Self { outcome, run }
    }

    /// JSON 요약 (CLI `--json` 출력용)
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "elapsed_secs".to_string(),
                serde_json::json!(self.run.elapsed().as_secs_f64()),
            );
        }
        value
    }
}
