//! 시세 일괄 갱신 파이프라인.
//!
//! 심볼 목록을 받아 한 번에 한 종목씩 처리합니다:
//! 심볼 변환 → 시세 조회 → 파싱 → 저장 → 진행률 보고
//!
//! - 항목 단위 실패(변환/조회/파싱)는 로그만 남기고 다음 종목으로 진행
//! - 저장 실패는 배치 전체를 중단 (`BatchOutcome::Failed`)
//! - 취소는 종목 경계에서만 확인 (`BatchOutcome::Cancelled`)

pub mod config;
pub mod error;
pub mod notify;
pub mod outcome;
pub mod pipeline;
pub mod session;
pub mod stats;

pub use config::{BatchConfig, CollectorConfig};
pub use error::{CollectorError, Result};
pub use notify::{BroadcastNotifier, CompletionNotifier, LogNotifier, ProgressSink};
pub use outcome::{BatchOutcome, BatchReport};
pub use pipeline::QuotePipeline;
pub use session::{BatchSession, RunHandle};
pub use stats::BatchRun;
