//! tracing 기반 로깅 초기화.
//!
//! 배치 실행은 대부분 cron이나 CLI에서 한 번 돌고 끝나므로
//! 출력 형식만 골라 쓰면 되도록 구성합니다:
//! - `pretty`: 터미널에서 직접 실행할 때
//! - `json`: 로그 수집기로 보낼 때
//! - `compact`: 종목별 처리 로그를 한 줄씩 남길 때

use std::fmt as stdfmt;

use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// 로그 필터를 적용할 워크스페이스 크레이트.
const WORKSPACE_TARGETS: [&str; 3] = ["pricefeed_core", "pricefeed_data", "pricefeed_collector"];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        }
    }

    /// `LOG_FORMAT` 환경변수 값 (없거나 잘못되면 `None`)
    pub fn from_env() -> Option<Self> {
        std::env::var("LOG_FORMAT").ok()?.parse().ok()
    }
}

impl stdfmt::Display for LogFormat {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Pretty, Self::Json, Self::Compact]
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("알 수 없는 로그 형식: {} (pretty, json, compact)", s))
    }
}

/// 로깅 초기화 에러.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("잘못된 로그 필터 '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("로깅이 이미 초기화됨: {0}")]
    AlreadyInitialized(String),
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (`RUST_LOG`가 있으면 무시됨)
    pub filter: String,
    pub format: LogFormat,
    /// 종목 span의 진입/종료를 이벤트로 기록
    pub item_spans: bool,
    /// 파일명:줄번호 출력
    pub source_location: bool,
}

impl LogConfig {
    /// 워크스페이스 크레이트에만 `level`을 적용하고 나머지는 `warn`으로 둡니다.
    ///
    /// `"debug"` -> `"warn,pricefeed_core=debug,pricefeed_data=debug,pricefeed_collector=debug"`
    pub fn for_workspace(level: &str) -> Self {
        let directives: Vec<String> = WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level.trim()))
            .collect();

        Self {
            filter: format!("warn,{}", directives.join(",")),
            format: LogFormat::default(),
            item_spans: false,
            source_location: false,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 종목 span 진입/종료 이벤트 기록 여부.
    pub fn with_item_spans(mut self, enabled: bool) -> Self {
        self.item_spans = enabled;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.filter).map_err(|e| LoggingError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// 전역 subscriber를 설치합니다. 프로세스당 한 번만 성공합니다.
///
/// ```no_run
/// use pricefeed_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::for_workspace("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = config.env_filter()?;

    let span_events = if config.item_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_span_events(span_events)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(format = %config.format, filter = %config.filter, "로깅 초기화 완료");
    Ok(())
}

/// 종목 하나의 처리 구간 span.
///
/// ```ignore
/// process(symbol).instrument(quote_span!("quote_item", symbol)).await;
/// ```
#[macro_export]
macro_rules! quote_span {
    ($name:expr, $symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol)
    };
    ($name:expr, $symbol:expr, $provider_symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol, provider_symbol = %$provider_symbol)
    };
}
