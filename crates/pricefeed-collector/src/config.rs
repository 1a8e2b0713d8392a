//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use pricefeed_data::provider::parser::parse_zone;
use pricefeed_data::{ParserConfig, QuoteSourceConfig};

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (DB를 사용하는 명령에서만 필요)
    pub database_url: Option<String>,
    /// 최대 DB 연결 수
    pub max_connections: u32,
    /// 시세 조회 설정
    pub quote_source: QuoteSourceConfig,
    /// 파서 설정 (시간대, 정밀도)
    pub parser: ParserConfig,
    /// 배치 실행 설정
    pub batch: BatchConfig,
}

/// 배치 실행 설정
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// 종목 간 딜레이 (밀리초, 0이면 없음)
    pub request_delay_ms: u64,
}

impl BatchConfig {
    /// 종목 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일 포함)
    ///
    /// # 환경변수
    /// * `DATABASE_URL` - PostgreSQL 연결 문자열
    /// * `DATABASE_MAX_CONNECTIONS` - 최대 연결 수 (기본: 5)
    /// * `QUOTE_BASE_URL` / `QUOTE_PATH` - 시세 헤더 URL
    /// * `QUOTE_TIMEOUT_SECS` - 요청 타임아웃 (초, 기본: 30, 0이면 무제한)
    /// * `QUOTE_USER_AGENT` - User-Agent 헤더
    /// * `QUOTE_SOURCE_TZ` / `QUOTE_TARGET_TZ` - 원본/대상 시간대
    /// * `QUOTE_MAX_PRECISION` - 금액 최대 소수점 자릿수 (기본: 15)
    /// * `QUOTE_REQUEST_DELAY_MS` - 종목 간 딜레이 (밀리초, 기본: 0)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 생성.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source_defaults = QuoteSourceConfig::default();
        let parser_defaults = ParserConfig::default();

        let timeout_secs: u64 = parse_or(&lookup, "QUOTE_TIMEOUT_SECS", 30);
        let quote_source = QuoteSourceConfig {
            base_url: lookup("QUOTE_BASE_URL").unwrap_or(source_defaults.base_url),
            path: lookup("QUOTE_PATH").unwrap_or(source_defaults.path),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            user_agent: lookup("QUOTE_USER_AGENT").unwrap_or(source_defaults.user_agent),
        };

        let source_zone = match lookup("QUOTE_SOURCE_TZ") {
            Some(name) => parse_zone(&name).map_err(CollectorError::Config)?,
            None => parser_defaults.source_zone,
        };
        let target_zone = match lookup("QUOTE_TARGET_TZ") {
            Some(name) => parse_zone(&name).map_err(CollectorError::Config)?,
            None => parser_defaults.target_zone,
        };
        let max_precision = parse_or(&lookup, "QUOTE_MAX_PRECISION", parser_defaults.max_precision);
        if max_precision > 28 {
            return Err(CollectorError::Config(format!(
                "QUOTE_MAX_PRECISION은 28 이하여야 합니다: {}",
                max_precision
            )));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL"),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5),
            quote_source,
            parser: ParserConfig {
                source_zone,
                target_zone,
                max_precision,
                ..parser_defaults
            },
            batch: BatchConfig {
                request_delay_ms: parse_or(&lookup, "QUOTE_REQUEST_DELAY_MS", 0),
            },
        })
    }

    /// 데이터베이스 URL (없으면 설정 에러)
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }
}

/// 값을 파싱 (없거나 실패 시 기본값 사용)
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
