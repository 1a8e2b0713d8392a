//! # Pricefeed Core
//!
//! 시세 수집 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 중립 심볼 / 데이터 소스 심볼
//! - 정규화된 시세 레코드
//! - 금액 정밀도 유틸리티
//! - 외부 협력자 trait (심볼 변환, 시세 조회, 파싱, 저장)
//! - 에러 분류
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
