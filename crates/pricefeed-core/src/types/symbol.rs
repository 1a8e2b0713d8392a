//! 심볼 타입 정의.
//!
//! 이 모듈은 두 개의 심볼 네임스페이스를 구분합니다:
//! - `Symbol` - 애플리케이션 내부에서 사용하는 중립 심볼 (예: "VOD.L", "AAPL")
//! - `ProviderSymbol` - 시세 제공자가 요구하는 심볼 (예: "XLON:VOD")

use serde::{Deserialize, Serialize};
use std::fmt;

/// 애플리케이션 중립 심볼.
///
/// 생성 시 앞뒤 공백을 제거하며 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self(value.trim().to_string())
    }

    /// 문자열 참조를 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 빈 심볼인지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 쉼표로 구분된 목록을 파싱합니다. 빈 항목은 무시합니다.
    ///
    /// `"AAPL, VOD.L,,"` -> `[AAPL, VOD.L]`
    pub fn parse_list(list: &str) -> Vec<Symbol> {
        list.split(',')
            .map(Symbol::new)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// 시세 제공자 네임스페이스의 심볼.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderSymbol(String);

impl ProviderSymbol {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderSymbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
