//! 거래소 접미사 기반 심볼 변환기.
//!
//! 애플리케이션은 Yahoo Finance 형식(`VOD.L`)을 중립 심볼로 사용하고,
//! Morningstar는 거래소 MIC가 앞에 붙은 형식(`XLON:VOD`)을 사용합니다.
//!
//! | 중립 심볼 | Morningstar |
//! |-----------|-------------|
//! | `AAPL`    | `AAPL`      |
//! | `VOD.L`   | `XLON:VOD`  |
//! | `SAP.DE`  | `XETR:SAP`  |

use std::collections::HashMap;

use pricefeed_core::{ProviderSymbol, QuoteError, QuoteResult, Symbol, SymbolResolver};

/// 기본 접미사 ↔ 거래소 코드 매핑
const DEFAULT_EXCHANGES: &[(&str, &str)] = &[
    ("L", "XLON"),
    ("DE", "XETR"),
    ("F", "XFRA"),
    ("PA", "XPAR"),
    ("AS", "XAMS"),
    ("BR", "XBRU"),
    ("MI", "XMIL"),
    ("MC", "XMAD"),
    ("VI", "XWBO"),
    ("SW", "XSWX"),
    ("TO", "XTSE"),
    ("AX", "XASX"),
    ("HK", "XHKG"),
];

/// 거래소 접미사 기반 심볼 변환기.
#[derive(Debug, Clone)]
pub struct ExchangeSuffixResolver {
    /// 접미사(대문자) → 거래소 코드
    suffix_to_exchange: HashMap<String, String>,
    /// 거래소 코드 → 접미사
    exchange_to_suffix: HashMap<String, String>,
}

impl Default for ExchangeSuffixResolver {
    fn default() -> Self {
        DEFAULT_EXCHANGES
            .iter()
            .fold(Self::empty(), |resolver, (suffix, exchange)| {
                resolver.with_mapping(suffix, exchange)
            })
    }
}

impl ExchangeSuffixResolver {
    /// 매핑이 없는 변환기 (접미사 없는 심볼만 변환 가능).
    pub fn empty() -> Self {
        Self {
            suffix_to_exchange: HashMap::new(),
            exchange_to_suffix: HashMap::new(),
        }
    }

    /// 접미사 ↔ 거래소 코드 매핑을 추가(또는 교체)합니다.
    pub fn with_mapping(mut self, suffix: &str, exchange: &str) -> Self {
        let suffix = suffix.trim_start_matches('.').to_uppercase();
        let exchange = exchange.to_uppercase();
        self.suffix_to_exchange
            .insert(suffix.clone(), exchange.clone());
        self.exchange_to_suffix.insert(exchange, suffix);
        self
    }
}

impl SymbolResolver for ExchangeSuffixResolver {
    fn to_provider_symbol(&self, symbol: &Symbol) -> QuoteResult<ProviderSymbol> {
        let value = symbol.as_str();
        if value.is_empty() {
            return Err(QuoteError::resolution(value, "빈 심볼"));
        }

        match value.rsplit_once('.') {
            None => Ok(ProviderSymbol::new(value.to_uppercase())),
            Some((ticker, suffix)) => {
                if ticker.is_empty() || suffix.is_empty() {
                    return Err(QuoteError::resolution(value, "잘못된 심볼 형식"));
                }
                let exchange = self
                    .suffix_to_exchange
                    .get(&suffix.to_uppercase())
                    .ok_or_else(|| {
                        QuoteError::resolution(value, format!("알 수 없는 거래소 접미사: .{}", suffix))
                    })?;
                Ok(ProviderSymbol::new(format!(
                    "{}:{}",
                    exchange,
                    ticker.to_uppercase()
                )))
            }
        }
    }

    fn to_canonical_symbol(&self, provider_symbol: &ProviderSymbol) -> Symbol {
        match provider_symbol.as_str().split_once(':') {
            None => Symbol::new(provider_symbol.as_str()),
            Some((exchange, ticker)) => match self.exchange_to_suffix.get(&exchange.to_uppercase()) {
                Some(suffix) => Symbol::new(format!("{}.{}", ticker, suffix)),
                None => {
                    tracing::debug!(
                        provider_symbol = %provider_symbol,
                        "매핑되지 않은 거래소, 티커만 사용"
                    );
                    Symbol::new(ticker)
                }
            },
        }
    }
}
