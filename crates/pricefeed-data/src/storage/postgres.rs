//! PostgreSQL 가격 저장소.
//!
//! 시세 하나당 트랜잭션 하나로 두 작업을 묶습니다:
//! 1. `stock.current_price` 갱신
//! 2. `stock_history` 이력 추가 (같은 심볼/시각이면 가격만 갱신)
//!
//! 심볼 변환기를 거치면 대소문자가 바뀔 수 있으므로(`vod.l` → `VOD.L`)
//! `stock` 행은 대소문자 구분 없이 찾고, 이력은 `stock`에 등록된 심볼로 남깁니다.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use pricefeed_core::{NormalizedQuote, PriceStore, QuoteError, QuoteResult, Symbol};

/// PostgreSQL 가격 저장소.
#[derive(Clone)]
pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 테이블이 없으면 생성합니다.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock (
                id            BIGSERIAL PRIMARY KEY,
                symbol        TEXT NOT NULL UNIQUE,
                current_price NUMERIC(30, 15),
                updated_at    TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // 대소문자만 다른 심볼이 두 행으로 등록되지 않도록
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS stock_symbol_upper_key ON stock (UPPER(symbol))")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_history (
                id          BIGSERIAL PRIMARY KEY,
                symbol      TEXT NOT NULL,
                price       NUMERIC(30, 15) NOT NULL,
                quoted_at   TIMESTAMPTZ NOT NULL,
                time_zone   TEXT NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (symbol, quoted_at)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 가격을 갱신할 심볼 목록 (등록 순서).
    pub async fn list_symbols(&self) -> Result<Vec<Symbol>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT symbol FROM stock ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(s,)| Symbol::new(s)).collect())
    }

    /// 현재가 갱신. 갱신된 `stock` 행의 심볼을 반환합니다 (없으면 `None`).
    async fn update_current_price(
        tx: &mut Transaction<'_, Postgres>,
        symbol: &Symbol,
        price: Decimal,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE stock
            SET current_price = $2, updated_at = NOW()
            WHERE UPPER(symbol) = UPPER($1)
            RETURNING symbol
            "#,
        )
        .bind(symbol.as_str())
        .bind(price)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|(stored,)| stored))
    }

    /// 가격 이력 추가.
    async fn append_history(
        tx: &mut Transaction<'_, Postgres>,
        symbol: &str,
        quote: &NormalizedQuote,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO stock_history (symbol, price, quoted_at, time_zone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (symbol, quoted_at)
            DO UPDATE SET price = EXCLUDED.price, recorded_at = NOW()
            "#,
        )
        .bind(symbol)
        .bind(quote.price)
        .bind(quote.timestamp.with_timezone(&Utc))
        .bind(quote.timestamp.timezone().name())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// 이력 키: `stock`에 등록된 심볼, 없으면 정규화된 심볼
fn history_key(stored: Option<String>, symbol: &Symbol) -> String {
    stored.unwrap_or_else(|| symbol.as_str().to_string())
}

fn persistence_error(symbol: &Symbol, stage: &str, err: sqlx::Error) -> QuoteError {
    QuoteError::persistence(format!("{} ({}): {}", stage, symbol, err))
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn save_quote(&self, quote: &NormalizedQuote) -> QuoteResult<()> {
        let symbol = &quote.symbol;

        // 중간에 실패하면 tx가 drop되면서 롤백됨
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| persistence_error(symbol, "트랜잭션 시작", e))?;

        let stored = Self::update_current_price(&mut tx, symbol, quote.price)
            .await
            .map_err(|e| persistence_error(symbol, "현재가 갱신", e))?;
        if stored.is_none() {
            tracing::warn!(symbol = %symbol, "stock에 등록되지 않은 심볼, 이력만 저장");
        }
        let history_symbol = history_key(stored, symbol);

        Self::append_history(&mut tx, &history_symbol, quote)
            .await
            .map_err(|e| persistence_error(symbol, "이력 추가", e))?;

        tx.commit()
            .await
            .map_err(|e| persistence_error(symbol, "커밋", e))?;

        Ok(())
    }
}
