//! 정밀한 금액 계산을 위한 Decimal 유틸리티.

use rust_decimal::{Decimal, RoundingStrategy};

/// 금액 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 금액 값에 허용되는 최대 소수점 자릿수.
pub const MAX_MONEY_PRECISION: u32 = 15;

/// 금액 연산을 위한 확장 트레이트.
pub trait MoneyExt {
    /// 지정된 최대 소수점 자릿수 내에서 나눗셈을 수행합니다.
    ///
    /// 0으로 나누거나 오버플로가 발생하면 `None`을 반환합니다.
    fn div_with_precision(&self, divisor: Decimal, dp: u32) -> Option<Decimal>;

    /// 최대 소수점 자릿수로 반올림합니다 (0.5는 0에서 멀어지는 방향).
    fn round_money(&self, dp: u32) -> Decimal;
}

impl MoneyExt for Decimal {
    fn div_with_precision(&self, divisor: Decimal, dp: u32) -> Option<Decimal> {
        self.checked_div(divisor).map(|q| q.round_money(dp))
    }

    fn round_money(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    }
}
