//! 손익, 스프레드, 스왑, 증거금 계산 공통 로직.
//!
//! 엔진과 리포트가 공유하는 순수 함수들입니다. 모든 금액은 엔 단위 `Decimal`입니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{Direction, SwapAccrual};
use crate::types::{Price, Units, MICROS_PER_DAY, SWAP_QUOTE_UNITS};

/// 진입 가격에 절반 스프레드를 불리한 방향으로 반영합니다.
///
/// 롱은 더 비싸게, 숏은 더 싸게 진입합니다.
pub fn entry_price_with_spread(direction: Direction, price: Price, half_spread: Decimal) -> Price {
    price + direction.sign() * half_spread
}

/// 총손익 (스프레드/스왑 제외).
///
/// `(exit - entry) * units * sign(direction)`
///
/// ```
/// use fxsim_core::{gross_pnl, Direction};
/// use rust_decimal_macros::dec;
///
/// let pnl = gross_pnl(Direction::Short, dec!(150.998), dec!(150.50), 10_000);
/// assert_eq!(pnl, dec!(4980));
/// ```
pub fn gross_pnl(direction: Direction, entry_price: Price, exit_price: Price, units: Units) -> Decimal {
    (exit_price - entry_price) * Decimal::from(units) * direction.sign()
}

/// 청산 시점에 부과되는 스프레드 비용.
pub fn exit_spread_cost(half_spread: Decimal, units: Units) -> Decimal {
    half_spread * Decimal::from(units)
}

/// 순손익 = 총손익 - 스프레드 비용 - 누적 스왑.
pub fn net_pnl(gross_pnl: Decimal, spread_cost: Decimal, swap_total: Decimal) -> Decimal {
    gross_pnl - spread_cost - swap_total
}

/// 진입가 대비 가격 변동률 (%, 포지션 방향 기준).
///
/// 익절/손절 판정에 사용합니다. 스프레드와 스왑은 포함하지 않습니다.
pub fn price_change_pct(direction: Direction, entry_price: Price, current_price: Price) -> Decimal {
    if entry_price.is_zero() {
        return Decimal::ZERO;
    }
    (current_price - entry_price) / entry_price * Decimal::ONE_HUNDRED * direction.sign()
}

/// 필요 증거금 = 명목가치 / 레버리지.
pub fn required_margin(units: Units, price: Price, leverage: u32) -> Decimal {
    if leverage == 0 {
        return Decimal::from(units) * price;
    }
    Decimal::from(units) * price / Decimal::from(leverage)
}

/// 증거금 유지율 (%). 필요 증거금이 0이면 None.
pub fn margin_level_pct(equity: Decimal, required_margin: Decimal) -> Option<Decimal> {
    if required_margin.is_zero() {
        return None;
    }
    Some(equity / required_margin * Decimal::ONE_HUNDRED)
}

/// 한 번의 누적에서 발생하는 스왑 비용.
///
/// `rate`는 1만 통화당 금액입니다. `PerTick`은 경과 시간과 무관하게 고정 금액,
/// `PerElapsedDay`는 `since`부터 `now`까지를 마이크로초 단위로 일할 계산하므로
/// 호출 빈도와 무관하게 같은 구간의 합계가 같습니다.
/// `now`가 `since`보다 늦지 않으면 항상 0을 반환합니다.
pub fn swap_for_period(
    mode: SwapAccrual,
    rate: Decimal,
    units: Units,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Decimal {
    if now <= since {
        return Decimal::ZERO;
    }
    let per_period = rate * Decimal::from(units) / Decimal::from(SWAP_QUOTE_UNITS);
    match mode {
        SwapAccrual::PerTick => per_period,
        SwapAccrual::PerElapsedDay => per_period * elapsed_days(since, now),
    }
}

/// 두 시각 사이의 경과 일수 (소수, 마이크로초 정밀도).
fn elapsed_days(since: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    let elapsed = now - since;
    match elapsed.num_microseconds() {
        Some(micros) => Decimal::from(micros) / Decimal::from(MICROS_PER_DAY),
        // i64 마이크로초를 넘는 구간 (약 29만 년)
        None => Decimal::from(elapsed.num_days()),
    }
}

/// 수익률 (%) = (현재 자산 - 초기 자본) / 초기 자본 × 100.
pub fn profit_rate_pct(equity: Decimal, initial_capital: Decimal) -> Decimal {
    if initial_capital.is_zero() {
        return Decimal::ZERO;
    }
    (equity - initial_capital) / initial_capital * Decimal::ONE_HUNDRED
}
