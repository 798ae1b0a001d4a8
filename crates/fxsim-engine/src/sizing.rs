//! 포지션 크기 계산.
//!
//! 수량은 항상 `lot_step`의 배수로 내림되며, 증거금 한도를 넘지 않습니다.

use fxsim_core::{Price, SimError, SimResult, StrategyConfig, Units};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 잔고 기반 로트 계산기.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizer {
    lot_ratio: Decimal,
    lot_step: Units,
    min_units: Units,
    max_units: Option<Units>,
    leverage: u32,
}

impl PositionSizer {
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            lot_ratio: config.lot_ratio,
            lot_step: config.lot_step.max(1),
            min_units: config.min_units,
            max_units: config.max_units,
            leverage: config.leverage,
        }
    }

    /// 증거금으로 감당할 수 있는 최대 수량 (`lot_step` 단위 내림).
    pub fn margin_capacity(&self, balance: Decimal, price: Price) -> Units {
        if price <= Decimal::ZERO {
            return 0;
        }
        floor_to_step(balance * Decimal::from(self.leverage) / price, self.lot_step)
    }

    /// 주문 수량을 계산합니다.
    ///
    /// 1. `balance × lot_ratio`를 `lot_step` 단위로 내림
    /// 2. `max_units`와 증거금 한도로 제한
    /// 3. 최소 수량 미만이면 증거금이 허용하는 경우에 한해 `min_units`로 올림
    ///
    /// 결과가 0 이하이면 `InsufficientCapital`을 반환합니다.
    pub fn calculate_units(&self, balance: Decimal, price: Price) -> SimResult<Units> {
        if price <= Decimal::ZERO {
            return Err(SimError::InvalidInput(format!(
                "price must be positive, got {}",
                price
            )));
        }

        let capacity = self.margin_capacity(balance, price);
        let mut units = floor_to_step(balance * self.lot_ratio, self.lot_step);
        if let Some(max) = self.max_units {
            units = units.min(max);
        }
        units = units.min(capacity);

        if units < self.min_units && self.min_units <= capacity {
            units = self.min_units;
        }

        if units <= 0 {
            return Err(SimError::InsufficientCapital { balance, units });
        }
        Ok(units)
    }
}

/// `value`를 `step`의 배수로 내림합니다. 음수는 0.
fn floor_to_step(value: Decimal, step: Units) -> Units {
    if value <= Decimal::ZERO {
        return 0;
    }
    let lots = (value / Decimal::from(step)).floor();
    lots.to_i64()
        .and_then(|l| l.checked_mul(step))
        .unwrap_or(i64::MAX / step * step)
}
