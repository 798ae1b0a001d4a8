//! 청산 거래 기록 (Trade History의 한 행).
//!
//! 청산 시점에 종료되는 포지션으로부터 정확히 한 번 생성되며 이후 변경되지 않습니다.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{exit_spread_cost, gross_pnl, net_pnl, Direction, Position, StrategyKind};
use crate::types::{Price, Units};

/// 청산 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// 반대 신호로 청산 후 반대 포지션 진입 (도텐)
    Reverse,
    /// FLAT 신호로 청산
    Flat,
    /// 익절 임계값 도달
    TakeProfit,
    /// 손절 임계값 도달
    StopLoss,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Reverse => "REVERSE",
            ExitReason::Flat => "FLAT",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::StopLoss => "STOP_LOSS",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "REVERSE" => Ok(ExitReason::Reverse),
            "FLAT" => Ok(ExitReason::Flat),
            "TAKE_PROFIT" => Ok(ExitReason::TakeProfit),
            "STOP_LOSS" => Ok(ExitReason::StopLoss),
            _ => Err(format!("Unknown exit reason: {}", s)),
        }
    }
}

/// 청산된 거래의 비용 내역 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 거래 ID
    pub id: Uuid,
    /// 원본 포지션 ID
    pub position_id: Uuid,
    /// 소속 전략
    pub strategy: StrategyKind,
    pub direction: Direction,
    pub entry_price: Price,
    /// 스프레드 미반영 청산 가격
    pub exit_price: Price,
    pub units: Units,
    /// 총손익
    pub gross_pnl: Decimal,
    /// 청산 시 스프레드 비용
    pub spread_cost: Decimal,
    /// 누적 스왑 비용
    pub swap_total: Decimal,
    /// 순손익 = gross_pnl - spread_cost - swap_total
    pub net_pnl: Decimal,
    pub exit_reason: ExitReason,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
}

impl TradeRecord {
    /// 청산 직전 포지션으로부터 거래 기록을 만듭니다.
    ///
    /// `position.swap_total`에는 이번 틱의 스왑 누적이 이미 반영되어 있어야 합니다.
    pub fn from_position(
        position: &Position,
        exit_price: Price,
        half_spread: Decimal,
        exit_reason: ExitReason,
        exit_time: DateTime<Utc>,
    ) -> Self {
        let gross = gross_pnl(position.direction, position.entry_price, exit_price, position.units);
        let spread_cost = exit_spread_cost(half_spread, position.units);
        Self {
            id: Uuid::new_v4(),
            position_id: position.id,
            strategy: position.strategy,
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            units: position.units,
            gross_pnl: gross,
            spread_cost,
            swap_total: position.swap_total,
            net_pnl: net_pnl(gross, spread_cost, position.swap_total),
            exit_reason,
            entry_time: position.entry_time,
            exit_time,
        }
    }

    /// 정산 항등식 `net = gross - spread - swap`이 성립하는지 확인합니다.
    pub fn reconciles(&self) -> bool {
        self.net_pnl == net_pnl(self.gross_pnl, self.spread_cost, self.swap_total)
    }

    /// 보유 기간.
    pub fn holding_period(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }

    /// 기록 형태 검증 (업무 규칙이 아닌 필드 형태만).
    pub fn validate_shape(&self) -> Result<(), String> {
        if self.entry_price <= Decimal::ZERO || self.exit_price <= Decimal::ZERO {
            return Err(format!("trade {}: prices must be positive", self.id));
        }
        if self.units <= 0 {
            return Err(format!("trade {}: units must be positive", self.id));
        }
        if self.exit_time < self.entry_time {
            return Err(format!("trade {}: exit_time precedes entry_time", self.id));
        }
        Ok(())
    }
}
