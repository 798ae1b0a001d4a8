//! 가상 포지션.
//!
//! 전략당 OPEN 상태 포지션은 최대 1개입니다. 그 제약은 원장(`PositionLedger`)의
//! 단일 슬롯과 영속 계층의 고유 인덱스로 보장하며, 이 타입은 한 포지션의
//! 진입 속성과 평가 필드만 다룹니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    exit_spread_cost, gross_pnl, price_change_pct, swap_for_period, Direction, StrategyKind,
    SwapAccrual,
};
use crate::types::{Price, Units};

/// 포지션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::Closed => "CLOSED",
        }
    }
}

impl std::str::FromStr for PositionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(PositionStatus::Open),
            "CLOSED" => Ok(PositionStatus::Closed),
            _ => Err(format!("Unknown position status: {}", s)),
        }
    }
}

/// 시뮬레이션 포지션.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// 대리 키
    pub id: Uuid,
    /// 소속 전략
    pub strategy: StrategyKind,
    /// 방향
    pub direction: Direction,
    /// 스프레드 반영 진입가
    pub entry_price: Price,
    /// 통화 수량 (양수)
    pub units: Units,
    /// 진입 시각
    pub entry_time: DateTime<Utc>,
    /// 상태
    pub status: PositionStatus,
    /// 마지막 평가 가격
    pub current_price: Price,
    /// 청산 가치 기준 미실현 손익 (매 틱 재계산)
    pub unrealized_pnl: Decimal,
    /// 누적 스왑 비용
    pub swap_total: Decimal,
    /// 마지막 스왑 누적 시각
    pub last_accrual_at: DateTime<Utc>,
    /// 스왑이 누적된 틱 수
    pub accrual_ticks: i64,
    /// 청산 시각 (오픈 상태면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// 새 오픈 포지션을 생성합니다.
    ///
    /// `entry_price`는 이미 스프레드가 반영된 가격이어야 합니다.
    pub fn open(
        strategy: StrategyKind,
        direction: Direction,
        entry_price: Price,
        units: Units,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy,
            direction,
            entry_price,
            units,
            entry_time,
            status: PositionStatus::Open,
            current_price: entry_price,
            unrealized_pnl: Decimal::ZERO,
            swap_total: Decimal::ZERO,
            last_accrual_at: entry_time,
            accrual_ticks: 0,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// 현재 평가 가격 기준 총손익.
    pub fn gross_at(&self, price: Price) -> Decimal {
        gross_pnl(self.direction, self.entry_price, price, self.units)
    }

    /// 현재 평가 가격 기준 가격 변동률 (%).
    pub fn unrealized_pnl_pct(&self) -> Decimal {
        price_change_pct(self.direction, self.entry_price, self.current_price)
    }

    /// 평가 가격을 갱신하고 미실현 손익을 청산 가치로 재계산합니다.
    pub fn mark(&mut self, price: Price, half_spread: Decimal) {
        self.current_price = price;
        self.unrealized_pnl =
            self.gross_at(price) - exit_spread_cost(half_spread, self.units) - self.swap_total;
    }

    /// `now`까지의 스왑을 누적하고 누적액을 반환합니다.
    ///
    /// 마지막 누적 시각 이후 시간이 흐르지 않았으면 아무것도 누적하지 않으므로,
    /// 같은 타임스탬프의 틱을 재실행해도 이중 누적되지 않습니다.
    pub fn accrue_swap(&mut self, mode: SwapAccrual, rate: Decimal, now: DateTime<Utc>) -> Decimal {
        if now <= self.last_accrual_at {
            return Decimal::ZERO;
        }
        let delta = swap_for_period(mode, rate, self.units, self.last_accrual_at, now);
        self.swap_total += delta;
        self.last_accrual_at = now;
        self.accrual_ticks += 1;
        delta
    }

    /// 포지션을 종료 상태로 전환합니다.
    pub fn mark_closed(&mut self, exit_price: Price, half_spread: Decimal, at: DateTime<Utc>) {
        self.mark(exit_price, half_spread);
        self.status = PositionStatus::Closed;
        self.closed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn long_position() -> Position {
        Position::open(
            StrategyKind::Swing,
            Direction::Long,
            dec!(150.002),
            10_000,
            Utc::now(),
        )
    }

    #[test]
    fn test_mark_includes_exit_spread_and_swap() {
        let mut position = long_position();
        position.mark(dec!(150.00), dec!(0.002));
        assert_eq!(position.unrealized_pnl, dec!(-40));

        position.swap_total = dec!(10);
        position.mark(dec!(151.00), dec!(0.002));
        assert_eq!(position.unrealized_pnl, dec!(9950));
    }

    #[test]
    fn test_accrue_swap_is_keyed_to_time() {
        let mut position = long_position();
        let t1 = position.entry_time + Duration::hours(1);

        assert_eq!(position.accrue_swap(SwapAccrual::PerTick, dec!(100), t1), dec!(100));
        // 같은 타임스탬프 재실행
        assert_eq!(position.accrue_swap(SwapAccrual::PerTick, dec!(100), t1), Decimal::ZERO);
        assert_eq!(position.swap_total, dec!(100));
        assert_eq!(position.accrual_ticks, 1);
    }

    #[test]
    fn test_accrue_swap_per_tick_on_millisecond_step() {
        let mut position = long_position();
        let t1 = position.entry_time + Duration::milliseconds(500);

        assert_eq!(position.accrue_swap(SwapAccrual::PerTick, dec!(100), t1), dec!(100));
        assert_eq!(position.swap_total, dec!(100));
        assert_eq!(position.accrual_ticks, 1);
        assert_eq!(position.last_accrual_at, t1);
    }

    #[test]
    fn test_unrealized_pnl_pct_follows_mark() {
        let mut position = Position::open(
            StrategyKind::DayTrade,
            Direction::Short,
            dec!(150.00),
            10_000,
            Utc::now(),
        );
        position.mark(dec!(150.195), dec!(0.002));
        assert_eq!(position.unrealized_pnl_pct(), dec!(-0.13));
    }

    #[test]
    fn test_no_swap_on_entry_tick() {
        let mut position = long_position();
        let entry = position.entry_time;
        assert_eq!(position.accrue_swap(SwapAccrual::PerTick, dec!(100), entry), Decimal::ZERO);
    }

    #[test]
    fn test_mark_closed() {
        let mut position = long_position();
        let at = position.entry_time + Duration::days(1);
        position.mark_closed(dec!(151.00), dec!(0.002), at);
        assert!(!position.is_open());
        assert_eq!(position.closed_at, Some(at));
        assert_eq!(position.current_price, dec!(151.00));
    }
}
