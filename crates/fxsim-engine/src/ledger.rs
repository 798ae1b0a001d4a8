//! 포지션 원장.
//!
//! 전략당 오픈 포지션은 구조적으로 최대 하나입니다. 원장은 정책을 갖지 않으며,
//! 열린 포지션을 덮어쓰는 대신 `PositionAlreadyOpen`으로 실패합니다.

use chrono::{DateTime, Utc};
use fxsim_core::{Position, Price, SimError, SimResult, StrategyKind, SwapAccrual};
use rust_decimal::Decimal;

/// 단일 오픈 슬롯 포지션 원장.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    strategy: StrategyKind,
    open: Option<Position>,
}

impl PositionLedger {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            open: None,
        }
    }

    /// 저장소에서 읽은 오픈 포지션으로 원장을 복원합니다.
    pub fn restore(strategy: StrategyKind, open: Option<Position>) -> SimResult<Self> {
        if let Some(position) = &open {
            if position.strategy != strategy || !position.is_open() {
                return Err(SimError::Storage(format!(
                    "position {} is not an open {} position",
                    position.id, strategy
                )));
            }
        }
        Ok(Self { strategy, open })
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// 오픈 포지션.
    pub fn get_open(&self) -> Option<&Position> {
        self.open.as_ref()
    }

    pub fn has_open(&self) -> bool {
        self.open.is_some()
    }

    /// 새 포지션을 슬롯에 넣습니다.
    pub fn open(&mut self, position: Position) -> SimResult<&Position> {
        if self.open.is_some() {
            return Err(SimError::PositionAlreadyOpen(self.strategy));
        }
        self.check_openable(&position)?;
        Ok(self.open.insert(position))
    }

    /// 슬롯에 들어갈 수 있는 포지션인지 확인합니다.
    fn check_openable(&self, position: &Position) -> SimResult<()> {
        if position.strategy != self.strategy || !position.is_open() {
            return Err(SimError::InvalidInput(format!(
                "position {} cannot be opened in the {} ledger",
                position.id, self.strategy
            )));
        }
        if position.entry_price <= Decimal::ZERO || position.units <= 0 {
            return Err(SimError::InvalidInput(format!(
                "position {} has entry {} for {} units",
                position.id, position.entry_price, position.units
            )));
        }
        Ok(())
    }

    /// 오픈 포지션을 청산하고 종료 상태의 포지션을 반환합니다.
    pub fn close(
        &mut self,
        exit_price: Price,
        half_spread: Decimal,
        at: DateTime<Utc>,
    ) -> SimResult<Position> {
        let mut position = self
            .open
            .take()
            .ok_or(SimError::NoOpenPosition(self.strategy))?;
        position.mark_closed(exit_price, half_spread, at);
        Ok(position)
    }

    /// 오픈 포지션에 스왑을 누적합니다. 누적된 금액을 반환합니다.
    pub fn accrue_swap(
        &mut self,
        mode: SwapAccrual,
        rate: Decimal,
        now: DateTime<Utc>,
    ) -> SimResult<Decimal> {
        let position = self
            .open
            .as_mut()
            .ok_or(SimError::NoOpenPosition(self.strategy))?;
        Ok(position.accrue_swap(mode, rate, now))
    }

    /// 평가 가격을 갱신합니다.
    pub fn update_mark(&mut self, price: Price, half_spread: Decimal) -> SimResult<&Position> {
        let position = self
            .open
            .as_mut()
            .ok_or(SimError::NoOpenPosition(self.strategy))?;
        position.mark(price, half_spread);
        Ok(position)
    }

    /// 오픈 포지션을 청산하고 곧바로 `replacement`를 엽니다.
    ///
    /// 반환값은 종료된 포지션입니다. 슬롯이 비어 있는 중간 상태는 외부에 노출되지 않습니다.
    pub fn reverse(
        &mut self,
        exit_price: Price,
        half_spread: Decimal,
        at: DateTime<Utc>,
        replacement: Position,
    ) -> SimResult<Position> {
        self.check_openable(&replacement)?;
        let closed = self.close(exit_price, half_spread, at)?;
        self.open(replacement)?;
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxsim_core::Direction;
    use rust_decimal_macros::dec;

    fn position(direction: Direction) -> Position {
        Position::open(StrategyKind::Swing, direction, dec!(150.002), 10_000, Utc::now())
    }

    #[test]
    fn test_open_twice_is_invariant_violation() {
        let mut ledger = PositionLedger::new(StrategyKind::Swing);
        ledger.open(position(Direction::Long)).unwrap();

        let err = ledger.open(position(Direction::Short)).unwrap_err();
        assert!(matches!(err, SimError::PositionAlreadyOpen(StrategyKind::Swing)));
        assert!(err.is_invariant_violation());
        assert_eq!(ledger.get_open().unwrap().direction, Direction::Long);
    }

    #[test]
    fn test_close_empty_is_invariant_violation() {
        let mut ledger = PositionLedger::new(StrategyKind::DayTrade);
        let err = ledger.close(dec!(150), dec!(0.002), Utc::now()).unwrap_err();

        assert!(matches!(err, SimError::NoOpenPosition(StrategyKind::DayTrade)));
    }

    #[test]
    fn test_close_returns_closed_row() {
        let mut ledger = PositionLedger::new(StrategyKind::Swing);
        ledger.open(position(Direction::Long)).unwrap();

        let closed = ledger.close(dec!(151), dec!(0.002), Utc::now()).unwrap();
        assert!(!closed.is_open());
        assert!(closed.closed_at.is_some());
        assert!(!ledger.has_open());
    }

    #[test]
    fn test_reverse_swaps_slot() {
        let mut ledger = PositionLedger::new(StrategyKind::Swing);
        ledger.open(position(Direction::Long)).unwrap();

        let short = position(Direction::Short);
        let short_id = short.id;
        let closed = ledger
            .reverse(dec!(151), dec!(0.002), Utc::now(), short)
            .unwrap();

        assert_eq!(closed.direction, Direction::Long);
        assert_eq!(ledger.get_open().unwrap().id, short_id);
    }

    #[test]
    fn test_open_rejects_non_positive_entry() {
        let mut ledger = PositionLedger::new(StrategyKind::Swing);
        let mut short = position(Direction::Short);
        short.entry_price = dec!(-0.001);

        let err = ledger.open(short).unwrap_err();
        assert!(matches!(err, SimError::InvalidInput(_)));
        assert!(!ledger.has_open());
    }

    #[test]
    fn test_reverse_keeps_slot_when_replacement_invalid() {
        let mut ledger = PositionLedger::new(StrategyKind::Swing);
        let long = position(Direction::Long);
        let long_id = long.id;
        ledger.open(long).unwrap();

        let mut short = position(Direction::Short);
        short.entry_price = Decimal::ZERO;
        assert!(ledger.reverse(dec!(0.002), dec!(0.002), Utc::now(), short).is_err());
        assert_eq!(ledger.get_open().unwrap().id, long_id);
    }

    #[test]
    fn test_restore_rejects_closed_row() {
        let mut row = position(Direction::Long);
        row.mark_closed(dec!(150), Decimal::ZERO, Utc::now());

        assert!(PositionLedger::restore(StrategyKind::Swing, Some(row)).is_err());
    }

    #[test]
    fn test_update_mark_recomputes_unrealized() {
        let mut ledger = PositionLedger::new(StrategyKind::Swing);
        ledger.open(position(Direction::Long)).unwrap();

        let marked = ledger.update_mark(dec!(150.502), dec!(0.002)).unwrap();
        // (150.502 - 150.002) * 10000 - 0.002 * 10000
        assert_eq!(marked.unrealized_pnl, dec!(4980));
    }
}
