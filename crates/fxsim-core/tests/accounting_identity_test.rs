//! 손익 계산 항등식 속성 테스트
//!
//! 임의의 진입/청산 가격, 수량, 스왑에 대해 거래 기록과 포지션 평가가
//! 서로 일치하는지 검증합니다.

use chrono::{Duration, TimeZone, Utc};
use fxsim_core::{
    entry_price_with_spread, gross_pnl, price_change_pct, Direction, EquityEntry, ExitReason,
    Position, ReferenceValues, StrategyKind, TradeRecord,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

/// 100.000 ~ 200.000 엔 (0.001 단위)
fn price() -> impl Strategy<Value = Decimal> {
    (100_000i64..=200_000).prop_map(|p| Decimal::new(p, 3))
}

proptest! {
    #[test]
    fn trade_record_reconciles(
        direction in direction(),
        entry in price(),
        exit in price(),
        lots in 1i64..=20,
        swap_cents in -100_000i64..=100_000,
        spread_tenths in 0i64..=20,
    ) {
        let opened_at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let half_spread = Decimal::new(spread_tenths, 3) / Decimal::TWO;
        let mut position = Position::open(
            StrategyKind::Swing,
            direction,
            entry_price_with_spread(direction, entry, half_spread),
            lots * 10_000,
            opened_at,
        );
        position.swap_total = Decimal::new(swap_cents, 2);
        position.mark(exit, half_spread);

        let trade = TradeRecord::from_position(
            &position,
            exit,
            half_spread,
            ExitReason::Flat,
            opened_at + Duration::hours(1),
        );

        prop_assert!(trade.reconciles());
        prop_assert!(trade.validate_shape().is_ok());
        // 청산 직전 평가손익 = 청산 순손익
        prop_assert_eq!(position.unrealized_pnl, trade.net_pnl);
    }

    #[test]
    fn gross_pnl_is_antisymmetric(entry in price(), exit in price(), lots in 1i64..=20) {
        let units = lots * 10_000;
        prop_assert_eq!(
            gross_pnl(Direction::Long, entry, exit, units),
            -gross_pnl(Direction::Short, entry, exit, units)
        );
        prop_assert_eq!(
            price_change_pct(Direction::Long, entry, exit),
            -price_change_pct(Direction::Short, entry, exit)
        );
    }

    #[test]
    fn entry_spread_is_always_unfavorable(direction in direction(), mid in price(), tenths in 1i64..=20) {
        let half_spread = Decimal::new(tenths, 3);
        let entry = entry_price_with_spread(direction, mid, half_spread);

        // 진입 직후 같은 가격으로 평가하면 항상 손실
        prop_assert!(gross_pnl(direction, entry, mid, 10_000) < Decimal::ZERO);
    }

    #[test]
    fn equity_entry_identity(balance in -1_000_000i64..=5_000_000, unrealized in -500_000i64..=500_000) {
        let entry = EquityEntry::new(
            StrategyKind::DayTrade,
            Utc::now(),
            Decimal::from(balance),
            Decimal::from(unrealized),
            Decimal::new(150_000, 3),
            ReferenceValues::with_yield(Decimal::new(425, 2)),
        );

        prop_assert_eq!(entry.equity, entry.balance + entry.unrealized_pnl);
        prop_assert!(entry.validate_shape().is_ok());
        prop_assert!(entry.yield_value.is_none());
    }
}
