//! 인메모리 저장소 통합 테스트
//!
//! 틱 커밋의 원자성과 단일 오픈 포지션 제약을 검증합니다.

use chrono::{DateTime, Duration, Utc};
use fxsim_core::{
    Direction, EquityEntry, ExitReason, Position, PositionChange, ReferenceValues,
    StrategyConfig, StrategyKind, StrategySettings, TickCommit, TradeRecord,
};
use fxsim_store::{MemoryStore, SimStore, StoreError, TimeRange};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const HALF_SPREAD: Decimal = dec!(0.002);

fn swing_config() -> StrategyConfig {
    StrategySettings::swing_defaults().into_config(StrategyKind::Swing)
}

fn equity(at: DateTime<Utc>, balance: Decimal, unrealized: Decimal) -> EquityEntry {
    EquityEntry::new(
        StrategyKind::Swing,
        at,
        balance,
        unrealized,
        dec!(150),
        ReferenceValues::with_yield(dec!(4.2)),
    )
}

fn open_commit(position: &Position, balance: Decimal) -> TickCommit {
    TickCommit {
        strategy: StrategyKind::Swing,
        timestamp: position.entry_time,
        new_balance: None,
        position: PositionChange::Opened(position.clone()),
        trade: None,
        equity: equity(position.entry_time, balance, Decimal::ZERO),
    }
}

fn close_commit(
    position: &Position,
    exit_price: Decimal,
    at: DateTime<Utc>,
    balance: Decimal,
) -> (TickCommit, TradeRecord) {
    let trade = TradeRecord::from_position(position, exit_price, HALF_SPREAD, ExitReason::Flat, at);
    let mut closed = position.clone();
    closed.mark_closed(exit_price, HALF_SPREAD, at);
    let new_balance = balance + trade.net_pnl;

    let commit = TickCommit {
        strategy: StrategyKind::Swing,
        timestamp: at,
        new_balance: Some(new_balance),
        position: PositionChange::Closed(closed),
        trade: Some(trade.clone()),
        equity: equity(at, new_balance, Decimal::ZERO),
    };
    (commit, trade)
}

async fn initialized_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.save_config(&swing_config()).await.unwrap();
    store
}

#[tokio::test]
async fn test_open_commit_is_visible() {
    let store = initialized_store().await;
    let now = Utc::now();
    let position = Position::open(StrategyKind::Swing, Direction::Long, dec!(150.002), 20_000, now);

    store
        .commit_tick(&open_commit(&position, dec!(1000000)))
        .await
        .unwrap();

    let open = store
        .load_open_position(StrategyKind::Swing)
        .await
        .unwrap()
        .expect("open position");
    assert_eq!(open.id, position.id);
    assert_eq!(
        store.last_tick_time(StrategyKind::Swing).await.unwrap(),
        Some(now)
    );
    // 다른 전략에는 영향 없음
    assert!(store
        .load_open_position(StrategyKind::DayTrade)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_second_open_is_rejected_without_side_effects() {
    let store = initialized_store().await;
    let now = Utc::now();
    let first = Position::open(StrategyKind::Swing, Direction::Long, dec!(150.002), 20_000, now);
    store
        .commit_tick(&open_commit(&first, dec!(1000000)))
        .await
        .unwrap();

    let second = Position::open(
        StrategyKind::Swing,
        Direction::Short,
        dec!(149.998),
        20_000,
        now + Duration::minutes(1),
    );
    let result = store.commit_tick(&open_commit(&second, dec!(1000000))).await;

    assert!(matches!(result, Err(StoreError::Constraint(_))));
    assert_eq!(store.positions(StrategyKind::Swing).await.len(), 1);
    assert_eq!(
        store
            .equity_log(StrategyKind::Swing, TimeRange::all())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_close_updates_balance_and_history_together() {
    let store = initialized_store().await;
    let now = Utc::now();
    let position = Position::open(StrategyKind::Swing, Direction::Long, dec!(150.002), 10_000, now);
    store
        .commit_tick(&open_commit(&position, dec!(1000000)))
        .await
        .unwrap();

    let exit_at = now + Duration::hours(2);
    let (commit, trade) = close_commit(&position, dec!(151), exit_at, dec!(1000000));
    store.commit_tick(&commit).await.unwrap();

    // gross = (151 - 150.002) * 10000 = 9980, spread = 20
    assert_eq!(trade.net_pnl, dec!(9960));

    let config = store
        .load_config(StrategyKind::Swing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(config.current_balance, dec!(1009960));
    assert!(store
        .load_open_position(StrategyKind::Swing)
        .await
        .unwrap()
        .is_none());

    let history = store
        .trade_history(StrategyKind::Swing, TimeRange::all())
        .await
        .unwrap();
    assert_eq!(history, vec![trade]);
}

#[tokio::test]
async fn test_balance_mismatch_rejects_whole_commit() {
    let store = initialized_store().await;
    let now = Utc::now();
    let position = Position::open(StrategyKind::Swing, Direction::Long, dec!(150.002), 10_000, now);
    store
        .commit_tick(&open_commit(&position, dec!(1000000)))
        .await
        .unwrap();

    let (mut commit, _) = close_commit(&position, dec!(151), now + Duration::hours(1), dec!(1000000));
    commit.new_balance = Some(dec!(1)); // equity 행과 불일치

    let result = store.commit_tick(&commit).await;
    assert!(matches!(result, Err(StoreError::InvalidRecord(_))));

    let config = store
        .load_config(StrategyKind::Swing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(config.current_balance, dec!(1000000));
    assert!(store
        .load_open_position(StrategyKind::Swing)
        .await
        .unwrap()
        .is_some());
    assert!(store
        .trade_history(StrategyKind::Swing, TimeRange::all())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_reversal_leaves_exactly_one_open_row() {
    let store = initialized_store().await;
    let now = Utc::now();
    let long = Position::open(StrategyKind::Swing, Direction::Long, dec!(150.002), 10_000, now);
    store
        .commit_tick(&open_commit(&long, dec!(1000000)))
        .await
        .unwrap();

    let at = now + Duration::hours(1);
    let (close, trade) = close_commit(&long, dec!(151), at, dec!(1000000));
    let short = Position::open(StrategyKind::Swing, Direction::Short, dec!(150.998), 10_000, at);
    let PositionChange::Closed(closed) = close.position else {
        panic!("expected closed change");
    };
    let commit = TickCommit {
        position: PositionChange::Reversed {
            closed,
            opened: short.clone(),
        },
        ..close
    };
    store.commit_tick(&commit).await.unwrap();

    let rows = store.positions(StrategyKind::Swing).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().filter(|p| p.is_open()).count(), 1);

    let open = store
        .load_open_position(StrategyKind::Swing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.id, short.id);
    assert_eq!(open.direction, Direction::Short);
    assert_eq!(trade.exit_reason, ExitReason::Flat);
}

#[tokio::test]
async fn test_equity_log_range_query() {
    let store = initialized_store().await;
    let base = Utc::now();

    for minutes in 0..5 {
        let at = base + Duration::minutes(minutes);
        store
            .commit_tick(&TickCommit {
                strategy: StrategyKind::Swing,
                timestamp: at,
                new_balance: None,
                position: PositionChange::None,
                trade: None,
                equity: equity(at, dec!(1000000), Decimal::ZERO),
            })
            .await
            .unwrap();
    }

    let range = TimeRange::new(Some(base + Duration::minutes(1)), Some(base + Duration::minutes(3)));
    let rows = store.equity_log(StrategyKind::Swing, range).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}
