//! 인메모리 저장소.
//!
//! 테스트와 데이터베이스 없는 리플레이에 사용합니다. `commit_tick`은 모든 변경을
//! 먼저 검증한 뒤 한 번에 반영하므로 실패한 틱은 흔적을 남기지 않습니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxsim_core::{
    EquityEntry, Position, PositionChange, StrategyConfig, StrategyKind, TickCommit, TradeRecord,
};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::history::{EquityLog, TradeHistory};
use crate::store::{SimStore, TimeRange};

/// 전략 하나의 테이블 묶음.
#[derive(Debug, Clone)]
struct StrategyState {
    config: Option<StrategyConfig>,
    positions: Vec<Position>,
    trades: TradeHistory,
    equity: EquityLog,
}

impl StrategyState {
    fn new(strategy: StrategyKind) -> Self {
        Self {
            config: None,
            positions: Vec::new(),
            trades: TradeHistory::new(strategy),
            equity: EquityLog::new(strategy),
        }
    }

    fn open_position(&self) -> Option<&Position> {
        self.positions.iter().find(|p| p.is_open())
    }

    /// 반영 전 검증. 여기서 실패하면 아무것도 바뀌지 않습니다.
    fn check(&self, commit: &TickCommit) -> StoreResult<()> {
        commit
            .check_consistency()
            .map_err(StoreError::InvalidRecord)?;

        if commit.new_balance.is_some() && self.config.is_none() {
            return Err(StoreError::NotFound(format!(
                "{} config row",
                commit.strategy
            )));
        }

        let current_open = self.open_position().map(|p| p.id);
        match &commit.position {
            PositionChange::None => {}
            PositionChange::Opened(opened) => {
                self.check_opening(commit.strategy, opened, current_open)?;
            }
            PositionChange::Marked(marked) => {
                Self::check_existing(commit.strategy, marked, current_open, true)?;
            }
            PositionChange::Closed(closed) => {
                Self::check_existing(commit.strategy, closed, current_open, false)?;
            }
            PositionChange::Reversed { closed, opened } => {
                Self::check_existing(commit.strategy, closed, current_open, false)?;
                self.check_opening(commit.strategy, opened, None)?;
            }
        }

        if let Some(trade) = &commit.trade {
            self.trades.check(trade)?;
        }
        self.equity.check(&commit.equity)
    }

    fn check_opening(
        &self,
        strategy: StrategyKind,
        opened: &Position,
        current_open: Option<uuid::Uuid>,
    ) -> StoreResult<()> {
        if opened.strategy != strategy || !opened.is_open() {
            return Err(StoreError::InvalidRecord(format!(
                "position {} is not an open {} position",
                opened.id, strategy
            )));
        }
        if let Some(existing) = current_open {
            return Err(StoreError::Constraint(format!(
                "{} already has open position {}",
                strategy, existing
            )));
        }
        if self.positions.iter().any(|p| p.id == opened.id) {
            return Err(StoreError::Constraint(format!(
                "duplicate position id {}",
                opened.id
            )));
        }
        Ok(())
    }

    fn check_existing(
        strategy: StrategyKind,
        row: &Position,
        current_open: Option<uuid::Uuid>,
        expect_open: bool,
    ) -> StoreResult<()> {
        if current_open != Some(row.id) {
            return Err(StoreError::NotFound(format!(
                "open {} position {}",
                strategy, row.id
            )));
        }
        if row.is_open() != expect_open {
            return Err(StoreError::InvalidRecord(format!(
                "position {} has unexpected status {}",
                row.id,
                row.status.as_str()
            )));
        }
        Ok(())
    }

    fn upsert_position(&mut self, row: Position) {
        match self.positions.iter_mut().find(|p| p.id == row.id) {
            Some(existing) => *existing = row,
            None => self.positions.push(row),
        }
    }

    /// 검증을 통과한 변경을 반영합니다.
    fn apply(&mut self, commit: &TickCommit) -> StoreResult<()> {
        if let (Some(balance), Some(config)) = (commit.new_balance, self.config.as_mut()) {
            config.current_balance = balance;
            config.updated_at = commit.timestamp;
        }

        match &commit.position {
            PositionChange::None => {}
            PositionChange::Opened(p) | PositionChange::Marked(p) | PositionChange::Closed(p) => {
                self.upsert_position(p.clone());
            }
            PositionChange::Reversed { closed, opened } => {
                self.upsert_position(closed.clone());
                self.upsert_position(opened.clone());
            }
        }

        if let Some(trade) = &commit.trade {
            self.trades.record_trade(trade.clone())?;
        }
        self.equity.record_equity(commit.equity.clone())
    }
}

/// 인메모리 `SimStore` 구현.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<HashMap<StrategyKind, StrategyState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 전략의 모든 포지션 행 (종료 포함).
    pub async fn positions(&self, strategy: StrategyKind) -> Vec<Position> {
        self.state
            .read()
            .await
            .get(&strategy)
            .map(|s| s.positions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SimStore for MemoryStore {
    async fn load_config(&self, strategy: StrategyKind) -> StoreResult<Option<StrategyConfig>> {
        Ok(self
            .state
            .read()
            .await
            .get(&strategy)
            .and_then(|s| s.config.clone()))
    }

    async fn save_config(&self, config: &StrategyConfig) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .entry(config.strategy)
            .or_insert_with(|| StrategyState::new(config.strategy))
            .config = Some(config.clone());
        Ok(())
    }

    async fn update_balance(
        &self,
        strategy: StrategyKind,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let config = state
            .get_mut(&strategy)
            .and_then(|s| s.config.as_mut())
            .ok_or_else(|| StoreError::NotFound(format!("{} config row", strategy)))?;
        config.current_balance = balance;
        config.updated_at = at;
        Ok(())
    }

    async fn load_open_position(&self, strategy: StrategyKind) -> StoreResult<Option<Position>> {
        Ok(self
            .state
            .read()
            .await
            .get(&strategy)
            .and_then(|s| s.open_position().cloned()))
    }

    async fn last_tick_time(&self, strategy: StrategyKind) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self
            .state
            .read()
            .await
            .get(&strategy)
            .and_then(|s| s.equity.last_timestamp()))
    }

    async fn commit_tick(&self, commit: &TickCommit) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let tables = state
            .entry(commit.strategy)
            .or_insert_with(|| StrategyState::new(commit.strategy));

        tables.check(commit)?;
        tables.apply(commit)?;

        debug!(
            strategy = %commit.strategy,
            timestamp = %commit.timestamp,
            closed = commit.trade.is_some(),
            "Tick committed to memory store"
        );
        Ok(())
    }

    async fn trade_history(
        &self,
        strategy: StrategyKind,
        range: TimeRange,
    ) -> StoreResult<Vec<TradeRecord>> {
        Ok(self
            .state
            .read()
            .await
            .get(&strategy)
            .map(|s| s.trades.in_range(range))
            .unwrap_or_default())
    }

    async fn equity_log(
        &self,
        strategy: StrategyKind,
        range: TimeRange,
    ) -> StoreResult<Vec<EquityEntry>> {
        Ok(self
            .state
            .read()
            .await
            .get(&strategy)
            .map(|s| s.equity.in_range(range))
            .unwrap_or_default())
    }
}
