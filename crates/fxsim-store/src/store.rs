//! 저장소 추상화.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxsim_core::{EquityEntry, Position, StrategyConfig, StrategyKind, TickCommit, TradeRecord};
use rust_decimal::Decimal;

use crate::error::StoreResult;

/// 조회 기간. 양 끝 모두 포함하며 `None`은 제한 없음입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// 전체 기간.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// 시각이 기간에 포함되는지 확인합니다.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// 시뮬레이터 영속 저장소.
///
/// 전략별로 설정, 포지션, 거래 이력, 자산 로그가 분리되어 저장됩니다.
/// `commit_tick`은 한 틱의 모든 변경을 전부 반영하거나 전혀 반영하지 않아야 합니다.
#[async_trait]
pub trait SimStore: Send + Sync {
    /// 전략 설정 행을 읽습니다. 아직 초기화되지 않았으면 `None`.
    async fn load_config(&self, strategy: StrategyKind) -> StoreResult<Option<StrategyConfig>>;

    /// 전략 설정 행을 생성하거나 덮어씁니다.
    async fn save_config(&self, config: &StrategyConfig) -> StoreResult<()>;

    /// 실현 잔고만 갱신합니다. 틱 처리 중의 잔고 변경은 `commit_tick`에 포함됩니다.
    async fn update_balance(
        &self,
        strategy: StrategyKind,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// 오픈 상태의 포지션 (최대 1개).
    async fn load_open_position(&self, strategy: StrategyKind) -> StoreResult<Option<Position>>;

    /// 마지막으로 기록된 자산 로그의 시각.
    async fn last_tick_time(&self, strategy: StrategyKind) -> StoreResult<Option<DateTime<Utc>>>;

    /// 한 틱의 변경을 원자적으로 반영합니다.
    async fn commit_tick(&self, commit: &TickCommit) -> StoreResult<()>;

    /// 청산 시각 기준으로 기간 내 거래 기록을 시간순으로 반환합니다.
    async fn trade_history(
        &self,
        strategy: StrategyKind,
        range: TimeRange,
    ) -> StoreResult<Vec<TradeRecord>>;

    /// 기간 내 자산 로그를 시간순으로 반환합니다.
    async fn equity_log(
        &self,
        strategy: StrategyKind,
        range: TimeRange,
    ) -> StoreResult<Vec<EquityEntry>>;
}
