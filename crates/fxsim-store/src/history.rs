//! 추가 전용 거래 이력과 자산 로그.
//!
//! 기록은 추가만 가능하며 수정이나 삭제 API는 제공하지 않습니다.

use chrono::{DateTime, Utc};
use fxsim_core::{EquityEntry, StrategyKind, TradeRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::TimeRange;

/// 전략 하나의 청산 거래 이력.
#[derive(Debug, Clone)]
pub struct TradeHistory {
    strategy: StrategyKind,
    entries: Vec<TradeRecord>,
}

impl TradeHistory {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            entries: Vec::new(),
        }
    }

    /// 추가 전에 기록을 검증합니다.
    pub fn check(&self, entry: &TradeRecord) -> StoreResult<()> {
        if entry.strategy != self.strategy {
            return Err(StoreError::InvalidRecord(format!(
                "trade {} belongs to {}, not {}",
                entry.id, entry.strategy, self.strategy
            )));
        }
        entry.validate_shape().map_err(StoreError::InvalidRecord)?;
        if self.entries.iter().any(|t| t.id == entry.id) {
            return Err(StoreError::Constraint(format!("duplicate trade id {}", entry.id)));
        }
        Ok(())
    }

    /// 거래 기록을 추가합니다.
    pub fn record_trade(&mut self, entry: TradeRecord) -> StoreResult<()> {
        self.check(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[TradeRecord] {
        &self.entries
    }

    /// 청산 시각이 기간에 포함되는 기록.
    pub fn in_range(&self, range: TimeRange) -> Vec<TradeRecord> {
        let mut trades: Vec<_> = self
            .entries
            .iter()
            .filter(|t| range.contains(t.exit_time))
            .cloned()
            .collect();
        trades.sort_by_key(|t| t.exit_time);
        trades
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 전략 하나의 자산 곡선 로그.
#[derive(Debug, Clone)]
pub struct EquityLog {
    strategy: StrategyKind,
    entries: Vec<EquityEntry>,
}

impl EquityLog {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            entries: Vec::new(),
        }
    }

    /// 추가 전에 기록을 검증합니다. 시각은 마지막 기록보다 앞설 수 없습니다.
    pub fn check(&self, entry: &EquityEntry) -> StoreResult<()> {
        if entry.strategy != self.strategy {
            return Err(StoreError::InvalidRecord(format!(
                "equity row at {} belongs to {}, not {}",
                entry.timestamp, entry.strategy, self.strategy
            )));
        }
        entry.validate_shape().map_err(StoreError::InvalidRecord)?;
        if let Some(last) = self.last_timestamp() {
            if entry.timestamp < last {
                return Err(StoreError::Constraint(format!(
                    "equity row at {} precedes last row at {}",
                    entry.timestamp, last
                )));
            }
        }
        Ok(())
    }

    /// 자산 로그를 추가합니다.
    pub fn record_equity(&mut self, entry: EquityEntry) -> StoreResult<()> {
        self.check(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[EquityEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&EquityEntry> {
        self.entries.last()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest().map(|e| e.timestamp)
    }

    pub fn in_range(&self, range: TimeRange) -> Vec<EquityEntry> {
        self.entries
            .iter()
            .filter(|e| range.contains(e.timestamp))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
