//! 한 틱의 영속 변경 단위.
//!
//! 엔진은 틱 하나의 모든 변경(잔고, 포지션, 거래 기록, 자산 로그)을 `TickCommit`
//! 하나로 모아 저장소에 넘기고, 저장소는 이를 하나의 트랜잭션으로 반영합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EquityEntry, Position, StrategyKind, TradeRecord};

/// 틱이 포지션 테이블에 가한 변경.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionChange {
    /// 포지션 변경 없음 (보유 포지션도 없음)
    None,
    /// 새 포지션 오픈
    Opened(Position),
    /// 기존 포지션 평가 갱신
    Marked(Position),
    /// 기존 포지션 청산 (종료 상태의 최종 행)
    Closed(Position),
    /// 청산과 반대 방향 오픈을 한 단위로 반영
    Reversed { closed: Position, opened: Position },
}

impl PositionChange {
    /// 변경 적용 후 오픈 상태로 남는 포지션.
    pub fn open_after(&self) -> Option<&Position> {
        match self {
            PositionChange::Opened(p) | PositionChange::Marked(p) => Some(p),
            PositionChange::Reversed { opened, .. } => Some(opened),
            PositionChange::None | PositionChange::Closed(_) => None,
        }
    }

    /// 이번 틱에 종료된 포지션.
    pub fn closed(&self) -> Option<&Position> {
        match self {
            PositionChange::Closed(p) | PositionChange::Reversed { closed: p, .. } => Some(p),
            _ => None,
        }
    }
}

/// 원자적으로 반영되어야 하는 틱 단위 변경 묶음.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickCommit {
    pub strategy: StrategyKind,
    pub timestamp: DateTime<Utc>,
    /// 변경된 실현 잔고 (청산이 있을 때만 Some)
    pub new_balance: Option<Decimal>,
    pub position: PositionChange,
    /// 청산 거래 기록 (청산이 있을 때만 Some)
    pub trade: Option<TradeRecord>,
    pub equity: EquityEntry,
}

impl TickCommit {
    /// 묶음 내부의 일관성을 검사합니다.
    ///
    /// 청산, 거래 기록, 잔고 변경은 항상 함께 존재해야 합니다.
    pub fn check_consistency(&self) -> Result<(), String> {
        let closed = self.position.closed().is_some();
        if closed != self.trade.is_some() || closed != self.new_balance.is_some() {
            return Err(format!(
                "{} commit at {}: close, trade record and balance update must appear together",
                self.strategy, self.timestamp
            ));
        }
        if let Some(trade) = &self.trade {
            if !trade.reconciles() {
                return Err(format!("trade {} does not reconcile", trade.id));
            }
        }
        if let Some(balance) = self.new_balance {
            if balance != self.equity.balance {
                return Err(format!(
                    "{} commit at {}: equity row balance {} differs from new balance {}",
                    self.strategy, self.timestamp, self.equity.balance, balance
                ));
            }
        }
        Ok(())
    }
}
