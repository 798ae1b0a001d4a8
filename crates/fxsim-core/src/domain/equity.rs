//! 자산 곡선 로그 (Equity Log의 한 행).
//!
//! 매매 여부와 관계없이 평가 틱마다 한 행이 추가됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ReferenceValues, StrategyKind};
use crate::types::Price;

/// 자산 로그 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityEntry {
    pub strategy: StrategyKind,
    pub timestamp: DateTime<Utc>,
    /// 실현 잔고
    pub balance: Decimal,
    /// balance + unrealized_pnl
    pub equity: Decimal,
    /// 오픈 포지션의 미실현 손익 (포지션 없으면 0)
    pub unrealized_pnl: Decimal,
    /// 미국 10년물 금리 (스윙만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_value: Option<Decimal>,
    /// USD/JPY 평가 가격
    pub usdjpy_value: Price,
}

impl EquityEntry {
    /// 잔고와 미실현 손익으로 항목을 만듭니다. `equity`는 항상 두 값의 합입니다.
    pub fn new(
        strategy: StrategyKind,
        timestamp: DateTime<Utc>,
        balance: Decimal,
        unrealized_pnl: Decimal,
        price: Price,
        reference: ReferenceValues,
    ) -> Self {
        Self {
            strategy,
            timestamp,
            balance,
            equity: balance + unrealized_pnl,
            unrealized_pnl,
            yield_value: if strategy.logs_yield() {
                reference.yield_value
            } else {
                None
            },
            usdjpy_value: price,
        }
    }

    /// 기록 형태 검증.
    pub fn validate_shape(&self) -> Result<(), String> {
        if self.usdjpy_value <= Decimal::ZERO {
            return Err(format!("equity entry at {}: usdjpy_value must be positive", self.timestamp));
        }
        if self.equity != self.balance + self.unrealized_pnl {
            return Err(format!(
                "equity entry at {}: equity {} != balance {} + unrealized {}",
                self.timestamp, self.equity, self.balance, self.unrealized_pnl
            ));
        }
        Ok(())
    }
}
