//! 전략 상태(지갑) 보고.

use chrono::{DateTime, Utc};
use fxsim_core::{
    margin_level_pct, profit_rate_pct, required_margin, Position, StrategyKind, TradeRecord,
    TradeStatistics,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::context::StrategyContext;

/// 전략 하나의 지갑 현황.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyStatus {
    pub strategy: StrategyKind,
    pub initial_capital: Decimal,
    /// 실현 잔고
    pub balance: Decimal,
    /// 잔고 + 미실현 손익
    pub equity: Decimal,
    pub unrealized_pnl: Decimal,
    /// equity - initial_capital
    pub total_profit: Decimal,
    /// 초기 자본 대비 수익률 (%)
    pub profit_rate_pct: Decimal,
    pub leverage: u32,
    pub position: Option<Position>,
    /// 오픈 포지션의 필요 증거금
    pub required_margin: Decimal,
    /// 증거금 유지율 (%)
    pub margin_level_pct: Option<Decimal>,
    pub last_tick: Option<DateTime<Utc>>,
    pub statistics: TradeStatistics,
}

impl StrategyStatus {
    /// 메모리 상태와 거래 이력으로 현황을 만듭니다.
    pub fn build(context: &StrategyContext, trades: &[TradeRecord]) -> Self {
        let config = context.config();
        let equity = context.equity();
        let position = context.open_position().cloned();
        let margin = position
            .as_ref()
            .map(|p| required_margin(p.units, p.current_price, config.leverage))
            .unwrap_or(Decimal::ZERO);

        Self {
            strategy: context.strategy(),
            initial_capital: config.initial_capital,
            balance: config.current_balance,
            equity,
            unrealized_pnl: context.unrealized_pnl(),
            total_profit: equity - config.initial_capital,
            profit_rate_pct: profit_rate_pct(equity, config.initial_capital),
            leverage: config.leverage,
            position,
            required_margin: margin,
            margin_level_pct: margin_level_pct(equity, margin),
            last_tick: context.last_tick(),
            statistics: TradeStatistics::from_trades(trades),
        }
    }

    /// 증거금 대비 여유 자금.
    pub fn free_margin(&self) -> Decimal {
        self.equity - self.required_margin
    }
}
