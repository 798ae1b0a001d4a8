//! 거래 통계 집계.
//!
//! 상태 조회와 리플레이 결과 요약에서 공유하는 성과 지표를 제공합니다.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExitReason, TradeRecord};

/// 거래 통계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    /// 총 거래 횟수
    pub total_trades: usize,
    /// 수익 거래 횟수
    pub winning_trades: usize,
    /// 손실 거래 횟수 (손익 0 포함하지 않음)
    pub losing_trades: usize,
    /// 승률 (백분율)
    pub win_rate_pct: Decimal,
    /// 총 수익 (수익 거래만)
    pub gross_profit: Decimal,
    /// 총 손실 (손실 거래만, 양수)
    pub gross_loss: Decimal,
    /// 순손익 합계
    pub net_profit: Decimal,
    /// Profit Factor (총수익 / 총손실, 손실이 없으면 None)
    pub profit_factor: Option<Decimal>,
    /// 최대 수익 거래
    pub largest_win: Decimal,
    /// 최대 손실 거래 (양수)
    pub largest_loss: Decimal,
    /// 평균 보유 기간 (초)
    pub avg_holding_secs: i64,
    /// 총 스프레드 비용
    pub total_spread_cost: Decimal,
    /// 총 스왑 비용
    pub total_swap: Decimal,
    /// 도텐 청산 횟수
    pub reverse_count: usize,
    /// FLAT 청산 횟수
    pub flat_count: usize,
    /// 익절 횟수
    pub take_profit_count: usize,
    /// 손절 횟수
    pub stop_loss_count: usize,
}

impl Default for TradeStatistics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            profit_factor: None,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            avg_holding_secs: 0,
            total_spread_cost: Decimal::ZERO,
            total_swap: Decimal::ZERO,
            reverse_count: 0,
            flat_count: 0,
            take_profit_count: 0,
            stop_loss_count: 0,
        }
    }
}

impl TradeStatistics {
    /// 거래 목록으로부터 통계를 계산합니다.
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        let mut stats = Self::default();
        if trades.is_empty() {
            return stats;
        }

        let mut total_holding = Duration::zero();

        for trade in trades {
            stats.total_trades += 1;
            stats.net_profit += trade.net_pnl;
            stats.total_spread_cost += trade.spread_cost;
            stats.total_swap += trade.swap_total;
            total_holding += trade.holding_period();

            if trade.net_pnl > Decimal::ZERO {
                stats.winning_trades += 1;
                stats.gross_profit += trade.net_pnl;
                stats.largest_win = stats.largest_win.max(trade.net_pnl);
            } else if trade.net_pnl < Decimal::ZERO {
                let loss = trade.net_pnl.abs();
                stats.losing_trades += 1;
                stats.gross_loss += loss;
                stats.largest_loss = stats.largest_loss.max(loss);
            }

            match trade.exit_reason {
                ExitReason::Reverse => stats.reverse_count += 1,
                ExitReason::Flat => stats.flat_count += 1,
                ExitReason::TakeProfit => stats.take_profit_count += 1,
                ExitReason::StopLoss => stats.stop_loss_count += 1,
            }
        }

        let total = Decimal::from(stats.total_trades);
        stats.win_rate_pct = Decimal::from(stats.winning_trades) / total * Decimal::ONE_HUNDRED;
        stats.profit_factor = if stats.gross_loss.is_zero() {
            None
        } else {
            Some(stats.gross_profit / stats.gross_loss)
        };
        stats.avg_holding_secs = total_holding.num_seconds() / stats.total_trades as i64;

        stats
    }
}
