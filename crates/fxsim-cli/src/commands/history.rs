//! 거래 이력 / 자산 로그 조회 명령어.
//!
//! ```bash
//! fxsim history -s swing -f 2024-01-01 -t 2024-03-31
//! fxsim history -s daytrade --equity --format json
//! ```

use anyhow::Result;
use fxsim_core::{AppConfig, DecimalExt, EquityEntry, StrategyKind, TradeRecord, TradeStatistics};
use fxsim_store::{SimStore, TimeRange};

use super::{connect_store, parse_timestamp, OutputFormat};

/// 조회 조건.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub strategy: StrategyKind,
    pub from: Option<String>,
    pub to: Option<String>,
    /// 거래 이력 대신 자산 로그 조회
    pub equity: bool,
}

impl HistoryQuery {
    pub fn range(&self) -> Result<TimeRange> {
        let from = self.from.as_deref().map(parse_timestamp).transpose()?;
        let to = self.to.as_deref().map(parse_timestamp).transpose()?;
        Ok(TimeRange::new(from, to))
    }
}

pub async fn run_history(
    app: &AppConfig,
    db_url: Option<String>,
    query: HistoryQuery,
    format: OutputFormat,
) -> Result<()> {
    let range = query.range()?;
    let store = connect_store(app, db_url).await?;

    if query.equity {
        let rows = store.equity_log(query.strategy, range).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            OutputFormat::Table => print_equity_log(&rows),
        }
    } else {
        let trades = store.trade_history(query.strategy, range).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&trades)?),
            OutputFormat::Table => print_trades(&trades),
        }
    }
    Ok(())
}

pub fn print_trades(trades: &[TradeRecord]) {
    println!(
        "{:<19}  {:<19}  {:<5}  {:>8}  {:>10}  {:>10}  {:>10}  {:>8}  {:>8}  {:<11}",
        "진입", "청산", "방향", "수량", "진입가", "청산가", "순손익", "스프레드", "스왑", "사유"
    );
    for t in trades {
        println!(
            "{:<19}  {:<19}  {:<5}  {:>8}  {:>10}  {:>10}  {:>10}  {:>8}  {:>8}  {:<11}",
            t.entry_time.format("%Y-%m-%d %H:%M:%S"),
            t.exit_time.format("%Y-%m-%d %H:%M:%S"),
            t.direction.as_str(),
            t.units,
            t.entry_price,
            t.exit_price,
            t.net_pnl.round_yen(),
            t.spread_cost.round_yen(),
            t.swap_total.round_yen(),
            t.exit_reason.as_str()
        );
    }

    let stats = TradeStatistics::from_trades(trades);
    println!(
        "\n총 {}건, 순손익 {}, 승률 {}",
        stats.total_trades,
        stats.net_profit.round_yen(),
        stats.win_rate_pct.to_percentage_string()
    );
}

pub fn print_equity_log(rows: &[EquityEntry]) {
    println!(
        "{:<19}  {:>12}  {:>12}  {:>10}  {:>10}  {:>7}",
        "시각", "잔고", "자산", "평가손익", "USD/JPY", "금리"
    );
    for e in rows {
        println!(
            "{:<19}  {:>12}  {:>12}  {:>10}  {:>10}  {:>7}",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.balance.round_yen(),
            e.equity.round_yen(),
            e.unrealized_pnl.round_yen(),
            e.usdjpy_value,
            e.yield_value
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_range_parsing() {
        let query = HistoryQuery {
            strategy: StrategyKind::Swing,
            from: Some("2024-01-01".to_string()),
            to: None,
            equity: false,
        };
        let range = query.range().unwrap();
        assert!(range.from.is_some());
        assert!(range.to.is_none());

        let bad = HistoryQuery {
            from: Some("yesterday".to_string()),
            ..query
        };
        assert!(bad.range().is_err());
    }
}
