//! 단일 틱 처리 명령어.
//!
//! 외부 스케줄러가 신호와 가격을 계산한 뒤 한 번씩 호출합니다.
//!
//! ```bash
//! fxsim tick -s swing --signal LONG --price 150.12 --yield-value 4.25
//! fxsim tick -s daytrade --signal FLAT --price 149.80
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use fxsim_core::{AppConfig, ReferenceValues, StrategyKind, TradeSignal};
use fxsim_engine::{AccountingEngine, TickAction, TickOutcome};
use rust_decimal::Decimal;

use super::{connect_store, OutputFormat};

/// 단일 틱 입력.
#[derive(Debug, Clone)]
pub struct TickInput {
    pub strategy: StrategyKind,
    pub signal: TradeSignal,
    pub price: Decimal,
    pub yield_value: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// 틱 하나를 처리하고 결과를 출력합니다.
pub async fn run_tick(
    app: &AppConfig,
    db_url: Option<String>,
    input: TickInput,
    format: OutputFormat,
) -> Result<()> {
    let store = connect_store(app, db_url).await?;
    let engine = AccountingEngine::load(store).await?;

    let reference = input
        .yield_value
        .map(ReferenceValues::with_yield)
        .unwrap_or_default();
    let outcome = engine
        .on_tick(
            input.strategy,
            input.signal,
            input.price,
            reference,
            input.timestamp,
        )
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Table => print_outcome(&outcome),
    }
    Ok(())
}

/// 틱 결과 요약 한 줄.
pub fn describe_outcome(outcome: &TickOutcome) -> String {
    let action = match &outcome.action {
        TickAction::Idle => "대기".to_string(),
        TickAction::Opened(p) => format!(
            "진입 {} {}통화 @ {}",
            p.direction, p.units, p.entry_price
        ),
        TickAction::Marked(p) => format!(
            "보유 {} {}통화, 평가손익 {}",
            p.direction,
            p.units,
            p.unrealized_pnl.round_dp(0)
        ),
        TickAction::Closed(t) => format!(
            "청산 {} ({}) 손익 {}",
            t.direction,
            t.exit_reason,
            t.net_pnl.round_dp(0)
        ),
        TickAction::Reversed { trade, opened } => format!(
            "도텐 {} → {} 손익 {}, 새 진입 @ {}",
            trade.direction,
            opened.direction,
            trade.net_pnl.round_dp(0),
            opened.entry_price
        ),
    };
    match &outcome.skipped_open {
        Some(skipped) => format!("{} / {}", action, skipped.to_error()),
        None => action,
    }
}

fn print_outcome(outcome: &TickOutcome) {
    println!(
        "[{}] {} {} → {}",
        outcome.timestamp.format("%Y-%m-%d %H:%M:%S"),
        outcome.strategy,
        outcome.signal,
        describe_outcome(outcome)
    );
    println!(
        "  잔고 {}  자산 {}  평가손익 {}",
        outcome.equity.balance.round_dp(0),
        outcome.equity.equity.round_dp(0),
        outcome.equity.unrealized_pnl.round_dp(0)
    );
}
