//! 지갑 현황 명령어.

use anyhow::Result;
use fxsim_core::{AppConfig, DecimalExt, StrategyKind};
use fxsim_engine::{AccountingEngine, StrategyStatus};

use super::{connect_store, OutputFormat};

/// 전략(또는 전체)의 지갑 현황을 출력합니다.
pub async fn run_status(
    app: &AppConfig,
    db_url: Option<String>,
    strategy: Option<StrategyKind>,
    format: OutputFormat,
) -> Result<()> {
    let store = connect_store(app, db_url).await?;
    let engine = AccountingEngine::load(store).await?;

    let wallets = match strategy {
        Some(kind) => vec![engine.status(kind).await?],
        None => engine.wallets().await?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&wallets)?),
        OutputFormat::Table => print_wallets(&wallets),
    }
    Ok(())
}

/// 지갑 현황을 표 형식으로 출력합니다.
pub fn print_wallets(wallets: &[StrategyStatus]) {
    for status in wallets {
        print_status(status);
    }
}

pub fn print_status(status: &StrategyStatus) {
    let stats = &status.statistics;

    println!("\n=== {} ===", status.strategy);
    println!("초기 자본     : {}", status.initial_capital.round_yen());
    println!("실현 잔고     : {}", status.balance.round_yen());
    println!("평가 자산     : {}", status.equity.round_yen());
    println!("평가 손익     : {}", status.unrealized_pnl.round_yen());
    println!(
        "총 손익       : {} ({})",
        status.total_profit.round_yen(),
        status.profit_rate_pct.to_percentage_string()
    );

    match &status.position {
        Some(p) => {
            println!(
                "포지션       : {} {}통화 @ {} (현재 {}, 스왑 {})",
                p.direction,
                p.units,
                p.entry_price,
                p.current_price,
                p.swap_total.round_yen()
            );
            println!(
                "필요 증거금   : {} (유지율 {})",
                status.required_margin.round_yen(),
                status
                    .margin_level_pct
                    .map(|m| m.to_percentage_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        None => println!("포지션       : 없음"),
    }

    println!(
        "거래          : {}건 (승 {} / 패 {}, 승률 {})",
        stats.total_trades,
        stats.winning_trades,
        stats.losing_trades,
        stats.win_rate_pct.to_percentage_string()
    );
    if let Some(pf) = stats.profit_factor {
        println!("Profit Factor : {}", pf.round_dp(2));
    }
    if let Some(last) = status.last_tick {
        println!("마지막 틱     : {}", last.format("%Y-%m-%d %H:%M:%S"));
    }
}
