//! CSV 틱 리플레이 명령어.
//!
//! `timestamp,signal,price,yield` 형식의 CSV를 순서대로 엔진에 넣습니다.
//! 기본은 인메모리 저장소이며, `--db`를 주면 PostgreSQL 상태 위에서 이어서 실행합니다.
//!
//! ```bash
//! fxsim replay -s swing -i data/usdjpy_signals.csv
//! fxsim replay -s daytrade -i data/session.csv --db
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use fxsim_core::{AppConfig, Price, ReferenceValues, StrategyKind, TradeSignal};
use fxsim_engine::{AccountingEngine, TickAction};
use fxsim_store::{MemoryStore, SimStore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::status::print_status;
use super::{connect_store, parse_timestamp, OutputFormat};

/// CSV 한 행.
#[derive(Debug, Deserialize)]
struct TickRow {
    timestamp: String,
    signal: String,
    price: Decimal,
    #[serde(rename = "yield", default)]
    yield_value: Option<Decimal>,
}

/// 해석된 리플레이 틱.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayTick {
    pub timestamp: DateTime<Utc>,
    pub signal: TradeSignal,
    pub price: Price,
    pub reference: ReferenceValues,
}

/// 리플레이 결과 집계.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub ticks: usize,
    pub opened: usize,
    pub closed: usize,
    pub reversed: usize,
    /// 자본 부족으로 건너뛴 진입
    pub skipped_entries: usize,
    /// 입력 오류로 거부된 틱
    pub rejected: usize,
}

/// CSV에서 틱을 읽습니다.
pub fn read_ticks<R: std::io::Read>(reader: R) -> Result<Vec<ReplayTick>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut ticks = Vec::new();
    for (line, row) in csv_reader.deserialize::<TickRow>().enumerate() {
        // 헤더 다음 행부터 2번째 줄
        let line = line + 2;
        let row = row.with_context(|| format!("line {}: malformed row", line))?;
        let signal = row
            .signal
            .parse::<TradeSignal>()
            .map_err(|e| anyhow!("line {}: {}", line, e))?;
        let timestamp =
            parse_timestamp(&row.timestamp).with_context(|| format!("line {}", line))?;

        ticks.push(ReplayTick {
            timestamp,
            signal,
            price: row.price,
            reference: row
                .yield_value
                .map(ReferenceValues::with_yield)
                .unwrap_or_default(),
        });
    }
    Ok(ticks)
}

pub fn load_ticks<P: AsRef<Path>>(path: P) -> Result<Vec<ReplayTick>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("failed to open {}", path.as_ref().display()))?;
    read_ticks(file)
}

/// 틱을 순서대로 엔진에 적용합니다.
///
/// 입력 오류(`InvalidInput`)는 건너뛰고 집계하며, 그 외 에러는 즉시 중단합니다.
pub async fn replay_ticks<S: SimStore>(
    engine: &AccountingEngine<S>,
    strategy: StrategyKind,
    ticks: &[ReplayTick],
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for tick in ticks {
        let outcome = match engine
            .on_tick(
                strategy,
                tick.signal,
                tick.price,
                tick.reference,
                tick.timestamp,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) if e.is_rejection() => {
                warn!(timestamp = %tick.timestamp, error = %e, "Replay tick skipped");
                summary.rejected += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        summary.ticks += 1;
        match &outcome.action {
            TickAction::Opened(_) => summary.opened += 1,
            TickAction::Closed(_) => summary.closed += 1,
            TickAction::Reversed { .. } => {
                summary.closed += 1;
                summary.reversed += 1;
            }
            TickAction::Idle | TickAction::Marked(_) => {}
        }
        if outcome.skipped_open.is_some() {
            summary.skipped_entries += 1;
        }
        debug!(
            timestamp = %tick.timestamp,
            equity = %outcome.equity.equity,
            "Replay tick applied"
        );
    }

    info!(
        ticks = summary.ticks,
        closed = summary.closed,
        rejected = summary.rejected,
        "Replay finished"
    );
    Ok(summary)
}

/// 리플레이 명령 옵션.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub strategy: StrategyKind,
    pub input: String,
    /// PostgreSQL 상태 위에서 실행
    pub use_db: bool,
    pub db_url: Option<String>,
    pub format: OutputFormat,
}

pub async fn run_replay(app: &AppConfig, options: ReplayOptions) -> Result<()> {
    let ticks = load_ticks(&options.input)?;
    info!(count = ticks.len(), input = %options.input, "Ticks loaded");

    if options.use_db {
        let store = connect_store(app, options.db_url.clone()).await?;
        let engine = AccountingEngine::bootstrap(store, app).await?;
        finish(&engine, &options, &ticks).await
    } else {
        let store = Arc::new(MemoryStore::new());
        let engine = AccountingEngine::bootstrap(store, app).await?;
        finish(&engine, &options, &ticks).await
    }
}

async fn finish<S: SimStore>(
    engine: &AccountingEngine<S>,
    options: &ReplayOptions,
    ticks: &[ReplayTick],
) -> Result<()> {
    let summary = replay_ticks(engine, options.strategy, ticks).await?;
    let status = engine.status(options.strategy).await?;

    match options.format {
        OutputFormat::Json => {
            let report = serde_json::json!({ "summary": summary, "status": status });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!(
                "\n리플레이 완료: {}틱 (진입 {}, 청산 {}, 도텐 {}, 진입 생략 {}, 거부 {})",
                summary.ticks,
                summary.opened,
                summary.closed,
                summary.reversed,
                summary.skipped_entries,
                summary.rejected
            );
            print_status(&status);
        }
    }
    Ok(())
}
