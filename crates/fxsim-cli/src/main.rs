//! USD/JPY 페이퍼 트레이딩 시뮬레이터 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 스키마 생성 및 전략 설정 시딩
//! fxsim init
//!
//! # 스케줄러에서 틱 하나 처리
//! fxsim tick -s swing --signal LONG --price 150.12 --yield-value 4.25
//!
//! # CSV 리플레이 (인메모리)
//! fxsim replay -s daytrade -i data/session.csv
//!
//! # 지갑 현황 / 거래 이력
//! fxsim status
//! fxsim history -s swing -f 2024-01-01
//! ```

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use fxsim_core::{init_logging, AppConfig, StrategyKind, TradeSignal};
use rust_decimal::Decimal;
use tracing::{debug, error};

use fxsim_cli::commands::history::{run_history, HistoryQuery};
use fxsim_cli::commands::init::run_init;
use fxsim_cli::commands::replay::{run_replay, ReplayOptions};
use fxsim_cli::commands::status::run_status;
use fxsim_cli::commands::tick::{run_tick, TickInput};
use fxsim_cli::commands::{parse_timestamp, OutputFormat};

#[derive(Parser)]
#[command(name = "fxsim")]
#[command(about = "USD/JPY paper-trading simulator - 스윙(도텐) / 데이트레이드", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: String,

    /// 데이터베이스 URL (기본: database.url 설정 또는 DATABASE_URL 환경변수)
    #[arg(long, global = true)]
    db_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 마이그레이션 실행 및 전략 설정 시딩
    Init,

    /// 틱 하나 처리 (신호 + 가격)
    Tick {
        /// 전략 (swing, daytrade)
        #[arg(short, long)]
        strategy: String,

        /// 신호 (LONG, SHORT, HOLD, FLAT)
        #[arg(long)]
        signal: String,

        /// USD/JPY 가격
        #[arg(short, long)]
        price: Decimal,

        /// 미국 10년물 금리 (스윙 로그용)
        #[arg(long)]
        yield_value: Option<Decimal>,

        /// 틱 시각 (기본: 현재)
        #[arg(long)]
        at: Option<String>,

        /// 출력 형식 (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// CSV 틱 리플레이
    Replay {
        /// 전략 (swing, daytrade)
        #[arg(short, long)]
        strategy: String,

        /// 입력 CSV (timestamp,signal,price,yield)
        #[arg(short, long)]
        input: String,

        /// PostgreSQL 상태 위에서 실행 (기본: 인메모리)
        #[arg(long, default_value = "false")]
        db: bool,

        /// 출력 형식 (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// 지갑 현황
    Status {
        /// 전략 (생략 시 전체)
        #[arg(short, long)]
        strategy: Option<String>,

        /// 출력 형식 (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// 거래 이력 또는 자산 로그 조회
    History {
        /// 전략 (swing, daytrade)
        #[arg(short, long)]
        strategy: String,

        /// 시작 시각 (YYYY-MM-DD 또는 RFC 3339)
        #[arg(short, long)]
        from: Option<String>,

        /// 종료 시각
        #[arg(short, long)]
        to: Option<String>,

        /// 거래 이력 대신 자산 로그 조회
        #[arg(long, default_value = "false")]
        equity: bool,

        /// 출력 형식 (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

fn parse_strategy(s: &str) -> Result<StrategyKind> {
    s.parse::<StrategyKind>()
        .map_err(|e| anyhow!("{}. Supported: swing, daytrade", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let app = AppConfig::load(&cli.config)?;

    init_logging(&app.logging).map_err(|e| anyhow!("logging init failed: {}", e))?;
    debug!(config = %cli.config, "Configuration loaded");

    let result = match cli.command {
        Commands::Init => run_init(&app, cli.db_url).await,

        Commands::Tick {
            strategy,
            signal,
            price,
            yield_value,
            at,
            format,
        } => {
            let input = TickInput {
                strategy: parse_strategy(&strategy)?,
                signal: signal.parse::<TradeSignal>().map_err(|e| anyhow!(e))?,
                price,
                yield_value,
                timestamp: match at {
                    Some(at) => parse_timestamp(&at)?,
                    None => Utc::now(),
                },
            };
            run_tick(&app, cli.db_url, input, format.parse()?).await
        }

        Commands::Replay {
            strategy,
            input,
            db,
            format,
        } => {
            let options = ReplayOptions {
                strategy: parse_strategy(&strategy)?,
                input,
                use_db: db,
                db_url: cli.db_url,
                format: format.parse()?,
            };
            run_replay(&app, options).await
        }

        Commands::Status { strategy, format } => {
            let strategy = strategy.as_deref().map(parse_strategy).transpose()?;
            run_status(&app, cli.db_url, strategy, format.parse::<OutputFormat>()?).await
        }

        Commands::History {
            strategy,
            from,
            to,
            equity,
            format,
        } => {
            let query = HistoryQuery {
                strategy: parse_strategy(&strategy)?,
                from,
                to,
                equity,
            };
            run_history(&app, cli.db_url, query, format.parse()?).await
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
