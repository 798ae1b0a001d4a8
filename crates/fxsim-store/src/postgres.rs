//! PostgreSQL 저장소.
//!
//! 전략마다 별도의 테이블 세트(`StrategyKind::tables`)를 사용합니다.
//! 한 틱의 잔고 갱신, 포지션 변경, 거래 기록, 자산 로그 추가는 하나의 트랜잭션으로
//! 커밋되며, 어느 한 문장이라도 실패하면 트랜잭션 전체가 롤백됩니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxsim_core::{
    DatabaseConfig, Direction, EquityEntry, ExitReason, Position, PositionChange, PositionStatus,
    StrategyConfig, StrategyKind, SwapAccrual, TickCommit, TradeRecord,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::{SimStore, TimeRange};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations").run(&self.pool).await?;

        info!("Migrations completed successfully");
        Ok(())
    }
}

// ==================== 행 타입 ====================

#[derive(Debug, FromRow)]
struct ConfigRow {
    initial_capital: Decimal,
    current_balance: Decimal,
    leverage: i32,
    spread_pips: Decimal,
    pip_size: Decimal,
    swap_long: Decimal,
    swap_short: Decimal,
    swap_accrual: String,
    lot_ratio: Decimal,
    lot_step: i64,
    min_units: i64,
    max_units: Option<i64>,
    take_profit_pct: Option<Decimal>,
    stop_loss_pct: Option<Decimal>,
    updated_at: DateTime<Utc>,
}

impl ConfigRow {
    fn into_config(self, strategy: StrategyKind) -> StoreResult<StrategyConfig> {
        Ok(StrategyConfig {
            strategy,
            initial_capital: self.initial_capital,
            current_balance: self.current_balance,
            leverage: u32::try_from(self.leverage)
                .map_err(|_| StoreError::InvalidRecord(format!("leverage {}", self.leverage)))?,
            spread_pips: self.spread_pips,
            pip_size: self.pip_size,
            swap_long: self.swap_long,
            swap_short: self.swap_short,
            swap_accrual: self
                .swap_accrual
                .parse::<SwapAccrual>()
                .map_err(StoreError::InvalidRecord)?,
            lot_ratio: self.lot_ratio,
            lot_step: self.lot_step,
            min_units: self.min_units,
            max_units: self.max_units,
            take_profit_pct: self.take_profit_pct,
            stop_loss_pct: self.stop_loss_pct,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PositionRow {
    id: Uuid,
    direction: String,
    entry_price: Decimal,
    units: i64,
    entry_time: DateTime<Utc>,
    status: String,
    current_price: Decimal,
    unrealized_pnl: Decimal,
    swap_total: Decimal,
    last_accrual_at: DateTime<Utc>,
    accrual_ticks: i64,
    closed_at: Option<DateTime<Utc>>,
}

impl PositionRow {
    fn into_position(self, strategy: StrategyKind) -> StoreResult<Position> {
        Ok(Position {
            id: self.id,
            strategy,
            direction: self
                .direction
                .parse::<Direction>()
                .map_err(StoreError::InvalidRecord)?,
            entry_price: self.entry_price,
            units: self.units,
            entry_time: self.entry_time,
            status: self
                .status
                .parse::<PositionStatus>()
                .map_err(StoreError::InvalidRecord)?,
            current_price: self.current_price,
            unrealized_pnl: self.unrealized_pnl,
            swap_total: self.swap_total,
            last_accrual_at: self.last_accrual_at,
            accrual_ticks: self.accrual_ticks,
            closed_at: self.closed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TradeRow {
    id: Uuid,
    position_id: Uuid,
    direction: String,
    entry_price: Decimal,
    exit_price: Decimal,
    units: i64,
    gross_pnl: Decimal,
    spread_cost: Decimal,
    swap_total: Decimal,
    net_pnl: Decimal,
    exit_reason: String,
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
}

impl TradeRow {
    fn into_trade(self, strategy: StrategyKind) -> StoreResult<TradeRecord> {
        Ok(TradeRecord {
            id: self.id,
            position_id: self.position_id,
            strategy,
            direction: self
                .direction
                .parse::<Direction>()
                .map_err(StoreError::InvalidRecord)?,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            units: self.units,
            gross_pnl: self.gross_pnl,
            spread_cost: self.spread_cost,
            swap_total: self.swap_total,
            net_pnl: self.net_pnl,
            exit_reason: self
                .exit_reason
                .parse::<ExitReason>()
                .map_err(StoreError::InvalidRecord)?,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
        })
    }
}

#[derive(Debug, FromRow)]
struct EquityRow {
    timestamp: DateTime<Utc>,
    balance: Decimal,
    equity: Decimal,
    unrealized_pnl: Decimal,
    yield_value: Option<Decimal>,
    usdjpy_value: Decimal,
}

impl EquityRow {
    fn into_entry(self, strategy: StrategyKind) -> EquityEntry {
        EquityEntry {
            strategy,
            timestamp: self.timestamp,
            balance: self.balance,
            equity: self.equity,
            unrealized_pnl: self.unrealized_pnl,
            yield_value: self.yield_value,
            usdjpy_value: self.usdjpy_value,
        }
    }
}

const POSITION_COLUMNS: &str = "id, direction, entry_price, units, entry_time, status, \
     current_price, unrealized_pnl, swap_total, last_accrual_at, accrual_ticks, closed_at";

// ==================== 트랜잭션 단계 ====================

async fn update_balance(
    conn: &mut PgConnection,
    strategy: StrategyKind,
    balance: Decimal,
    at: DateTime<Utc>,
) -> StoreResult<()> {
    let sql = format!(
        "UPDATE {} SET current_balance = $1, updated_at = $2 WHERE id = 1",
        strategy.tables().config
    );
    let result = sqlx::query(&sql)
        .bind(balance)
        .bind(at)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("{} config row", strategy)));
    }
    Ok(())
}

async fn insert_position(conn: &mut PgConnection, position: &Position) -> StoreResult<()> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        position.strategy.tables().positions,
        POSITION_COLUMNS
    );
    sqlx::query(&sql)
        .bind(position.id)
        .bind(position.direction.as_str())
        .bind(position.entry_price)
        .bind(position.units)
        .bind(position.entry_time)
        .bind(position.status.as_str())
        .bind(position.current_price)
        .bind(position.unrealized_pnl)
        .bind(position.swap_total)
        .bind(position.last_accrual_at)
        .bind(position.accrual_ticks)
        .bind(position.closed_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// 오픈 상태인 행만 갱신합니다. 종료된 행은 다시 쓰지 않습니다.
async fn update_position(conn: &mut PgConnection, position: &Position) -> StoreResult<()> {
    let sql = format!(
        r#"
        UPDATE {}
        SET status = $2, current_price = $3, unrealized_pnl = $4, swap_total = $5,
            last_accrual_at = $6, accrual_ticks = $7, closed_at = $8, updated_at = NOW()
        WHERE id = $1 AND status = 'OPEN'
        "#,
        position.strategy.tables().positions
    );
    let result = sqlx::query(&sql)
        .bind(position.id)
        .bind(position.status.as_str())
        .bind(position.current_price)
        .bind(position.unrealized_pnl)
        .bind(position.swap_total)
        .bind(position.last_accrual_at)
        .bind(position.accrual_ticks)
        .bind(position.closed_at)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "open {} position {}",
            position.strategy, position.id
        )));
    }
    Ok(())
}

async fn insert_trade(conn: &mut PgConnection, trade: &TradeRecord) -> StoreResult<()> {
    trade.validate_shape().map_err(StoreError::InvalidRecord)?;

    let sql = format!(
        r#"
        INSERT INTO {} (
            id, position_id, direction, entry_price, exit_price, units,
            gross_pnl, spread_cost, swap_total, net_pnl, exit_reason, entry_time, exit_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
        trade.strategy.tables().history
    );
    sqlx::query(&sql)
        .bind(trade.id)
        .bind(trade.position_id)
        .bind(trade.direction.as_str())
        .bind(trade.entry_price)
        .bind(trade.exit_price)
        .bind(trade.units)
        .bind(trade.gross_pnl)
        .bind(trade.spread_cost)
        .bind(trade.swap_total)
        .bind(trade.net_pnl)
        .bind(trade.exit_reason.as_str())
        .bind(trade.entry_time)
        .bind(trade.exit_time)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_equity(conn: &mut PgConnection, entry: &EquityEntry) -> StoreResult<()> {
    entry.validate_shape().map_err(StoreError::InvalidRecord)?;

    let table = entry.strategy.tables().equity_log;
    // 데이트레이드 로그 테이블에는 금리 컬럼이 없습니다.
    if entry.strategy.logs_yield() {
        let sql = format!(
            "INSERT INTO {} (timestamp, balance, equity, unrealized_pnl, yield_value, usdjpy_value) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            table
        );
        sqlx::query(&sql)
            .bind(entry.timestamp)
            .bind(entry.balance)
            .bind(entry.equity)
            .bind(entry.unrealized_pnl)
            .bind(entry.yield_value)
            .bind(entry.usdjpy_value)
            .execute(&mut *conn)
            .await?;
    } else {
        let sql = format!(
            "INSERT INTO {} (timestamp, balance, equity, unrealized_pnl, usdjpy_value) \
             VALUES ($1, $2, $3, $4, $5)",
            table
        );
        sqlx::query(&sql)
            .bind(entry.timestamp)
            .bind(entry.balance)
            .bind(entry.equity)
            .bind(entry.unrealized_pnl)
            .bind(entry.usdjpy_value)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// ==================== 저장소 ====================

/// PostgreSQL `SimStore` 구현.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

#[async_trait]
impl SimStore for PgStore {
    async fn load_config(&self, strategy: StrategyKind) -> StoreResult<Option<StrategyConfig>> {
        let sql = format!(
            r#"
            SELECT initial_capital, current_balance, leverage, spread_pips, pip_size,
                   swap_long, swap_short, swap_accrual, lot_ratio, lot_step, min_units,
                   max_units, take_profit_pct, stop_loss_pct, updated_at
            FROM {}
            WHERE id = 1
            "#,
            strategy.tables().config
        );
        let row: Option<ConfigRow> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;

        row.map(|r| r.into_config(strategy)).transpose()
    }

    async fn save_config(&self, config: &StrategyConfig) -> StoreResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                id, initial_capital, current_balance, leverage, spread_pips, pip_size,
                swap_long, swap_short, swap_accrual, lot_ratio, lot_step, min_units,
                max_units, take_profit_pct, stop_loss_pct, updated_at
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                initial_capital = EXCLUDED.initial_capital,
                current_balance = EXCLUDED.current_balance,
                leverage = EXCLUDED.leverage,
                spread_pips = EXCLUDED.spread_pips,
                pip_size = EXCLUDED.pip_size,
                swap_long = EXCLUDED.swap_long,
                swap_short = EXCLUDED.swap_short,
                swap_accrual = EXCLUDED.swap_accrual,
                lot_ratio = EXCLUDED.lot_ratio,
                lot_step = EXCLUDED.lot_step,
                min_units = EXCLUDED.min_units,
                max_units = EXCLUDED.max_units,
                take_profit_pct = EXCLUDED.take_profit_pct,
                stop_loss_pct = EXCLUDED.stop_loss_pct,
                updated_at = EXCLUDED.updated_at
            "#,
            config.strategy.tables().config
        );
        let leverage = i32::try_from(config.leverage)
            .map_err(|_| StoreError::InvalidRecord(format!("leverage {}", config.leverage)))?;

        sqlx::query(&sql)
            .bind(config.initial_capital)
            .bind(config.current_balance)
            .bind(leverage)
            .bind(config.spread_pips)
            .bind(config.pip_size)
            .bind(config.swap_long)
            .bind(config.swap_short)
            .bind(config.swap_accrual.as_str())
            .bind(config.lot_ratio)
            .bind(config.lot_step)
            .bind(config.min_units)
            .bind(config.max_units)
            .bind(config.take_profit_pct)
            .bind(config.stop_loss_pct)
            .bind(config.updated_at)
            .execute(&self.pool)
            .await?;

        info!(strategy = %config.strategy, balance = %config.current_balance, "Strategy config saved");
        Ok(())
    }

    async fn update_balance(
        &self,
        strategy: StrategyKind,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        update_balance(&mut *conn, strategy, balance, at).await?;
        info!(strategy = %strategy, balance = %balance, "Balance updated");
        Ok(())
    }

    async fn load_open_position(&self, strategy: StrategyKind) -> StoreResult<Option<Position>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status = 'OPEN'",
            POSITION_COLUMNS,
            strategy.tables().positions
        );
        let rows: Vec<PositionRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        if rows.len() > 1 {
            return Err(StoreError::Constraint(format!(
                "{} has {} open positions",
                strategy,
                rows.len()
            )));
        }
        rows.into_iter()
            .next()
            .map(|r| r.into_position(strategy))
            .transpose()
    }

    async fn last_tick_time(&self, strategy: StrategyKind) -> StoreResult<Option<DateTime<Utc>>> {
        let sql = format!("SELECT MAX(timestamp) FROM {}", strategy.tables().equity_log);
        let last: Option<DateTime<Utc>> = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(last)
    }

    #[instrument(skip(self, commit), fields(strategy = %commit.strategy, timestamp = %commit.timestamp))]
    async fn commit_tick(&self, commit: &TickCommit) -> StoreResult<()> {
        commit
            .check_consistency()
            .map_err(StoreError::InvalidRecord)?;

        let mut tx = self.pool.begin().await?;

        if let Some(balance) = commit.new_balance {
            update_balance(&mut *tx, commit.strategy, balance, commit.timestamp).await?;
        }

        match &commit.position {
            PositionChange::None => {}
            PositionChange::Opened(opened) => insert_position(&mut *tx, opened).await?,
            PositionChange::Marked(row) | PositionChange::Closed(row) => {
                update_position(&mut *tx, row).await?
            }
            PositionChange::Reversed { closed, opened } => {
                // 단일 오픈 인덱스 때문에 종료를 먼저 반영합니다.
                update_position(&mut *tx, closed).await?;
                insert_position(&mut *tx, opened).await?;
            }
        }

        if let Some(trade) = &commit.trade {
            insert_trade(&mut *tx, trade).await?;
        }
        insert_equity(&mut *tx, &commit.equity).await?;

        tx.commit().await?;

        debug!("Tick committed");
        Ok(())
    }

    async fn trade_history(
        &self,
        strategy: StrategyKind,
        range: TimeRange,
    ) -> StoreResult<Vec<TradeRecord>> {
        let sql = format!(
            r#"
            SELECT id, position_id, direction, entry_price, exit_price, units,
                   gross_pnl, spread_cost, swap_total, net_pnl, exit_reason, entry_time, exit_time
            FROM {}
            WHERE ($1::timestamptz IS NULL OR exit_time >= $1)
              AND ($2::timestamptz IS NULL OR exit_time <= $2)
            ORDER BY exit_time, entry_time
            "#,
            strategy.tables().history
        );
        let rows: Vec<TradeRow> = sqlx::query_as(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.into_trade(strategy)).collect()
    }

    async fn equity_log(
        &self,
        strategy: StrategyKind,
        range: TimeRange,
    ) -> StoreResult<Vec<EquityEntry>> {
        let yield_column = if strategy.logs_yield() {
            "yield_value"
        } else {
            "NULL::numeric AS yield_value"
        };
        let sql = format!(
            r#"
            SELECT timestamp, balance, equity, unrealized_pnl, {}, usdjpy_value
            FROM {}
            WHERE ($1::timestamptz IS NULL OR timestamp >= $1)
              AND ($2::timestamptz IS NULL OR timestamp <= $2)
            ORDER BY timestamp, id
            "#,
            yield_column,
            strategy.tables().equity_log
        );
        let rows: Vec<EquityRow> = sqlx::query_as(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_entry(strategy)).collect())
    }
}
