//! 전략별 상태와 틱 의사결정.
//!
//! `StrategyContext::apply`는 저장소에 접근하지 않는 순수 상태 전이입니다.
//! 엔진은 컨텍스트의 사본에 틱을 적용해 `TickCommit`을 만들고, 저장소 커밋이
//! 성공했을 때만 사본을 실제 상태로 교체합니다.

use chrono::{DateTime, SubsecRound, Utc};
use fxsim_core::{
    entry_price_with_spread, Direction, EquityEntry, ExitReason, Position,
    PositionChange, Price, ReferenceValues, SimError, SimResult, StrategyConfig, StrategyKind,
    TickCommit, TradeRecord, TradeSignal, Units,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ledger::PositionLedger;
use crate::sizing::PositionSizer;

/// 틱 처리 결과 동작.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TickAction {
    /// 포지션 없음, 아무것도 하지 않음
    Idle,
    /// 새 포지션 오픈
    Opened(Position),
    /// 기존 포지션 평가만 갱신
    Marked(Position),
    /// 청산 (재진입 없음)
    Closed(TradeRecord),
    /// 청산 후 반대 방향 오픈
    Reversed { trade: TradeRecord, opened: Position },
}

/// 자본 부족으로 건너뛴 진입.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkippedOpen {
    pub direction: Direction,
    pub balance: Decimal,
    pub units: Units,
}

impl SkippedOpen {
    /// 호출자에게 전달할 에러 형태.
    pub fn to_error(&self) -> SimError {
        SimError::InsufficientCapital {
            balance: self.balance,
            units: self.units,
        }
    }
}

/// 한 틱의 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickOutcome {
    pub strategy: StrategyKind,
    pub timestamp: DateTime<Utc>,
    pub signal: TradeSignal,
    pub action: TickAction,
    /// 진입 신호였지만 수량이 0이라 열지 못한 경우
    pub skipped_open: Option<SkippedOpen>,
    /// 이번 틱에 추가된 자산 로그 행
    pub equity: EquityEntry,
}

impl TickOutcome {
    /// 이번 틱에 청산된 거래.
    pub fn trade(&self) -> Option<&TradeRecord> {
        match &self.action {
            TickAction::Closed(trade) | TickAction::Reversed { trade, .. } => Some(trade),
            _ => None,
        }
    }

    /// 틱 이후 오픈 포지션이 있는지 여부.
    pub fn has_open_position(&self) -> bool {
        match &self.action {
            TickAction::Opened(_) | TickAction::Marked(_) | TickAction::Reversed { .. } => true,
            TickAction::Idle | TickAction::Closed(_) => false,
        }
    }
}

/// 한 전략의 메모리 상태.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    config: StrategyConfig,
    ledger: PositionLedger,
    last_tick: Option<DateTime<Utc>>,
}

impl StrategyContext {
    /// 설정과 오픈 포지션으로 컨텍스트를 만듭니다.
    pub fn new(
        config: StrategyConfig,
        open: Option<Position>,
        last_tick: Option<DateTime<Utc>>,
    ) -> SimResult<Self> {
        config.validate()?;
        let ledger = PositionLedger::restore(config.strategy, open)?;
        Ok(Self {
            config,
            ledger,
            last_tick,
        })
    }

    pub fn strategy(&self) -> StrategyKind {
        self.config.strategy
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn open_position(&self) -> Option<&Position> {
        self.ledger.get_open()
    }

    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        self.last_tick
    }

    /// 실현 잔고 + 오픈 포지션 청산 가치.
    pub fn equity(&self) -> Decimal {
        self.config.current_balance + self.unrealized_pnl()
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.ledger
            .get_open()
            .map(|p| p.unrealized_pnl)
            .unwrap_or(Decimal::ZERO)
    }

    /// 입력 검증. 실패하면 상태를 전혀 바꾸지 않습니다.
    fn validate_input(&self, price: Price, timestamp: DateTime<Utc>) -> SimResult<()> {
        if price <= Decimal::ZERO {
            return Err(SimError::InvalidInput(format!(
                "price must be positive, got {}",
                price
            )));
        }
        if let Some(last) = self.last_tick {
            if timestamp < last {
                return Err(SimError::InvalidInput(format!(
                    "timestamp {} precedes last tick {}",
                    timestamp, last
                )));
            }
        }
        Ok(())
    }

    /// 오픈 포지션의 청산 사유를 판정합니다.
    ///
    /// `position`은 이번 틱 가격으로 평가를 마친 상태여야 합니다.
    fn exit_reason(&self, position: &Position, signal: TradeSignal) -> Option<ExitReason> {
        if signal == TradeSignal::Flat {
            return Some(ExitReason::Flat);
        }

        if self.strategy().reverses_on_signal() {
            return match signal.direction() {
                Some(direction) if direction == position.direction.opposite() => {
                    Some(ExitReason::Reverse)
                }
                _ => None,
            };
        }

        if self.strategy().uses_exit_thresholds() {
            let change = position.unrealized_pnl_pct();
            if let Some(tp) = self.config.take_profit_pct {
                if change >= tp {
                    return Some(ExitReason::TakeProfit);
                }
            }
            if let Some(sl) = self.config.stop_loss_pct {
                if change <= -sl {
                    return Some(ExitReason::StopLoss);
                }
            }
        }
        None
    }

    /// 새 포지션을 만듭니다. 자본 부족이면 `Err(SkippedOpen)`.
    fn build_entry(
        &self,
        direction: Direction,
        price: Price,
        timestamp: DateTime<Utc>,
    ) -> SimResult<Result<Position, SkippedOpen>> {
        let balance = self.config.current_balance;
        match PositionSizer::from_config(&self.config).calculate_units(balance, price) {
            Ok(units) => {
                let entry_price =
                    entry_price_with_spread(direction, price, self.config.half_spread());
                if entry_price <= Decimal::ZERO {
                    return Err(SimError::InvalidInput(format!(
                        "{} entry at {} leaves no positive price after spread {}",
                        direction,
                        price,
                        self.config.half_spread()
                    )));
                }
                let mut position =
                    Position::open(self.strategy(), direction, entry_price, units, timestamp);
                position.mark(price, self.config.half_spread());
                Ok(Ok(position))
            }
            Err(SimError::InsufficientCapital { balance, units }) => {
                warn!(
                    direction = %direction,
                    balance = %balance,
                    units,
                    "Insufficient capital, entry skipped"
                );
                Ok(Err(SkippedOpen {
                    direction,
                    balance,
                    units,
                }))
            }
            Err(e) => Err(e),
        }
    }

    /// 틱 하나를 적용하고 저장소에 넘길 변경 묶음을 반환합니다.
    ///
    /// 에러가 나면 `self`는 일부가 변경된 상태일 수 있으므로, 호출자는 사본에
    /// 적용하고 성공한 경우에만 사본을 채택해야 합니다.
    ///
    /// 타임스탬프는 저장소 정밀도인 마이크로초로 잘라서 사용합니다.
    pub fn apply(
        &mut self,
        signal: TradeSignal,
        price: Price,
        reference: ReferenceValues,
        timestamp: DateTime<Utc>,
    ) -> SimResult<(TickCommit, TickOutcome)> {
        let timestamp = timestamp.trunc_subsecs(6);
        self.validate_input(price, timestamp)?;

        let half_spread = self.config.half_spread();
        let mut skipped_open = None;
        let mut new_balance = None;
        let mut trade = None;

        let (change, action) = match self.ledger.get_open().map(|p| p.direction) {
            Some(direction) => {
                if self.strategy().accrues_swap() {
                    let rate = self.config.swap_rate(direction);
                    let accrued =
                        self.ledger
                            .accrue_swap(self.config.swap_accrual, rate, timestamp)?;
                    if !accrued.is_zero() {
                        debug!(swap = %accrued, "Swap accrued");
                    }
                }
                let marked = self.ledger.update_mark(price, half_spread)?.clone();

                match self.exit_reason(&marked, signal) {
                    None => (
                        PositionChange::Marked(marked.clone()),
                        TickAction::Marked(marked),
                    ),
                    Some(reason) => {
                        let record =
                            TradeRecord::from_position(&marked, price, half_spread, reason, timestamp);
                        let balance = self.config.current_balance + record.net_pnl;
                        self.config.current_balance = balance;
                        self.config.updated_at = timestamp;
                        new_balance = Some(balance);
                        trade = Some(record.clone());

                        info!(
                            direction = %marked.direction,
                            units = marked.units,
                            entry = %marked.entry_price,
                            exit = %price,
                            net_pnl = %record.net_pnl,
                            reason = %reason,
                            balance = %balance,
                            "Position closed"
                        );

                        let reopen = if reason == ExitReason::Reverse {
                            match self.build_entry(direction.opposite(), price, timestamp)? {
                                Ok(position) => Some(position),
                                Err(skipped) => {
                                    skipped_open = Some(skipped);
                                    None
                                }
                            }
                        } else {
                            None
                        };

                        match reopen {
                            Some(replacement) => {
                                let closed =
                                    self.ledger
                                        .reverse(price, half_spread, timestamp, replacement.clone())?;
                                info!(
                                    direction = %replacement.direction,
                                    units = replacement.units,
                                    entry = %replacement.entry_price,
                                    "Position reversed"
                                );
                                (
                                    PositionChange::Reversed {
                                        closed,
                                        opened: replacement.clone(),
                                    },
                                    TickAction::Reversed {
                                        trade: record,
                                        opened: replacement,
                                    },
                                )
                            }
                            None => {
                                let closed = self.ledger.close(price, half_spread, timestamp)?;
                                (PositionChange::Closed(closed), TickAction::Closed(record))
                            }
                        }
                    }
                }
            }
            None => match signal.direction() {
                Some(direction) => match self.build_entry(direction, price, timestamp)? {
                    Ok(position) => {
                        self.ledger.open(position.clone())?;
                        info!(
                            direction = %position.direction,
                            units = position.units,
                            entry = %position.entry_price,
                            "Position opened"
                        );
                        (
                            PositionChange::Opened(position.clone()),
                            TickAction::Opened(position),
                        )
                    }
                    Err(skipped) => {
                        skipped_open = Some(skipped);
                        (PositionChange::None, TickAction::Idle)
                    }
                },
                None => (PositionChange::None, TickAction::Idle),
            },
        };

        let equity = EquityEntry::new(
            self.strategy(),
            timestamp,
            self.config.current_balance,
            self.unrealized_pnl(),
            price,
            reference,
        );
        self.last_tick = Some(timestamp);

        let commit = TickCommit {
            strategy: self.strategy(),
            timestamp,
            new_balance,
            position: change,
            trade,
            equity: equity.clone(),
        };
        let outcome = TickOutcome {
            strategy: self.strategy(),
            timestamp,
            signal,
            action,
            skipped_open,
            equity,
        };
        Ok((commit, outcome))
    }
}
