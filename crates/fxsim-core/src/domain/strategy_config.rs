//! 전략별 가변 설정 (Config Store의 단일 행).
//!
//! 틱 처리 중에는 `current_balance`만 변경되며, 청산된 거래 1건당 정확히 한 번 바뀝니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::StrategyKind;
use crate::error::{SimError, SimResult};
use crate::types::{Percentage, Units};

/// 스왑(오버나이트 금융비용) 누적 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapAccrual {
    /// 새로운 타임스탬프의 틱마다 고정 금액 1회
    #[default]
    PerTick,
    /// 마지막 누적 이후 경과 시간을 일 단위로 일할 계산
    PerElapsedDay,
}

impl SwapAccrual {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapAccrual::PerTick => "per_tick",
            SwapAccrual::PerElapsedDay => "per_elapsed_day",
        }
    }
}

impl std::str::FromStr for SwapAccrual {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_tick" | "tick" => Ok(SwapAccrual::PerTick),
            "per_elapsed_day" | "day" | "daily" => Ok(SwapAccrual::PerElapsedDay),
            _ => Err(format!("Unknown swap accrual mode: {}", s)),
        }
    }
}

/// 전략 인스턴스의 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// 전략 구분
    pub strategy: StrategyKind,
    /// 초기 자본 (엔)
    pub initial_capital: Decimal,
    /// 실현 현금 잔고 (엔). 청산 시에만 변경
    pub current_balance: Decimal,
    /// 레버리지 배수
    pub leverage: u32,
    /// 스프레드 (pips)
    pub spread_pips: Decimal,
    /// 1 pip의 가격 크기 (USD/JPY = 0.01)
    pub pip_size: Decimal,
    /// 롱 보유 시 1만 통화당 스왑 비용 (음수 = 수취)
    pub swap_long: Decimal,
    /// 숏 보유 시 1만 통화당 스왑 비용 (음수 = 수취)
    pub swap_short: Decimal,
    /// 스왑 누적 방식
    pub swap_accrual: SwapAccrual,
    /// 잔고 대비 통화 수량 비율 (0.02 = 잔고 100만엔 → 2만 통화)
    pub lot_ratio: Decimal,
    /// 수량 반올림 단위
    pub lot_step: Units,
    /// 최소 수량
    pub min_units: Units,
    /// 최대 수량 (None = 제한 없음)
    pub max_units: Option<Units>,
    /// 익절 임계값 (가격 변동 %, 데이트레이드)
    pub take_profit_pct: Option<Percentage>,
    /// 손절 임계값 (가격 변동 %, 데이트레이드)
    pub stop_loss_pct: Option<Percentage>,
    /// 마지막 업데이트
    pub updated_at: DateTime<Utc>,
}

impl StrategyConfig {
    /// 전체 스프레드 (가격 단위).
    pub fn spread(&self) -> Decimal {
        self.spread_pips * self.pip_size
    }

    /// 진입/청산 각각에 부과되는 절반 스프레드 (가격 단위).
    pub fn half_spread(&self) -> Decimal {
        self.spread() / Decimal::TWO
    }

    /// 방향별 스왑 단가.
    pub fn swap_rate(&self, direction: super::Direction) -> Decimal {
        match direction {
            super::Direction::Long => self.swap_long,
            super::Direction::Short => self.swap_short,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> SimResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(SimError::Config(format!(
                "{}: initial_capital must be positive",
                self.strategy
            )));
        }
        if self.leverage == 0 {
            return Err(SimError::Config(format!(
                "{}: leverage must be at least 1",
                self.strategy
            )));
        }
        if self.spread_pips < Decimal::ZERO || self.pip_size <= Decimal::ZERO {
            return Err(SimError::Config(format!(
                "{}: spread_pips must be >= 0 and pip_size > 0",
                self.strategy
            )));
        }
        if self.lot_ratio <= Decimal::ZERO || self.lot_ratio > Decimal::ONE {
            return Err(SimError::Config(format!(
                "{}: lot_ratio must be in (0, 1]",
                self.strategy
            )));
        }
        if self.lot_step <= 0 || self.min_units < 0 {
            return Err(SimError::Config(format!(
                "{}: lot_step must be positive and min_units non-negative",
                self.strategy
            )));
        }
        if let Some(max) = self.max_units {
            if max < self.min_units || max <= 0 {
                return Err(SimError::Config(format!(
                    "{}: max_units must be positive and >= min_units",
                    self.strategy
                )));
            }
        }
        if self.strategy.uses_exit_thresholds() {
            let positive = |v: Option<Decimal>| v.is_some_and(|v| v > Decimal::ZERO);
            if !positive(self.take_profit_pct) || !positive(self.stop_loss_pct) {
                return Err(SimError::Config(format!(
                    "{}: take_profit_pct and stop_loss_pct must both be positive",
                    self.strategy
                )));
            }
        }
        Ok(())
    }
}
