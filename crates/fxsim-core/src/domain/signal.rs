//! 외부에서 계산된 매매 지시 신호와 포지션 방향.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// 손익 계산용 부호 (롱 = 1, 숏 = -1).
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// 반대 방향.
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LONG" | "BUY" => Ok(Direction::Long),
            "SHORT" | "SELL" => Ok(Direction::Short),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// 신호 제공자가 계산한 매매 지시.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSignal {
    /// 롱 포지션 목표
    Long,
    /// 숏 포지션 목표
    Short,
    /// 현재 상태 유지
    Hold,
    /// 포지션 없이 대기 (오픈 포지션은 청산)
    Flat,
}

impl TradeSignal {
    /// 신호가 가리키는 방향 (HOLD/FLAT은 None).
    pub fn direction(&self) -> Option<Direction> {
        match self {
            TradeSignal::Long => Some(Direction::Long),
            TradeSignal::Short => Some(Direction::Short),
            TradeSignal::Hold | TradeSignal::Flat => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSignal::Long => "LONG",
            TradeSignal::Short => "SHORT",
            TradeSignal::Hold => "HOLD",
            TradeSignal::Flat => "FLAT",
        }
    }
}

impl From<Direction> for TradeSignal {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => TradeSignal::Long,
            Direction::Short => TradeSignal::Short,
        }
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradeSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LONG" | "BUY" | "UP" => Ok(TradeSignal::Long),
            "SHORT" | "SELL" | "DOWN" => Ok(TradeSignal::Short),
            "HOLD" => Ok(TradeSignal::Hold),
            "FLAT" | "EXIT" | "WAIT" => Ok(TradeSignal::Flat),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

/// 자산 로그에 함께 기록하는 참조 시장값.
///
/// 가격(USD/JPY)은 틱의 `price`로 별도 전달되므로 여기에는 보조 시계열만 담습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValues {
    /// 미국 10년물 금리 (스윙 전략만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_value: Option<Decimal>,
}

impl ReferenceValues {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_yield(yield_value: Decimal) -> Self {
        Self {
            yield_value: Some(yield_value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign_and_opposite() {
        assert_eq!(Direction::Long.sign(), Decimal::ONE);
        assert_eq!(Direction::Short.sign(), Decimal::NEGATIVE_ONE);
        assert_eq!(Direction::Long.opposite(), Direction::Short);
    }

    #[test]
    fn test_signal_parsing() {
        assert_eq!("long".parse::<TradeSignal>().unwrap(), TradeSignal::Long);
        assert_eq!(" DOWN ".parse::<TradeSignal>().unwrap(), TradeSignal::Short);
        assert_eq!("flat".parse::<TradeSignal>().unwrap(), TradeSignal::Flat);
        assert!("maybe".parse::<TradeSignal>().is_err());
    }

    #[test]
    fn test_signal_direction() {
        assert_eq!(TradeSignal::Short.direction(), Some(Direction::Short));
        assert_eq!(TradeSignal::Hold.direction(), None);
        assert_eq!(TradeSignal::from(Direction::Long), TradeSignal::Long);
    }
}
