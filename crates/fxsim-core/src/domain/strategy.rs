//! 전략 변형 구분.
//!
//! 스윙(도텐) 전략과 데이트레이드 전략은 서로 독립적인 설정, 포지션 테이블,
//! 거래 이력, 자산 로그를 가집니다.

use serde::{Deserialize, Serialize};

/// 전략 변형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// 금리 추세 스윙 전략 (반대 신호에서 도텐)
    Swing,
    /// 익절/손절 기반 데이트레이드 전략
    DayTrade,
}

/// 전략별 영속 테이블 이름.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyTables {
    pub config: &'static str,
    pub positions: &'static str,
    pub history: &'static str,
    pub equity_log: &'static str,
}

impl StrategyKind {
    /// 모든 전략 변형.
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Swing, StrategyKind::DayTrade];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Swing => "swing",
            StrategyKind::DayTrade => "daytrade",
        }
    }

    /// 이 전략의 영속 테이블 이름.
    pub fn tables(&self) -> StrategyTables {
        match self {
            StrategyKind::Swing => StrategyTables {
                config: "sim_config",
                positions: "sim_positions",
                history: "sim_trade_history",
                equity_log: "sim_equity_log",
            },
            StrategyKind::DayTrade => StrategyTables {
                config: "sim_daytrade_config",
                positions: "sim_daytrade_positions",
                history: "sim_daytrade_history",
                equity_log: "sim_daytrade_equity_log",
            },
        }
    }

    /// 오픈 포지션에 스왑이 누적되는지 여부.
    pub fn accrues_swap(&self) -> bool {
        matches!(self, StrategyKind::Swing)
    }

    /// 반대 방향 신호에서 청산 후 즉시 반대 포지션을 여는지 여부 (도텐).
    pub fn reverses_on_signal(&self) -> bool {
        matches!(self, StrategyKind::Swing)
    }

    /// 익절/손절 임계값으로 자동 청산하는지 여부.
    pub fn uses_exit_thresholds(&self) -> bool {
        matches!(self, StrategyKind::DayTrade)
    }

    /// 자산 로그에 금리(10년물) 참조값을 기록하는지 여부.
    pub fn logs_yield(&self) -> bool {
        matches!(self, StrategyKind::Swing)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swing" | "doten" | "wait" => Ok(StrategyKind::Swing),
            "daytrade" | "day_trade" | "day-trade" => Ok(StrategyKind::DayTrade),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("swing".parse::<StrategyKind>().unwrap(), StrategyKind::Swing);
        assert_eq!("DayTrade".parse::<StrategyKind>().unwrap(), StrategyKind::DayTrade);
        assert_eq!("day-trade".parse::<StrategyKind>().unwrap(), StrategyKind::DayTrade);
        assert!("scalp".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_tables_are_disjoint() {
        let swing = StrategyKind::Swing.tables();
        let day = StrategyKind::DayTrade.tables();
        assert_ne!(swing.positions, day.positions);
        assert_ne!(swing.equity_log, day.equity_log);
        assert_eq!(day.history, "sim_daytrade_history");
    }

    #[test]
    fn test_strategy_capabilities() {
        assert!(StrategyKind::Swing.accrues_swap());
        assert!(StrategyKind::Swing.reverses_on_signal());
        assert!(!StrategyKind::DayTrade.accrues_swap());
        assert!(StrategyKind::DayTrade.uses_exit_thresholds());
    }
}
