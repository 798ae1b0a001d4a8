//! 시뮬레이터의 에러 타입.
//!
//! 틱 처리 중 발생하는 모든 실패는 `SimError`로 호출자에게 전달됩니다.
//! 거부되거나 중단된 틱은 절대 조용히 무시되지 않습니다.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::StrategyKind;

/// 시뮬레이터 핵심 에러.
#[derive(Debug, Error)]
pub enum SimError {
    /// 잘못된 입력 (0 이하 가격, 역순 타임스탬프 등). 상태 변경 전에 거부됩니다.
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 이미 오픈 포지션이 있는데 새 포지션을 열려고 함 (엔진 상태 머신 버그)
    #[error("이미 오픈 포지션이 존재합니다: {0}")]
    PositionAlreadyOpen(StrategyKind),

    /// 오픈 포지션이 없는데 청산하려고 함 (엔진 상태 머신 버그)
    #[error("오픈 포지션이 없습니다: {0}")]
    NoOpenPosition(StrategyKind),

    /// 포지션 크기 계산 결과가 0 이하
    #[error("자본 부족: 잔고 {balance}로 계산된 수량 {units}")]
    InsufficientCapital { balance: Decimal, units: i64 },

    /// 저장소 쓰기/읽기 실패. 틱 전체가 롤백됩니다.
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 전략이 초기화되지 않음
    #[error("전략이 초기화되지 않았습니다: {0}")]
    NotInitialized(StrategyKind),
}

/// 시뮬레이터 작업을 위한 Result 타입.
pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// 엔진 자체의 불변식 위반인지 확인합니다.
    ///
    /// 사용자 입력 오류가 아니라 상태 머신 버그를 의미하며, 틱을 중단시킵니다.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            SimError::PositionAlreadyOpen(_) | SimError::NoOpenPosition(_)
        )
    }

    /// 상태 변경 전에 거부된 입력인지 확인합니다.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SimError::InvalidInput(_))
    }

    /// 틱의 트랜잭션을 중단시키는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        self.is_invariant_violation() || matches!(self, SimError::Storage(_))
    }
}

impl From<config::ConfigError> for SimError {
    fn from(err: config::ConfigError) -> Self {
        SimError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violation() {
        let err = SimError::PositionAlreadyOpen(StrategyKind::Swing);
        assert!(err.is_invariant_violation());
        assert!(err.is_fatal());

        let err = SimError::InvalidInput("price".to_string());
        assert!(!err.is_invariant_violation());
        assert!(err.is_rejection());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_storage_is_fatal() {
        let err = SimError::Storage("connection reset".to_string());
        assert!(err.is_fatal());
        assert!(!err.is_rejection());
    }
}
