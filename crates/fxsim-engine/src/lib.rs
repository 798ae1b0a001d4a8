//! # FX Sim Engine
//!
//! 신호와 가격을 받아 포지션을 열고, 유지하고, 청산/반전하는 회계 엔진입니다.
//!
//! - [`PositionLedger`]: 전략당 하나의 오픈 포지션 슬롯
//! - [`PositionSizer`]: 잔고/레버리지 기반 로트 계산
//! - [`StrategyContext`]: 틱 하나에 대한 순수 의사결정
//! - [`AccountingEngine`]: 전략별 직렬화와 원자적 커밋
//! - [`StrategyStatus`]: 지갑/상태 보고

pub mod context;
pub mod engine;
pub mod ledger;
pub mod report;
pub mod sizing;

pub use context::{SkippedOpen, StrategyContext, TickAction, TickOutcome};
pub use engine::AccountingEngine;
pub use ledger::PositionLedger;
pub use report::StrategyStatus;
pub use sizing::PositionSizer;
