//! 페이퍼 트레이딩 회계를 위한 도메인 모델.

mod calculations;
mod commit;
mod equity;
mod position;
mod signal;
mod statistics;
mod strategy;
mod strategy_config;
mod trade;

pub use calculations::*;
pub use commit::*;
pub use equity::*;
pub use position::*;
pub use signal::*;
pub use statistics::*;
pub use strategy::*;
pub use strategy_config::*;
pub use trade::*;
