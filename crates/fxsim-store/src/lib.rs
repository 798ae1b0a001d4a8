//! # FX Sim Store
//!
//! 시뮬레이터 상태의 영속 계층입니다.
//!
//! - [`SimStore`]: 엔진이 사용하는 저장소 추상화
//! - [`MemoryStore`]: 테스트 및 단독 리플레이용 인메모리 구현
//! - [`PgStore`]: PostgreSQL 구현 (틱 단위 트랜잭션)
//! - [`TradeHistory`], [`EquityLog`]: 추가 전용(append-only) 기록

pub mod error;
pub mod history;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use history::{EquityLog, TradeHistory};
pub use memory::MemoryStore;
pub use postgres::{Database, PgStore};
pub use store::{SimStore, TimeRange};
