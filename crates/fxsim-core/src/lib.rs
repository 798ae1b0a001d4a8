//! # FX Sim Core
//!
//! USD/JPY 페이퍼 트레이딩 시뮬레이터의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시뮬레이터 전반에서 사용되는 기본 타입을 제공합니다:
//! - 전략 구분 및 매매 신호
//! - 포지션 및 청산 거래 기록
//! - 자산 곡선(Equity Log) 항목
//! - 손익/스프레드/스왑 계산
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
