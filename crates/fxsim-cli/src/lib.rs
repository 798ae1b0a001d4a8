//! 시뮬레이터 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 데이터베이스 초기화 및 전략 설정 시딩
//! - 단일 틱 처리 (스케줄러 연동)
//! - CSV 틱 리플레이
//! - 지갑 현황 및 거래 이력 조회

pub mod commands;
