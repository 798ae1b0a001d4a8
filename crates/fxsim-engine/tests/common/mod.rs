//! 엔진 통합 테스트 공용 도우미

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use fxsim_core::{AppConfig, StrategyKind, StrategySettings};
use fxsim_engine::AccountingEngine;
use fxsim_store::MemoryStore;

/// 테스트 기준 시각 (2024-01-02 09:00 UTC).
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
}

pub fn at_minutes(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

/// 전략 설정을 바꾼 AppConfig.
pub fn app_config(
    swing: impl FnOnce(&mut StrategySettings),
    daytrade: impl FnOnce(&mut StrategySettings),
) -> AppConfig {
    let mut app = AppConfig::default();
    swing(&mut app.swing);
    daytrade(&mut app.daytrade);
    app
}

pub async fn engine_with(app: &AppConfig) -> (Arc<MemoryStore>, AccountingEngine<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = AccountingEngine::bootstrap(Arc::clone(&store), app)
        .await
        .unwrap();
    (store, engine)
}

pub async fn default_engine() -> (Arc<MemoryStore>, AccountingEngine<MemoryStore>) {
    engine_with(&AppConfig::default()).await
}

pub async fn open_count(store: &MemoryStore, strategy: StrategyKind) -> usize {
    store
        .positions(strategy)
        .await
        .iter()
        .filter(|p| p.is_open())
        .count()
}
