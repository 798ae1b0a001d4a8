//! 데이터베이스 초기화 명령어.
//!
//! 마이그레이션을 실행하고, 설정 행이 없는 전략을 애플리케이션 설정으로 시딩합니다.
//! 이미 설정이 있는 전략은 그대로 둡니다.

use std::sync::Arc;

use anyhow::Result;
use fxsim_core::AppConfig;
use fxsim_engine::AccountingEngine;
use fxsim_store::{Database, PgStore};
use tracing::info;

use super::database_url;
use super::status::print_wallets;

/// 스키마 생성 및 전략 설정 시딩.
pub async fn run_init(app: &AppConfig, db_url: Option<String>) -> Result<()> {
    let mut config = app.database.clone();
    config.url = database_url(app, db_url)?;

    let db = Database::connect(&config).await?;
    db.migrate().await?;

    let store = Arc::new(PgStore::from_database(&db));
    let engine = AccountingEngine::bootstrap(store, app).await?;
    info!("Simulator initialized");

    println!("\n시뮬레이터 초기화 완료");
    print_wallets(&engine.wallets().await?);
    Ok(())
}
