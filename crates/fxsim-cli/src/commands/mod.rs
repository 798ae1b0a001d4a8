//! CLI 명령어 구현 모듈.

pub mod history;
pub mod init;
pub mod replay;
pub mod status;
pub mod tick;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use fxsim_core::AppConfig;
use fxsim_store::{Database, PgStore};

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Invalid format: {}. Supported: table, json", s)),
        }
    }
}

/// 설정의 데이터베이스 URL, 없으면 `DATABASE_URL` 환경변수.
pub fn database_url(app: &AppConfig, override_url: Option<String>) -> Result<String> {
    override_url
        .or_else(|| (!app.database.url.is_empty()).then(|| app.database.url.clone()))
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow!("database url is not configured (database.url or DATABASE_URL)"))
}

/// PostgreSQL 저장소에 연결합니다.
pub async fn connect_store(app: &AppConfig, override_url: Option<String>) -> Result<Arc<PgStore>> {
    let mut config = app.database.clone();
    config.url = database_url(app, override_url)?;

    let db = Database::connect(&config).await?;
    Ok(Arc::new(PgStore::from_database(&db)))
}

/// 시각 문자열을 UTC로 해석합니다.
///
/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), `YYYY-MM-DD` (자정) 형식을 지원합니다.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(anyhow!(
        "Invalid timestamp: {}. Use RFC 3339, YYYY-MM-DD HH:MM:SS or YYYY-MM-DD",
        s
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T09:30:00+09:00").unwrap();
        assert_eq!(rfc.hour(), 0);

        let plain = parse_timestamp("2024-03-01 09:30:00").unwrap();
        assert_eq!(plain.hour(), 9);

        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date.hour(), 0);

        assert!(parse_timestamp("03/01/2024").is_err());
    }

    #[test]
    fn test_output_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_database_url_override_wins() {
        let app = AppConfig::default();
        let url = database_url(&app, Some("postgresql://localhost/sim".to_string())).unwrap();
        assert_eq!(url, "postgresql://localhost/sim");
    }
}
