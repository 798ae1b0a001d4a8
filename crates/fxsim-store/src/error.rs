//! 저장소 오류 타입.

use fxsim_core::SimError;
use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    Query(String),

    /// 제약 조건 위반 (단일 오픈 포지션, 중복 ID 등)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// 갱신 대상 행이 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 저장된 행을 도메인 타입으로 해석할 수 없음
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    Migration(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                // 23505: unique_violation, 23514: check_violation, 23503: foreign_key_violation
                if code == "23505" || code == "23514" || code == "23503" {
                    StoreError::Constraint(db_err.message().to_string())
                } else {
                    StoreError::Query(db_err.message().to_string())
                }
            }
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::InvalidRecord(format!("column {}: {}", index, source))
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

impl From<StoreError> for SimError {
    fn from(err: StoreError) -> Self {
        SimError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_maps_to_storage() {
        let err: SimError = StoreError::Constraint("sim_positions_single_open".into()).into();
        assert!(matches!(err, SimError::Storage(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("sim_positions_single_open"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
