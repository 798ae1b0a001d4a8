//! tracing을 사용한 로깅 인프라.
//!
//! `[logging]` 설정 섹션의 형식에 따라 출력 레이어를 고릅니다:
//! - **pretty**: 개발용 사람이 읽기 쉬운 형식
//! - **json**: 운영환경/로그 집계용 JSON 형식
//! - **compact**: 리플레이처럼 로그가 많은 작업용 간결한 형식

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 색상이 포함된 사람이 읽기 쉬운 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON 형식 (운영용)
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl LogFormat {
    /// 설정 섹션의 형식. 알 수 없는 값이면 `Pretty`.
    pub fn from_config(config: &LoggingConfig) -> Self {
        config.format.parse().unwrap_or_default()
    }

    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer().with_target(true);
        match self {
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Json => base.json().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        }
    }
}

/// 설정 섹션으로 로깅 시스템을 초기화합니다.
///
/// `RUST_LOG`가 설정되어 있으면 `config.level`보다 우선합니다.
///
/// ```no_run
/// use fxsim_core::{init_logging, LoggingConfig};
///
/// let config = LoggingConfig {
///     level: "fxsim_engine=debug".to_string(),
///     format: "json".to_string(),
/// };
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let format = LogFormat::from_config(config);

    tracing_subscriber::registry()
        .with(format.layer())
        .with(env_filter)
        .try_init()?;

    if config.format.parse::<LogFormat>().is_err() {
        tracing::warn!(format = %config.format, "Unknown log format, using pretty");
    }
    tracing::info!(format = ?format, level = %config.level, "Logging initialized");

    Ok(())
}

/// 틱 처리 컨텍스트 필드가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! tick_span {
    ($strategy:expr, $signal:expr, $price:expr) => {
        tracing::info_span!("tick", strategy = %$strategy, signal = %$signal, price = %$price)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(format: &str) -> LoggingConfig {
        LoggingConfig {
            level: "info".to_string(),
            format: format.to_string(),
        }
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_format_from_logging_section() {
        assert_eq!(LogFormat::from_config(&section("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_config(&section("yaml")), LogFormat::Pretty);
    }
}
