//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 금융 정밀도를 위한 가격 타입 (USD/JPY 호가, 엔).
pub type Price = Decimal;

/// 통화 수량 (부호 없음, 방향은 `Direction`이 가짐).
pub type Units = i64;

/// 퍼센트 타입 (0.15 = 0.15%).
pub type Percentage = Decimal;

/// USD/JPY 1 pip의 가격 크기.
pub const USDJPY_PIP_SIZE: Decimal = dec!(0.01);

/// 스왑 포인트가 고시되는 통화 수량 단위 (1만 통화당).
pub const SWAP_QUOTE_UNITS: i64 = 10_000;

/// 하루의 마이크로초 수 (경과일 기반 스왑 일할 계산용).
///
/// 저장소 타임스탬프 정밀도와 같은 단위입니다.
pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 문자열로 변환합니다 (값이 이미 퍼센트 단위, 예: 0.15 → "0.15%").
    fn to_percentage_string(&self) -> String;

    /// 엔 단위로 반올림합니다 (표시용).
    fn round_yen(&self) -> Decimal;
}

impl DecimalExt for Decimal {
    fn to_percentage_string(&self) -> String {
        format!("{:.2}%", self)
    }

    fn round_yen(&self) -> Decimal {
        self.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}
