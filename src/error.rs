//! 에러 타입 정의

use thiserror::Error;

/// NDN 프로토콜 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("VarNumber가 버퍼 끝에서 잘림")]
    VarNumTruncated,

    #[error("최소 길이가 아닌 VarNumber 인코딩")]
    NonMinimalVarNum,

    #[error("TLV 요소가 잘림: type={typ}")]
    ElementTruncated { typ: u64 },

    #[error("TLV 타입 불일치: expected {expected}, got {got}")]
    TypeMismatch { expected: u64, got: u64 },

    #[error("유효하지 않은 NonNegativeInteger 길이: {len}")]
    InvalidNonNegative { len: usize },

    #[error("패킷이 너무 큼: {size} bytes (최대 {max})")]
    PacketTooLarge { size: usize, max: usize },

    #[error("유효하지 않은 컨트롤 명령 구조")]
    MalformedControl,

    #[error("control response timeout")]
    ControlTimeout,

    #[error("({code}) {text}")]
    ControlCommand { code: u64, text: String },

    #[error("서명 키 미설정")]
    SigningKeyMissing,

    #[error("서명 실패: {0}")]
    Signing(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
