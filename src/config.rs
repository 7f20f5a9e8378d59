//! Face 설정

use crate::{DEFAULT_INTEREST_LIFETIME_MS, MAX_PACKET_SIZE};

/// Face 동작 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 인터레스트 기본 수명 (밀리초)
    /// lifetime_ms가 0인 인터레스트에 이 값이 적용됨
    pub default_interest_lifetime_ms: u64,

    /// 수신 가능한 최대 패킷 크기 (바이트)
    pub max_packet_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_interest_lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

impl Config {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }
}
