//! # NDN 클라이언트 Face 라이브러리
//!
//! 하나의 바이트 트랜스포트를 두 개의 논리 스트림으로 다중화하는
//! Named-Data Networking 클라이언트 엔드포인트
//!
//! ## 핵심 특징
//! - **인터레스트 합침**: 같은 이름의 동시 요청은 한 번만 전송
//! - **PIT**: 이름 트라이 기반 대기자 관리, 접두사 일치 팬아웃
//! - **콘텐츠 스토어**: FreshnessPeriod 기반 TTL 캐시, Face 간 공유
//! - **셀렉터 필터**: 대기자별 매칭 조건 (서픽스 범위, 발행자 키, 제외)
//! - **수명 타이머**: 응답 없는 인터레스트는 채널 닫힘으로 통지
//! - **NFD 관리**: 서명된 컨트롤 인터레스트로 프리픽스 등록/해제

pub mod config;
pub mod crypto;
pub mod cs;
pub mod error;
pub mod face;
pub mod name;
pub mod nfd;
pub mod packet;
pub mod pit;
pub mod stats;
pub mod tlv;

pub use config::Config;
pub use crypto::{Ed25519Signer, Sha256Signer, Signer};
pub use cs::ContentStore;
pub use error::{Error, Result};
pub use face::{DataReceiver, Face};
pub use name::Name;
pub use nfd::{Control, ControlParameters, ControlResponse};
pub use packet::{
    Data, Exclude, ExcludeEntry, Interest, KeyLocator, MetaInfo, Selectors, SignatureInfo,
};
pub use pit::Matcher;
pub use stats::StatsSnapshot;

/// 인터레스트 기본 수명 (밀리초)
pub const DEFAULT_INTEREST_LIFETIME_MS: u64 = 4000;

/// 수신 허용 최대 패킷 크기 (바이트)
pub const MAX_PACKET_SIZE: usize = 8800;

/// NFD 기본 TCP 포트
pub const DEFAULT_PORT: u16 = 6363;
