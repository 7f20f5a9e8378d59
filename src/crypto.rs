//! 서명 모듈 - 서명된 인터레스트용 키 추상화
//!
//! 키 자료는 임베더가 공급한다. 제공 구현:
//! - Sha256Signer: DigestSha256 (키 없는 무결성 다이제스트)
//! - Ed25519Signer: Ed25519 서명

use bytes::Bytes;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

use crate::name::Name;
use crate::packet::KeyLocator;

/// SignatureType: DigestSha256
pub const SIGNATURE_TYPE_DIGEST_SHA256: u64 = 0;

/// SignatureType: SignatureSha256WithRsa
pub const SIGNATURE_TYPE_SHA256_WITH_RSA: u64 = 1;

/// SignatureType: SignatureSha256WithEcdsa
pub const SIGNATURE_TYPE_SHA256_WITH_ECDSA: u64 = 3;

/// SignatureType: SignatureEd25519
pub const SIGNATURE_TYPE_ED25519: u64 = 5;

/// 서명 오류
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("유효하지 않은 키 크기")]
    InvalidKeySize,

    #[error("서명 생성 실패: {0}")]
    SigningFailed(String),
}

/// 서명자 추상화
///
/// 컨트롤 인터레스트 구성 시 이름 컴포넌트 인코딩 전체를 서명한다
pub trait Signer: Send + Sync {
    /// SignatureType 번호
    fn signature_type(&self) -> u64;

    /// SignatureInfo에 실릴 키 위치
    fn key_locator(&self) -> KeyLocator;

    /// 메시지 서명
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// DigestSha256 서명자 (키 없음)
#[derive(Debug, Default)]
pub struct Sha256Signer;

impl Sha256Signer {
    /// 새 서명자 생성
    pub fn new() -> Self {
        Self
    }
}

impl Signer for Sha256Signer {
    fn signature_type(&self) -> u64 {
        SIGNATURE_TYPE_DIGEST_SHA256
    }

    fn key_locator(&self) -> KeyLocator {
        KeyLocator::default()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(Sha256::digest(message).to_vec())
    }
}

/// Ed25519 서명자
pub struct Ed25519Signer {
    key: SigningKey,
    locator_name: Name,
}

impl Ed25519Signer {
    /// 새 키쌍 생성
    pub fn generate(locator_name: Name) -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
            locator_name,
        }
    }

    /// 기존 시크릿 키로 생성 (32바이트)
    pub fn from_bytes(secret: &[u8], locator_name: Name) -> Result<Self, CryptoError> {
        let secret: [u8; 32] = secret.try_into().map_err(|_| CryptoError::InvalidKeySize)?;
        Ok(Self {
            key: SigningKey::from_bytes(&secret),
            locator_name,
        })
    }

    /// 검증 키 반환
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl Signer for Ed25519Signer {
    fn signature_type(&self) -> u64 {
        SIGNATURE_TYPE_ED25519
    }

    fn key_locator(&self) -> KeyLocator {
        KeyLocator {
            name: self.locator_name.clone(),
            digest: Bytes::new(),
        }
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    #[test]
    fn test_sha256_signer_deterministic() {
        let signer = Sha256Signer::new();
        let a = signer.sign(b"hello").unwrap();
        let b = signer.sign(b"hello").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, signer.sign(b"world").unwrap());
        assert_eq!(signer.signature_type(), SIGNATURE_TYPE_DIGEST_SHA256);
        assert!(signer.key_locator().is_empty());
    }

    #[test]
    fn test_ed25519_sign_verify() {
        let signer = Ed25519Signer::generate(Name::from_uri("/testing/KEY/ed25519"));
        assert_eq!(signer.signature_type(), SIGNATURE_TYPE_ED25519);
        assert_eq!(
            signer.key_locator().name.to_string(),
            "/testing/KEY/ed25519"
        );

        let message = b"signed interest name components";
        let signature = signer.sign(message).unwrap();

        let sig = ed25519_dalek::Signature::from_slice(&signature).unwrap();
        assert!(signer.verifying_key().verify(message, &sig).is_ok());
        assert!(signer.verifying_key().verify(b"tampered", &sig).is_err());
    }

    #[test]
    fn test_ed25519_from_bytes() {
        let signer = Ed25519Signer::generate(Name::from_uri("/k"));
        let secret = signer.key.to_bytes();

        let restored = Ed25519Signer::from_bytes(&secret, Name::from_uri("/k")).unwrap();
        assert_eq!(
            restored.verifying_key().as_bytes(),
            signer.verifying_key().as_bytes()
        );

        assert!(Ed25519Signer::from_bytes(&secret[..16], Name::from_uri("/k")).is_err());
    }
}
