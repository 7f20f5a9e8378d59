//! 프로토콜 패킷 정의
//!
//! - Interest: 이름 + 셀렉터 + nonce + 수명
//! - Data: 이름 + 메타정보 + 콘텐츠 + 서명
//! - 와이어 형식은 전부 TLV

use std::cmp::Ordering;

use bytes::{Bytes, BytesMut};

use crate::name::Name;
use crate::tlv::{self, Element};
use crate::{Error, Result};

/// TLV: Interest 패킷
pub const TLV_INTEREST: u64 = 5;

/// TLV: Data 패킷
pub const TLV_DATA: u64 = 6;

/// TLV: Selectors
pub const TLV_SELECTORS: u64 = 9;

/// TLV: Nonce
pub const TLV_NONCE: u64 = 10;

/// TLV: InterestLifetime
pub const TLV_INTEREST_LIFETIME: u64 = 12;

/// TLV: MinSuffixComponents
pub const TLV_MIN_SUFFIX_COMPONENTS: u64 = 13;

/// TLV: MaxSuffixComponents
pub const TLV_MAX_SUFFIX_COMPONENTS: u64 = 14;

/// TLV: PublisherPublicKeyLocator
pub const TLV_PUBLISHER_PUBLIC_KEY_LOCATOR: u64 = 15;

/// TLV: Exclude
pub const TLV_EXCLUDE: u64 = 16;

/// TLV: ChildSelector
pub const TLV_CHILD_SELECTOR: u64 = 17;

/// TLV: MustBeFresh
pub const TLV_MUST_BE_FRESH: u64 = 18;

/// TLV: Any (Exclude 범위 마커)
pub const TLV_ANY: u64 = 19;

/// TLV: MetaInfo
pub const TLV_META_INFO: u64 = 20;

/// TLV: Content
pub const TLV_CONTENT: u64 = 21;

/// TLV: SignatureInfo
pub const TLV_SIGNATURE_INFO: u64 = 22;

/// TLV: SignatureValue
pub const TLV_SIGNATURE_VALUE: u64 = 23;

/// TLV: ContentType
pub const TLV_CONTENT_TYPE: u64 = 24;

/// TLV: FreshnessPeriod
pub const TLV_FRESHNESS_PERIOD: u64 = 25;

/// TLV: SignatureType
pub const TLV_SIGNATURE_TYPE: u64 = 27;

/// TLV: KeyLocator
pub const TLV_KEY_LOCATOR: u64 = 28;

/// TLV: KeyDigest
pub const TLV_KEY_DIGEST: u64 = 29;

/// 서명 키 위치 (이름 또는 다이제스트)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyLocator {
    /// 키 이름 (비어 있으면 미설정)
    pub name: Name,

    /// 키 다이제스트 (비어 있으면 미설정)
    pub digest: Bytes,
}

impl KeyLocator {
    /// 이름과 다이제스트 모두 미설정이면 true
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.digest.is_empty()
    }

    pub(crate) fn encode_value(&self) -> Bytes {
        let mut inner = BytesMut::new();
        if !self.name.is_empty() {
            self.name.encode(&mut inner);
        }
        if !self.digest.is_empty() {
            tlv::write_element(&mut inner, TLV_KEY_DIGEST, &self.digest);
        }
        inner.freeze()
    }

    pub(crate) fn decode_value(mut value: Bytes) -> Result<KeyLocator> {
        let mut locator = KeyLocator::default();
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                crate::name::TLV_NAME => locator.name = Name::decode_value(el.value)?,
                TLV_KEY_DIGEST => locator.digest = el.value,
                _ => {}
            }
        }
        Ok(locator)
    }
}

/// Exclude 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeEntry {
    /// 범위 마커 (이전/다음 컴포넌트 사이 전체)
    Any,

    /// 단일 컴포넌트
    Component(Bytes),
}

/// 컴포넌트 제외 집합/범위 표현
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclude {
    /// 정렬된 항목 목록
    pub entries: Vec<ExcludeEntry>,
}

impl Exclude {
    /// 항목이 없으면 true
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 컴포넌트가 제외 대상이면 true
    ///
    /// 단일 항목은 정확 일치, Any는 인접 컴포넌트 사이의 열린 범위
    pub fn is_excluded(&self, component: &[u8]) -> bool {
        let mut lower: Option<&Bytes> = None;
        let mut range_open = false;

        for entry in &self.entries {
            match entry {
                ExcludeEntry::Any => range_open = true,
                ExcludeEntry::Component(c) => {
                    if component == c.as_ref() {
                        return true;
                    }
                    if range_open {
                        let above = lower.map_or(true, |l| component > l.as_ref());
                        if above && component < c.as_ref() {
                            return true;
                        }
                        range_open = false;
                    }
                    lower = Some(c);
                }
            }
        }

        if range_open {
            // 상한 없는 범위
            return lower.map_or(true, |l| component > l.as_ref());
        }
        false
    }

    fn encode_value(&self) -> Bytes {
        let mut inner = BytesMut::new();
        for entry in &self.entries {
            match entry {
                ExcludeEntry::Any => tlv::write_element(&mut inner, TLV_ANY, &[]),
                ExcludeEntry::Component(c) => {
                    tlv::write_element(&mut inner, crate::name::TLV_NAME_COMPONENT, c)
                }
            }
        }
        inner.freeze()
    }

    fn decode_value(mut value: Bytes) -> Result<Exclude> {
        let mut exclude = Exclude::default();
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                TLV_ANY => exclude.entries.push(ExcludeEntry::Any),
                crate::name::TLV_NAME_COMPONENT => {
                    exclude.entries.push(ExcludeEntry::Component(el.value))
                }
                typ => {
                    return Err(Error::TypeMismatch {
                        expected: crate::name::TLV_NAME_COMPONENT,
                        got: typ,
                    })
                }
            }
        }
        Ok(exclude)
    }
}

/// 요청자별 매칭 조건
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors {
    /// 최소 서픽스 컴포넌트 수 (0 = 미설정)
    pub min_suffix_components: u64,

    /// 최대 서픽스 컴포넌트 수 (0 = 미설정)
    pub max_suffix_components: u64,

    /// 요구하는 발행자 키 위치 (비어 있으면 미설정)
    pub publisher_public_key_locator: KeyLocator,

    /// 제외 컴포넌트
    pub exclude: Exclude,

    /// 자식 선택 방향 (0 = 미설정)
    pub child_selector: u64,

    /// 신선한 데이터만 요구
    pub must_be_fresh: bool,
}

impl Selectors {
    /// 모든 필드가 미설정이면 true
    pub fn is_empty(&self) -> bool {
        self.min_suffix_components == 0
            && self.max_suffix_components == 0
            && self.publisher_public_key_locator.is_empty()
            && self.exclude.is_empty()
            && self.child_selector == 0
            && !self.must_be_fresh
    }

    /// 데이터가 이 셀렉터를 만족하는지 판정
    ///
    /// suffix_len은 PIT 노드 기준 서픽스 길이.
    /// MustBeFresh는 원격 종단에서 평가하므로 여기서 보지 않음.
    pub fn matches(&self, data: &Data, suffix_len: usize) -> bool {
        if self.min_suffix_components != 0 && (suffix_len as u64) < self.min_suffix_components {
            return false;
        }
        if self.max_suffix_components != 0 && (suffix_len as u64) > self.max_suffix_components {
            return false;
        }

        let locator = &self.publisher_public_key_locator;
        if !locator.name.is_empty()
            && locator
                .name
                .compare(&data.signature_info.key_locator.name)
                != Ordering::Equal
        {
            return false;
        }
        if !locator.digest.is_empty() && locator.digest != data.signature_info.key_locator.digest {
            return false;
        }

        if suffix_len > 0 {
            // 루트 노드처럼 suffix_len이 이름 길이를 넘으면 검사할 컴포넌트 없음
            if let Some(index) = data.name.len().checked_sub(suffix_len) {
                if let Some(component) = data.name.component(index) {
                    if self.exclude.is_excluded(component) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn encode_value(&self) -> Bytes {
        let mut inner = BytesMut::new();
        if self.min_suffix_components != 0 {
            tlv::write_nonneg_element(&mut inner, TLV_MIN_SUFFIX_COMPONENTS, self.min_suffix_components);
        }
        if self.max_suffix_components != 0 {
            tlv::write_nonneg_element(&mut inner, TLV_MAX_SUFFIX_COMPONENTS, self.max_suffix_components);
        }
        if !self.publisher_public_key_locator.is_empty() {
            tlv::write_element(
                &mut inner,
                TLV_PUBLISHER_PUBLIC_KEY_LOCATOR,
                &self.publisher_public_key_locator.encode_value(),
            );
        }
        if !self.exclude.is_empty() {
            tlv::write_element(&mut inner, TLV_EXCLUDE, &self.exclude.encode_value());
        }
        if self.child_selector != 0 {
            tlv::write_nonneg_element(&mut inner, TLV_CHILD_SELECTOR, self.child_selector);
        }
        if self.must_be_fresh {
            tlv::write_element(&mut inner, TLV_MUST_BE_FRESH, &[]);
        }
        inner.freeze()
    }

    fn decode_value(mut value: Bytes) -> Result<Selectors> {
        let mut selectors = Selectors::default();
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                TLV_MIN_SUFFIX_COMPONENTS => selectors.min_suffix_components = el.as_nonneg()?,
                TLV_MAX_SUFFIX_COMPONENTS => selectors.max_suffix_components = el.as_nonneg()?,
                TLV_PUBLISHER_PUBLIC_KEY_LOCATOR => {
                    selectors.publisher_public_key_locator = KeyLocator::decode_value(el.value)?
                }
                TLV_EXCLUDE => selectors.exclude = Exclude::decode_value(el.value)?,
                TLV_CHILD_SELECTOR => selectors.child_selector = el.as_nonneg()?,
                TLV_MUST_BE_FRESH => selectors.must_be_fresh = true,
                _ => {}
            }
        }
        Ok(selectors)
    }
}

/// 인터레스트 패킷
#[derive(Debug, Clone, Default)]
pub struct Interest {
    /// 요청 이름
    pub name: Name,

    /// 매칭 조건
    pub selectors: Selectors,

    /// 중복 탐지용 난수
    pub nonce: u32,

    /// 수명 (밀리초, 0 = 미설정으로 기본값 적용)
    pub lifetime_ms: u64,
}

impl Interest {
    /// 새 인터레스트 생성 (난수 nonce 자동 부여)
    pub fn new(name: Name) -> Self {
        Self {
            name,
            selectors: Selectors::default(),
            nonce: rand::random(),
            lifetime_ms: 0,
        }
    }

    /// 패킷 전체 직렬화
    pub fn to_bytes(&self) -> Bytes {
        let mut value = BytesMut::new();
        self.name.encode(&mut value);
        if !self.selectors.is_empty() {
            tlv::write_element(&mut value, TLV_SELECTORS, &self.selectors.encode_value());
        }
        tlv::write_element(&mut value, TLV_NONCE, &self.nonce.to_be_bytes());
        if self.lifetime_ms != 0 {
            tlv::write_nonneg_element(&mut value, TLV_INTEREST_LIFETIME, self.lifetime_ms);
        }

        let mut buf = BytesMut::new();
        tlv::write_element(&mut buf, TLV_INTEREST, &value);
        buf.freeze()
    }

    /// Interest TLV의 값 부분 디코딩
    pub fn decode_value(mut value: Bytes) -> Result<Interest> {
        let name = Name::decode(&mut value)?;
        let mut interest = Interest {
            name,
            selectors: Selectors::default(),
            nonce: 0,
            lifetime_ms: 0,
        };
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                TLV_SELECTORS => interest.selectors = Selectors::decode_value(el.value)?,
                TLV_NONCE => interest.nonce = el.as_nonneg()? as u32,
                TLV_INTEREST_LIFETIME => interest.lifetime_ms = el.as_nonneg()?,
                _ => {}
            }
        }
        Ok(interest)
    }
}

/// 데이터 메타정보
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    /// 콘텐츠 타입 (0 = 기본 BLOB)
    pub content_type: u64,

    /// 신선 기간 (밀리초, 0 = 캐싱 대상 아님)
    pub freshness_period_ms: u64,
}

/// 서명 메타정보
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureInfo {
    /// 서명 알고리즘 번호
    pub signature_type: u64,

    /// 서명 키 위치
    pub key_locator: KeyLocator,
}

/// 데이터 패킷
#[derive(Debug, Clone, Default)]
pub struct Data {
    /// 콘텐츠 이름
    pub name: Name,

    /// 메타정보
    pub meta_info: MetaInfo,

    /// 콘텐츠 바이트
    pub content: Bytes,

    /// 서명 메타정보
    pub signature_info: SignatureInfo,

    /// 서명 값
    pub signature_value: Bytes,
}

impl Data {
    /// 새 데이터 패킷 생성
    pub fn new(name: Name, content: Bytes) -> Self {
        Self {
            name,
            meta_info: MetaInfo::default(),
            content,
            signature_info: SignatureInfo::default(),
            signature_value: Bytes::new(),
        }
    }

    /// 패킷 전체 직렬화
    pub fn to_bytes(&self) -> Bytes {
        let mut value = BytesMut::new();
        self.name.encode(&mut value);

        let mut meta = BytesMut::new();
        if self.meta_info.content_type != 0 {
            tlv::write_nonneg_element(&mut meta, TLV_CONTENT_TYPE, self.meta_info.content_type);
        }
        if self.meta_info.freshness_period_ms != 0 {
            tlv::write_nonneg_element(
                &mut meta,
                TLV_FRESHNESS_PERIOD,
                self.meta_info.freshness_period_ms,
            );
        }
        tlv::write_element(&mut value, TLV_META_INFO, &meta);

        tlv::write_element(&mut value, TLV_CONTENT, &self.content);

        let mut sig_info = BytesMut::new();
        tlv::write_nonneg_element(&mut sig_info, TLV_SIGNATURE_TYPE, self.signature_info.signature_type);
        if !self.signature_info.key_locator.is_empty() {
            tlv::write_element(
                &mut sig_info,
                TLV_KEY_LOCATOR,
                &self.signature_info.key_locator.encode_value(),
            );
        }
        tlv::write_element(&mut value, TLV_SIGNATURE_INFO, &sig_info);

        tlv::write_element(&mut value, TLV_SIGNATURE_VALUE, &self.signature_value);

        let mut buf = BytesMut::new();
        tlv::write_element(&mut buf, TLV_DATA, &value);
        buf.freeze()
    }

    /// Data TLV의 값 부분 디코딩
    pub fn decode_value(mut value: Bytes) -> Result<Data> {
        let name = Name::decode(&mut value)?;
        let mut data = Data::new(name, Bytes::new());
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                TLV_META_INFO => {
                    let mut inner = el.value;
                    while !inner.is_empty() {
                        let child = Element::read(&mut inner)?;
                        match child.typ {
                            TLV_CONTENT_TYPE => data.meta_info.content_type = child.as_nonneg()?,
                            TLV_FRESHNESS_PERIOD => {
                                data.meta_info.freshness_period_ms = child.as_nonneg()?
                            }
                            _ => {}
                        }
                    }
                }
                TLV_CONTENT => data.content = el.value,
                TLV_SIGNATURE_INFO => {
                    let mut inner = el.value;
                    while !inner.is_empty() {
                        let child = Element::read(&mut inner)?;
                        match child.typ {
                            TLV_SIGNATURE_TYPE => {
                                data.signature_info.signature_type = child.as_nonneg()?
                            }
                            TLV_KEY_LOCATOR => {
                                data.signature_info.key_locator =
                                    KeyLocator::decode_value(child.value)?
                            }
                            _ => {}
                        }
                    }
                }
                TLV_SIGNATURE_VALUE => data.signature_value = el.value,
                _ => {}
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_roundtrip() {
        let mut interest = Interest::new(Name::from_uri("/testing/ndn"));
        interest.lifetime_ms = 4000;
        interest.selectors.min_suffix_components = 1;
        interest.selectors.max_suffix_components = 3;
        interest.selectors.must_be_fresh = true;
        interest.selectors.publisher_public_key_locator.name = Name::from_uri("/key/loc");

        let mut bytes = interest.to_bytes();
        let el = Element::read(&mut bytes).unwrap();
        assert_eq!(el.typ, TLV_INTEREST);

        let decoded = Interest::decode_value(el.value).unwrap();
        assert_eq!(decoded.name, interest.name);
        assert_eq!(decoded.nonce, interest.nonce);
        assert_eq!(decoded.lifetime_ms, 4000);
        assert_eq!(decoded.selectors, interest.selectors);
    }

    #[test]
    fn test_data_roundtrip() {
        let mut data = Data::new(Name::from_uri("/testing/ndn"), Bytes::from_static(b"hello"));
        data.meta_info.freshness_period_ms = 500;
        data.meta_info.content_type = 2;
        data.signature_info.signature_type = 5;
        data.signature_info.key_locator.name = Name::from_uri("/key/loc");
        data.signature_value = Bytes::from_static(b"sig");

        let mut bytes = data.to_bytes();
        let el = Element::read(&mut bytes).unwrap();
        assert_eq!(el.typ, TLV_DATA);

        let decoded = Data::decode_value(el.value).unwrap();
        assert_eq!(decoded.name, data.name);
        assert_eq!(decoded.meta_info, data.meta_info);
        assert_eq!(decoded.content.as_ref(), b"hello");
        assert_eq!(decoded.signature_info, data.signature_info);
        assert_eq!(decoded.signature_value.as_ref(), b"sig");
    }

    fn component(b: &'static [u8]) -> ExcludeEntry {
        ExcludeEntry::Component(Bytes::from_static(b))
    }

    #[test]
    fn test_exclude_exact() {
        let exclude = Exclude {
            entries: vec![component(b"b"), component(b"d")],
        };
        assert!(exclude.is_excluded(b"b"));
        assert!(exclude.is_excluded(b"d"));
        assert!(!exclude.is_excluded(b"a"));
        assert!(!exclude.is_excluded(b"c"));
    }

    #[test]
    fn test_exclude_range() {
        // b <= x <= e 제외
        let exclude = Exclude {
            entries: vec![component(b"b"), ExcludeEntry::Any, component(b"e")],
        };
        assert!(exclude.is_excluded(b"b"));
        assert!(exclude.is_excluded(b"c"));
        assert!(exclude.is_excluded(b"e"));
        assert!(!exclude.is_excluded(b"a"));
        assert!(!exclude.is_excluded(b"f"));
    }

    #[test]
    fn test_exclude_open_ranges() {
        // x <= c 제외
        let exclude = Exclude {
            entries: vec![ExcludeEntry::Any, component(b"c")],
        };
        assert!(exclude.is_excluded(b"a"));
        assert!(exclude.is_excluded(b"c"));
        assert!(!exclude.is_excluded(b"d"));

        // x >= c 제외
        let exclude = Exclude {
            entries: vec![component(b"c"), ExcludeEntry::Any],
        };
        assert!(exclude.is_excluded(b"c"));
        assert!(exclude.is_excluded(b"z"));
        assert!(!exclude.is_excluded(b"a"));

        // 전부 제외
        let exclude = Exclude {
            entries: vec![ExcludeEntry::Any],
        };
        assert!(exclude.is_excluded(b"anything"));
    }

    #[test]
    fn test_exclude_roundtrip() {
        let exclude = Exclude {
            entries: vec![component(b"b"), ExcludeEntry::Any, component(b"e")],
        };
        let decoded = Exclude::decode_value(exclude.encode_value()).unwrap();
        assert_eq!(decoded, exclude);
    }

    fn data_with_locator() -> Data {
        let mut data = Data::new(Name::from_uri("/a/b/c"), Bytes::from_static(b"x"));
        data.signature_info.key_locator.name = Name::from_uri("/publisher/key");
        data.signature_info.key_locator.digest = Bytes::from_static(b"digest01");
        data
    }

    #[test]
    fn test_selectors_suffix_bounds() {
        let data = data_with_locator();

        let mut sel = Selectors::default();
        assert!(sel.matches(&data, 2));

        sel.min_suffix_components = 3;
        assert!(!sel.matches(&data, 2));
        assert!(sel.matches(&data, 3));

        sel.min_suffix_components = 0;
        sel.max_suffix_components = 1;
        assert!(!sel.matches(&data, 2));
        assert!(sel.matches(&data, 1));
    }

    #[test]
    fn test_selectors_publisher_locator() {
        let data = data_with_locator();

        let mut sel = Selectors::default();
        sel.publisher_public_key_locator.name = Name::from_uri("/publisher/key");
        assert!(sel.matches(&data, 1));

        sel.publisher_public_key_locator.name = Name::from_uri("/other/key");
        assert!(!sel.matches(&data, 1));

        let mut sel = Selectors::default();
        sel.publisher_public_key_locator.digest = Bytes::from_static(b"digest01");
        assert!(sel.matches(&data, 1));

        sel.publisher_public_key_locator.digest = Bytes::from_static(b"digest02");
        assert!(!sel.matches(&data, 1));
    }

    #[test]
    fn test_selectors_exclude() {
        let data = data_with_locator();

        // suffix_len=1이면 마지막 컴포넌트 "c"가 검사 대상
        let mut sel = Selectors::default();
        sel.exclude.entries.push(component(b"c"));
        assert!(!sel.matches(&data, 1));

        // suffix_len=2면 "b"가 검사 대상
        assert!(sel.matches(&data, 2));

        // suffix_len=0이면 제외 검사 없음
        assert!(sel.matches(&data, 0));

        // 이름 길이를 넘는 서픽스는 검사할 컴포넌트 없음
        assert!(sel.matches(&data, 4));
    }
}
