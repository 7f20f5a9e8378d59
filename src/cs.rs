//! 콘텐츠 스토어 (최근 데이터 패킷의 정확 일치 캐시)
//!
//! 저장만 담당한다. TTL 축출은 삽입한 쪽이 FreshnessPeriod 뒤에
//! remove를 예약하는 방식으로 구동된다.

use dashmap::DashMap;

use crate::name::Name;
use crate::packet::Data;

/// 프로세스 내 공유 캐시. 여러 Face가 Arc로 공유한다.
#[derive(Default)]
pub struct ContentStore {
    entries: DashMap<Name, Data>,
}

impl ContentStore {
    /// 빈 캐시 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 정확한 이름으로 조회
    pub fn lookup(&self, name: &Name) -> Option<Data> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    /// 무조건 삽입 (기존 엔트리 교체 허용)
    ///
    /// 호출자는 중복 축출 타이머를 피하기 위해 lookup 후 add하는
    /// 관용구를 쓴다
    pub fn add(&self, name: Name, data: Data) {
        self.entries.insert(name, data);
    }

    /// 엔트리 삭제
    pub fn remove(&self, name: &Name) {
        self.entries.remove(name);
    }

    /// 캐시된 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있으면 true
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_lookup_add_remove() {
        let cs = ContentStore::new();
        let name = Name::from_uri("/cached");

        assert!(cs.lookup(&name).is_none());

        cs.add(name.clone(), Data::new(name.clone(), Bytes::from_static(b"v1")));
        assert_eq!(cs.lookup(&name).unwrap().content.as_ref(), b"v1");
        assert_eq!(cs.len(), 1);

        // 같은 이름 재삽입은 교체
        cs.add(name.clone(), Data::new(name.clone(), Bytes::from_static(b"v2")));
        assert_eq!(cs.lookup(&name).unwrap().content.as_ref(), b"v2");
        assert_eq!(cs.len(), 1);

        cs.remove(&name);
        assert!(cs.lookup(&name).is_none());
        assert!(cs.is_empty());
    }

    #[test]
    fn test_exact_match_only() {
        let cs = ContentStore::new();
        let name = Name::from_uri("/a/b");
        cs.add(name.clone(), Data::new(name, Bytes::new()));

        assert!(cs.lookup(&Name::from_uri("/a")).is_none());
        assert!(cs.lookup(&Name::from_uri("/a/b/c")).is_none());
    }
}
