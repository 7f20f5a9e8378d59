//! Face 단위 전송 통계

use std::sync::atomic::{AtomicU64, Ordering};

/// Face 내부 카운터 (원자적 갱신)
#[derive(Debug, Default)]
pub struct FaceStats {
    interests_sent: AtomicU64,
    interests_aggregated: AtomicU64,
    interests_received: AtomicU64,
    data_sent: AtomicU64,
    data_received: AtomicU64,
    data_delivered: AtomicU64,
    cs_hits: AtomicU64,
    timeouts: AtomicU64,
}

impl FaceStats {
    pub(crate) fn record_interest_sent(&self) {
        self.interests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interest_aggregated(&self) {
        self.interests_aggregated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interest_received(&self) {
        self.interests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_data_sent(&self) {
        self.data_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_data_received(&self) {
        self.data_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_data_delivered(&self) {
        self.data_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cs_hit(&self) {
        self.cs_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// 현재 값 스냅샷
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            interests_sent: self.interests_sent.load(Ordering::Relaxed),
            interests_aggregated: self.interests_aggregated.load(Ordering::Relaxed),
            interests_received: self.interests_received.load(Ordering::Relaxed),
            data_sent: self.data_sent.load(Ordering::Relaxed),
            data_received: self.data_received.load(Ordering::Relaxed),
            data_delivered: self.data_delivered.load(Ordering::Relaxed),
            cs_hits: self.cs_hits.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// 통계 스냅샷
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    /// 트랜스포트로 전송된 인터레스트 수
    pub interests_sent: u64,

    /// 기존 PIT 엔트리에 합쳐진 인터레스트 수
    pub interests_aggregated: u64,

    /// 수신된 인바운드 인터레스트 수
    pub interests_received: u64,

    /// 전송한 데이터 패킷 수
    pub data_sent: u64,

    /// 수신한 데이터 패킷 수
    pub data_received: u64,

    /// 대기자에게 전달된 데이터 수
    pub data_delivered: u64,

    /// 콘텐츠 스토어 적중 수
    pub cs_hits: u64,

    /// 수명 만료로 닫힌 대기자 수
    pub timeouts: u64,
}

impl StatsSnapshot {
    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Interests: {} sent, {} aggregated, {} recv | Data: {} sent, {} recv, {} delivered | CS hits: {} | Timeouts: {}",
            self.interests_sent,
            self.interests_aggregated,
            self.interests_received,
            self.data_sent,
            self.data_received,
            self.data_delivered,
            self.cs_hits,
            self.timeouts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = FaceStats::default();
        stats.record_interest_sent();
        stats.record_interest_sent();
        stats.record_interest_aggregated();
        stats.record_cs_hit();
        stats.record_timeout();

        let snap = stats.snapshot();
        assert_eq!(snap.interests_sent, 2);
        assert_eq!(snap.interests_aggregated, 1);
        assert_eq!(snap.cs_hits, 1);
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.data_received, 0);

        let summary = snap.summary();
        assert!(summary.contains("2 sent"));
        assert!(summary.contains("Timeouts: 1"));
    }
}
