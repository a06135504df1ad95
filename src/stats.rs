//! 수신 통계

use std::time::{Duration, Instant};

use crate::sequencer::{Arrival, Outcome};

/// 피어(스트림)별 통계
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// 수신한 데이터 패킷 수
    pub received: u64,

    /// 저장소로 전달된 패킷 수 (기록 실패 포함)
    pub delivered: u64,

    /// 순서가 어긋나 보관된 횟수
    pub buffered: u64,

    /// 중복으로 버려진 패킷 수
    pub duplicates: u64,

    /// 저장소 기록 실패 수
    pub storage_failures: u64,

    /// ACK 전송 실패 수
    pub ack_failures: u64,

    /// 마지막 수신 시간
    pub last_seen: Instant,
}

impl StreamStats {
    pub fn new() -> Self {
        Self {
            received: 0,
            delivered: 0,
            buffered: 0,
            duplicates: 0,
            storage_failures: 0,
            ack_failures: 0,
            last_seen: Instant::now(),
        }
    }

    /// 시퀀싱 결과 반영
    pub fn record_outcome(&mut self, outcome: &Outcome) {
        self.received += 1;
        self.last_seen = Instant::now();

        match outcome.arrival {
            Arrival::Delivered { count } => self.delivered += count as u64,
            Arrival::Buffered => self.buffered += 1,
            Arrival::Duplicate => self.duplicates += 1,
        }
        self.storage_failures += outcome.failures.len() as u64;
    }

    pub fn record_ack_failure(&mut self) {
        self.ack_failures += 1;
    }

    /// 마지막 수신 이후 경과 시간
    pub fn idle(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// 중복률
    pub fn duplicate_rate(&self) -> f64 {
        if self.received == 0 {
            return 0.0;
        }
        self.duplicates as f64 / self.received as f64
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Received: {} | Delivered: {} | Buffered: {} | Duplicates: {} ({:.1}%) | Storage failures: {} | ACK failures: {}",
            self.received,
            self.delivered,
            self.buffered,
            self.duplicates,
            self.duplicate_rate() * 100.0,
            self.storage_failures,
            self.ack_failures,
        )
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 서버 전체 통계
#[derive(Debug, Clone)]
pub struct ServerStats {
    /// 시작 시간
    pub start_time: Instant,

    /// 디코딩 실패한 데이터그램 수
    pub malformed: u64,

    /// 소켓 수신 에러 수
    pub transport_errors: u64,

    /// 수신한 ACK 패킷 수 (무시됨)
    pub ignored_acks: u64,

    /// 피어 수 제한으로 버린 패킷 수
    pub rejected_peers: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            malformed: 0,
            transport_errors: 0,
            ignored_acks: 0,
            rejected_peers: 0,
        }
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn summary(&self) -> String {
        format!(
            "Elapsed: {:.2}s | Malformed: {} | Transport errors: {} | Ignored ACKs: {} | Rejected: {}",
            self.elapsed().as_secs_f64(),
            self.malformed,
            self.transport_errors,
            self.ignored_acks,
            self.rejected_peers,
        )
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
