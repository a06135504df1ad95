//! 시퀀싱 버퍼 (재정렬 / 중복 제거)
//!
//! - 기대 번호와 같으면 즉시 전달 후 보관 중인 연속 구간을 전달 (drain)
//! - 기대 번호보다 크면 보관 (같은 번호는 나중에 도착한 패킷이 덮어씀)
//! - 기대 번호보다 작으면 이미 전달된 것이므로 버림
//!
//! 저장소는 항상 번호 순서대로, 빈틈 없이, 중복 없이 호출됨.
//! 단일 태스크에서만 접근 (내부 잠금 없음). 피어마다 인스턴스 하나.
//!
//! 보관분(`pending`)에는 상한이 없음. 재전송이 없으므로 데이터그램 하나가
//! 유실되면 그 피어의 이후 패킷은 모두 보관된 채로 남음. 피어 수 상한은
//! `Config::max_peers` 가 담당.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::packet::{Packet, SequenceNum};
use crate::store::DeliveryStore;
use crate::StorageError;

/// 도착한 패킷의 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// 기대 번호와 일치, 보관분 포함 `count` 개 전달됨
    Delivered { count: usize },

    /// 앞선 번호가 아직 없어서 보관됨
    Buffered,

    /// 이미 전달된 번호
    Duplicate,
}

/// 패킷 하나 처리 결과
#[derive(Debug)]
pub struct Outcome {
    pub arrival: Arrival,

    /// 이번에 전달된 시퀀스 번호 (전달 순서)
    pub delivered: Vec<SequenceNum>,

    /// 저장소 기록에 실패한 번호 (시퀀싱은 그대로 진행됨)
    pub failures: Vec<(SequenceNum, StorageError)>,
}

/// 스트림 하나의 재정렬 상태
#[derive(Debug, Default)]
pub struct SequencingBuffer {
    /// 아직 전달할 수 없는 미래 패킷
    pending: HashMap<SequenceNum, Packet>,

    /// 다음에 전달할 번호
    ///
    /// u32::MAX 까지 전달한 뒤에도 중복 판정이 유지되도록 u64 로 보관.
    expected: u64,
}

impl SequencingBuffer {
    /// 새 버퍼 (기대 번호 0)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// 보관 중인 패킷 수
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, sequence_num: SequenceNum) -> bool {
        self.pending.contains_key(&sequence_num)
    }

    /// 데이터 패킷 처리
    ///
    /// ACK 패킷은 호출자가 걸러야 함.
    pub fn accept<S: DeliveryStore + ?Sized>(&mut self, packet: Packet, store: &S) -> Outcome {
        let seq = packet.sequence_num();
        let mut outcome = Outcome {
            arrival: Arrival::Duplicate,
            delivered: Vec::new(),
            failures: Vec::new(),
        };

        let position = u64::from(seq);
        if position < self.expected {
            debug!("중복 패킷 버림: seq={}, expected={}", seq, self.expected);
            return outcome;
        }

        if position > self.expected {
            if self.pending.insert(seq, packet).is_some() {
                debug!("보관 패킷 교체: seq={}", seq);
            } else {
                debug!("패킷 보관: seq={}, expected={}", seq, self.expected);
            }
            outcome.arrival = Arrival::Buffered;
            return outcome;
        }

        self.deliver(packet, store, &mut outcome);
        self.drain(store, &mut outcome);

        outcome.arrival = Arrival::Delivered {
            count: outcome.delivered.len(),
        };
        outcome
    }

    /// 기대 번호와 연속인 보관 패킷을 모두 전달
    fn drain<S: DeliveryStore + ?Sized>(&mut self, store: &S, outcome: &mut Outcome) {
        while let Some(next) = self.next_pending() {
            self.deliver(next, store, outcome);
        }
    }

    fn next_pending(&mut self) -> Option<Packet> {
        let seq = SequenceNum::try_from(self.expected).ok()?;
        self.pending.remove(&seq)
    }

    /// 저장소에 기록하고 기대 번호 증가 (기록 실패여도 증가)
    fn deliver<S: DeliveryStore + ?Sized>(&mut self, packet: Packet, store: &S, outcome: &mut Outcome) {
        let seq = packet.sequence_num();

        if let Err(e) = store.record_delivery(
            seq,
            packet.timestamp_sent(),
            packet.retry_count(),
            packet.was_retried(),
        ) {
            warn!("전달 기록 실패 (시퀀싱은 계속): seq={}, {}", seq, e);
            outcome.failures.push((seq, e));
        }

        outcome.delivered.push(seq);
        self.expected += 1;
    }
}
