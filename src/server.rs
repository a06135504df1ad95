//! 수신 서버
//!
//! 소켓 하나당 순차 수신 루프 하나:
//! 수신 → 디코딩 → 피어별 시퀀싱 버퍼 → 저장소 전달 → ACK
//! 한 반복이 끝나야 다음 데이터그램을 읽음. 에러는 로그만 남기고 계속.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;

use tracing::{debug, info, warn};

use crate::ack::AckEmitter;
use crate::packet::Packet;
use crate::sequencer::{Outcome, SequencingBuffer};
use crate::stats::{ServerStats, StreamStats};
use crate::store::DeliveryStore;
use crate::transport::Transport;
use crate::{Config, Error, Result};

/// 피어 하나의 스트림 상태
struct PeerStream {
    buffer: SequencingBuffer,
    stats: StreamStats,
}

impl PeerStream {
    fn new() -> Self {
        Self {
            buffer: SequencingBuffer::new(),
            stats: StreamStats::new(),
        }
    }
}

/// RUDP 수신 서버
pub struct Server<S> {
    config: Config,
    transport: Transport,
    store: S,
    streams: HashMap<SocketAddr, PeerStream>,
    stats: ServerStats,
}

impl<S: DeliveryStore> Server<S> {
    /// 소켓 바인딩 후 서버 생성 (바인딩 실패는 치명적)
    pub async fn bind(config: Config, store: S) -> Result<Self> {
        let transport = Transport::bind(config.bind_addr, config.max_frame_size).await?;
        info!("RUDP Server listening on {}", transport.local_addr());
        Ok(Self::with_transport(config, transport, store))
    }

    pub fn with_transport(config: Config, transport: Transport, store: S) -> Self {
        Self {
            config,
            transport,
            store,
            streams: HashMap::new(),
            stats: ServerStats::new(),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn stream_stats(&self, peer: &SocketAddr) -> Option<&StreamStats> {
        self.streams.get(peer).map(|s| &s.stats)
    }

    /// 피어 스트림의 다음 기대 번호
    pub fn expected(&self, peer: &SocketAddr) -> Option<u64> {
        self.streams.get(peer).map(|s| s.buffer.expected())
    }

    pub fn peer_count(&self) -> usize {
        self.streams.len()
    }

    /// 수신 루프 (반환하지 않음)
    pub async fn run(&mut self) {
        loop {
            let result = self.transport.receive().await;
            self.on_receive(result).await;
        }
    }

    /// `shutdown` 이 완료될 때까지 수신 루프 실행
    pub async fn run_until<F: Future>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("종료 요청 수신");
                    break;
                }
                result = self.transport.receive() => {
                    self.on_receive(result).await;
                }
            }
        }

        self.log_summary();
    }

    async fn on_receive(&mut self, result: Result<(Packet, SocketAddr)>) {
        match result {
            Ok((packet, peer)) => {
                self.handle(packet, peer).await;
            }
            Err(Error::MalformedFrame(e)) => {
                self.stats.malformed += 1;
                warn!("잘못된 프레임 버림: {}", e);
            }
            Err(e) => {
                self.stats.transport_errors += 1;
                warn!("수신 에러: {}", e);
            }
        }
    }

    /// 패킷 하나 처리 (시퀀싱, 전달, ACK)
    ///
    /// ACK 패킷이거나 피어 수 제한으로 버린 경우 None.
    pub async fn handle(&mut self, packet: Packet, peer: SocketAddr) -> Option<Outcome> {
        let seq = packet.sequence_num();

        if packet.is_ack() {
            self.stats.ignored_acks += 1;
            debug!("ACK 패킷 무시: seq={}, from={}", seq, peer);
            return None;
        }

        if !self.streams.contains_key(&peer) {
            if self.streams.len() >= self.config.max_peers {
                self.stats.rejected_peers += 1;
                warn!(
                    "피어 수 제한({}) 초과, 패킷 버림: peer={}, seq={}",
                    self.config.max_peers, peer, seq
                );
                return None;
            }
            info!("새 스트림: {}", peer);
        }

        let stream = self.streams.entry(peer).or_insert_with(PeerStream::new);

        debug!("패킷 수신: seq={}, from={}, {} bytes", seq, peer, packet.data().len());
        let outcome = stream.buffer.accept(packet, &self.store);
        stream.stats.record_outcome(&outcome);

        for delivered in &outcome.delivered {
            info!("패킷 전달: peer={}, seq={}", peer, delivered);
        }

        if AckEmitter::emit(&self.transport, seq, peer).await.is_err() {
            stream.stats.record_ack_failure();
        }

        Some(outcome)
    }

    /// 통계 로그
    pub fn log_summary(&self) {
        info!("{}", self.stats.summary());
        for (peer, stream) in &self.streams {
            info!(
                "[{}] expected={} pending={} idle={:.1}s | {}",
                peer,
                stream.buffer.expected(),
                stream.buffer.pending_len(),
                stream.stats.idle().as_secs_f64(),
                stream.stats.summary()
            );
        }
    }
}
