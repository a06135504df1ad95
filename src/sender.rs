//! 송신자 (클라이언트측)
//!
//! - 0부터 순서대로 시퀀스 번호 부여
//! - 패킷당 데이터그램 하나
//! - ACK 는 정보용으로만 수신 (재전송 없음)

use std::net::{Ipv4Addr, SocketAddr};

use tracing::{debug, info};

use crate::packet::{Packet, SequenceNum};
use crate::transport::Transport;
use crate::{Config, Error, Result};

/// 송신자
pub struct Sender {
    transport: Transport,
    server_addr: SocketAddr,

    /// 다음 시퀀스 번호 (None 이면 소진)
    next_sequence: Option<SequenceNum>,
}

impl Sender {
    /// 임시 포트로 소켓을 열고 `config.server_addr` 을 대상으로 설정
    pub async fn connect(config: &Config) -> Result<Self> {
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
        let transport = Transport::bind(bind_addr, config.max_frame_size).await?;
        info!(
            "RUDP Sender started on {}, server: {}",
            transport.local_addr(),
            config.server_addr
        );
        Ok(Self::with_transport(transport, config.server_addr))
    }

    pub fn with_transport(transport: Transport, server_addr: SocketAddr) -> Self {
        Self {
            transport,
            server_addr,
            next_sequence: Some(0),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// 다음에 부여할 시퀀스 번호
    pub fn next_sequence(&self) -> Option<SequenceNum> {
        self.next_sequence
    }

    /// 데이터 전송 후 부여된 시퀀스 번호 반환
    ///
    /// 프레임 크기 초과로 거부되면 번호를 소모하지 않음.
    /// 소켓 전송 실패는 유실로 간주하고 번호를 소모함.
    pub async fn send(&mut self, data: Vec<u8>) -> Result<SequenceNum> {
        let seq = self.next_sequence.ok_or(Error::SequenceExhausted)?;
        let packet = Packet::try_new(seq, data, 0, self.transport.max_frame_size())?;

        self.next_sequence = seq.checked_add(1);
        self.transport.send(&packet, self.server_addr).await?;

        debug!("패킷 전송: seq={}, {} bytes", seq, packet.data().len());
        Ok(seq)
    }

    /// 다음 ACK 의 시퀀스 번호 수신 (ACK 가 아닌 패킷은 건너뜀)
    pub async fn recv_ack(&self) -> Result<SequenceNum> {
        loop {
            let (packet, from) = self.transport.receive().await?;
            if packet.is_ack() {
                return Ok(packet.sequence_num());
            }
            debug!("ACK 아닌 패킷 무시: seq={}, from={}", packet.sequence_num(), from);
        }
    }
}
