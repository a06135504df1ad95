//! ACK 송신
//!
//! 수신한 모든 데이터 패킷(전달/보관/중복 모두)에 같은 시퀀스 번호로 ACK.
//! 실패는 로그만 남기고 재시도하지 않음. 시퀀싱 상태와 무관.

use std::net::SocketAddr;

use tracing::{debug, warn};

use crate::packet::{Packet, SequenceNum};
use crate::transport::Transport;
use crate::Result;

/// ACK 송신기
pub struct AckEmitter;

impl AckEmitter {
    /// ACK 전송
    pub async fn emit(transport: &Transport, sequence_num: SequenceNum, dest: SocketAddr) -> Result<()> {
        let ack = Packet::ack(sequence_num);

        match transport.send(&ack, dest).await {
            Ok(_) => {
                debug!("ACK 전송: seq={}, to={}", sequence_num, dest);
                Ok(())
            }
            Err(e) => {
                warn!("ACK 전송 실패: seq={}, to={}, {}", sequence_num, dest, e);
                Err(e)
            }
        }
    }
}
