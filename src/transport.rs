//! 데이터그램 전송
//!
//! 패킷 하나 = 데이터그램 하나. 분할 없음.
//! 최대 프레임 크기를 넘는 패킷은 전송 전에 거부함.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::debug;

use crate::packet::Packet;
use crate::Result;

/// 패킷 단위 UDP 소켓
#[derive(Debug)]
pub struct Transport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    max_frame_size: usize,
}

impl Transport {
    /// 소켓 바인딩
    pub async fn bind(addr: SocketAddr, max_frame_size: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Self::from_socket(socket, max_frame_size)
    }

    /// 이미 바인딩된 소켓 사용
    pub fn from_socket(socket: UdpSocket, max_frame_size: usize) -> Result<Self> {
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            max_frame_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// 패킷 인코딩 후 데이터그램 하나로 전송
    ///
    /// 프레임이 최대 크기를 넘으면 아무것도 보내지 않고 `FrameTooLarge`.
    pub async fn send(&self, packet: &Packet, dest: SocketAddr) -> Result<usize> {
        let bytes = packet.encode_within(self.max_frame_size)?;
        let sent = self.socket.send_to(&bytes, dest).await?;
        Ok(sent)
    }

    /// 데이터그램 하나 수신 후 디코딩
    ///
    /// 최대 프레임 크기만큼만 읽음. 디코딩 실패는 `MalformedFrame`.
    pub async fn receive(&self) -> Result<(Packet, SocketAddr)> {
        let mut buf = vec![0u8; self.max_frame_size];
        let (len, addr) = self.socket.recv_from(&mut buf).await?;

        match Packet::decode(&buf[..len]) {
            Ok(packet) => Ok((packet, addr)),
            Err(e) => {
                debug!("잘못된 프레임: from={}, {} bytes", addr, len);
                Err(e)
            }
        }
    }
}
