//! 프로토콜 설정

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::{DEFAULT_PORT, MAX_FRAME_SIZE};

/// RUDP 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 바인드 주소
    pub bind_addr: SocketAddr,

    /// 클라이언트가 보낼 서버 주소
    pub server_addr: SocketAddr,

    /// 최대 프레임 크기 (바이트)
    /// 수신 버퍼도 정확히 이 크기 (초과 데이터그램은 잘려서 디코딩 실패)
    pub max_frame_size: usize,

    /// 클라이언트 송신 주기 (밀리초)
    pub send_interval_ms: u64,

    /// 전달 기록 파일 경로 (None 이면 메모리 저장소)
    pub store_path: Option<PathBuf>,

    /// 동시에 추적할 최대 피어 수
    /// 초과한 새 피어의 패킷은 버림
    pub max_peers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            server_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            max_frame_size: MAX_FRAME_SIZE,
            send_interval_ms: 5000, // 5초
            store_path: None,
            max_peers: 1024,
        }
    }
}

impl Config {
    /// 송신 주기
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    /// 루프백 전용 설정 (OS 가 포트 할당, 짧은 송신 주기)
    pub fn loopback() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            send_interval_ms: 10,
            max_peers: 16,
            ..Self::default()
        }
    }

    /// 전달 기록 파일 지정
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.server_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_frame_size, 512);
        assert_eq!(config.send_interval(), Duration::from_secs(5));
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_loopback_config() {
        let config = Config::loopback().with_store_path("/tmp/rudp.jsonl");

        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(config.bind_addr.port(), 0);
        assert_eq!(config.max_frame_size, MAX_FRAME_SIZE);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/rudp.jsonl")));
    }
}
