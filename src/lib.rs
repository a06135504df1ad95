//! # RUDP (Reliable UDP)
//!
//! UDP 위에 순서 보장 전달 계층을 얹은 프로토콜
//!
//! ## 핵심 특징
//! - **시퀀스 패킷**: 모든 데이터는 0부터 증가하는 시퀀스 번호를 가진 패킷으로 전송
//! - **재정렬 버퍼**: 순서가 뒤바뀐 패킷을 보관했다가 연속 구간이 되면 한번에 전달
//! - **중복 제거**: 이미 전달된 시퀀스 번호는 버림 (저장소는 번호당 한번만 호출됨)
//! - **ACK**: 수신한 모든 데이터 패킷에 대해 같은 시퀀스 번호로 ACK 응답
//! - **JSON 와이어 포맷**: 기존 배포본과 바이트 단위로 호환되는 512바이트 이하 프레임
//!
//! 재전송 타이머와 혼잡 제어는 없음. `retry_count` 는 기록만 되는 필드.

pub mod ack;
pub mod config;
pub mod error;
pub mod packet;
pub mod sender;
pub mod sequencer;
pub mod server;
pub mod stats;
pub mod store;
pub mod transport;

pub use ack::AckEmitter;
pub use config::Config;
pub use error::{Error, Result, StorageError};
pub use packet::{Packet, SequenceNum};
pub use sender::Sender;
pub use sequencer::{Arrival, Outcome, SequencingBuffer};
pub use server::Server;
pub use stats::{ServerStats, StreamStats};
pub use store::{DeliveryRecord, DeliveryStore, JsonLinesStore, MemoryStore};
pub use transport::Transport;

/// 최대 프레임 크기 (인코딩된 패킷 전체, 바이트)
pub const MAX_FRAME_SIZE: usize = 512;

/// 기본 UDP 포트
pub const DEFAULT_PORT: u16 = 8080;
