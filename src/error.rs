//! 에러 타입 정의

use thiserror::Error;

/// RUDP 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    /// 소켓 송수신 실패 (TransportError)
    #[error("전송 에러: {0}")]
    Transport(#[from] std::io::Error),

    /// 수신한 데이터그램을 패킷으로 해석할 수 없음
    #[error("잘못된 프레임: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// 인코딩된 프레임이 최대 크기를 넘음 (전송 거부)
    #[error("프레임 크기 초과: {size} bytes (최대 {max_size} bytes)")]
    FrameTooLarge { size: usize, max_size: usize },

    #[error("저장소 에러: {0}")]
    Storage(#[from] StorageError),

    /// u32 시퀀스 공간 소진
    #[error("시퀀스 번호 소진")]
    SequenceExhausted,
}

/// 영속 계층 에러
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("저장소 IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("레코드 직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
