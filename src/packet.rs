//! 패킷 정의와 코덱
//!
//! 와이어 포맷은 다섯 개의 이름 있는 필드를 가진 JSON 객체:
//!
//! ```text
//! {"sequence_num":0,"ack":false,"data":"SGk=","retry_count":0,"timestamp_sent":1700000000000}
//! ```
//!
//! - `data` 는 패딩 포함 표준 base64 문자열 (`null` 은 빈 데이터로 해석)
//! - 필드 순서는 디코딩에 영향 없음
//! - 인코딩된 프레임 전체가 최대 프레임 크기 이하여야 전송 가능

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// 시퀀스 번호 (스트림별로 0부터 증가)
pub type SequenceNum = u32;

/// 데이터그램 하나에 담기는 패킷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    sequence_num: SequenceNum,
    ack: bool,
    #[serde(with = "base64_data")]
    data: Vec<u8>,
    retry_count: u32,
    /// 송신 시각 (Unix epoch 기준 밀리초)
    timestamp_sent: i64,
}

impl Packet {
    /// 새 데이터 패킷 생성 (송신 시각은 현재 시각)
    pub fn new(sequence_num: SequenceNum, data: Vec<u8>, retry_count: u32) -> Self {
        Self::with_timestamp(sequence_num, data, retry_count, now_millis())
    }

    /// 송신 시각을 지정해서 데이터 패킷 생성
    pub fn with_timestamp(
        sequence_num: SequenceNum,
        data: Vec<u8>,
        retry_count: u32,
        timestamp_sent: i64,
    ) -> Self {
        Self {
            sequence_num,
            ack: false,
            data,
            retry_count,
            timestamp_sent,
        }
    }

    /// 최대 프레임 크기를 검사하면서 데이터 패킷 생성
    pub fn try_new(
        sequence_num: SequenceNum,
        data: Vec<u8>,
        retry_count: u32,
        max_frame_size: usize,
    ) -> Result<Self> {
        let packet = Self::new(sequence_num, data, retry_count);
        let size = packet.encoded_len();
        if size > max_frame_size {
            return Err(Error::FrameTooLarge {
                size,
                max_size: max_frame_size,
            });
        }
        Ok(packet)
    }

    /// `sequence_num` 에 대한 ACK 패킷 생성
    pub fn ack(sequence_num: SequenceNum) -> Self {
        Self::new(sequence_num, Vec::new(), 0).into_ack()
    }

    /// ACK 로 전환 (데이터는 비움)
    fn into_ack(mut self) -> Self {
        self.ack = true;
        self.data.clear();
        self
    }

    pub fn sequence_num(&self) -> SequenceNum {
        self.sequence_num
    }

    pub fn is_ack(&self) -> bool {
        self.ack
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// 재전송된 패킷인지 (`retry_count > 0`)
    pub fn was_retried(&self) -> bool {
        self.retry_count > 0
    }

    pub fn timestamp_sent(&self) -> i64 {
        self.timestamp_sent
    }

    /// 바이트로 직렬화
    pub fn encode(&self) -> Vec<u8> {
        // 필드가 모두 기본 타입이라 직렬화는 실패하지 않음
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// 최대 프레임 크기 검사 후 직렬화
    pub fn encode_within(&self, max_frame_size: usize) -> Result<Vec<u8>> {
        let bytes = self.encode();
        if bytes.len() > max_frame_size {
            return Err(Error::FrameTooLarge {
                size: bytes.len(),
                max_size: max_frame_size,
            });
        }
        Ok(bytes)
    }

    /// 인코딩된 프레임 크기
    pub fn encoded_len(&self) -> usize {
        self.encode().len()
    }

    /// 바이트에서 역직렬화
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// 현재 시각 (Unix epoch 기준 밀리초)
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// `data` 필드의 base64 문자열 표현
mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_FRAME_SIZE;

    #[test]
    fn test_packet_roundtrip() {
        let packets = [
            Packet::with_timestamp(0, b"Timestamp: 1700000000000".to_vec(), 0, 1_700_000_000_000),
            Packet::with_timestamp(u32::MAX, vec![0, 255, 1, 254], u32::MAX, i64::MIN),
            Packet::with_timestamp(7, Vec::new(), 3, -1),
            Packet::ack(42),
        ];

        for packet in packets {
            let restored = Packet::decode(&packet.encode()).unwrap();
            assert_eq!(packet, restored);
        }
    }

    #[test]
    fn test_encoding_matches_reference_layout() {
        let packet = Packet::with_timestamp(5, b"Hi".to_vec(), 1, 1_700_000_000_123);
        let json = String::from_utf8(packet.encode()).unwrap();

        assert_eq!(
            json,
            r#"{"sequence_num":5,"ack":false,"data":"SGk=","retry_count":1,"timestamp_sent":1700000000123}"#
        );
    }

    #[test]
    fn test_decode_reordered_fields_and_null_data() {
        let frame = br#"{"timestamp_sent":99,"retry_count":0,"data":null,"ack":true,"sequence_num":3}"#;
        let packet = Packet::decode(frame).unwrap();

        assert_eq!(packet.sequence_num(), 3);
        assert!(packet.is_ack());
        assert!(packet.data().is_empty());
        assert_eq!(packet.timestamp_sent(), 99);
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        let cases: [&[u8]; 5] = [
            // data 필드 누락
            br#"{"sequence_num":1,"ack":false,"retry_count":0,"timestamp_sent":1}"#,
            // 타입 불일치
            br#"{"sequence_num":"1","ack":false,"data":"","retry_count":0,"timestamp_sent":1}"#,
            // u32 범위 초과
            br#"{"sequence_num":4294967296,"ack":false,"data":"","retry_count":0,"timestamp_sent":1}"#,
            // 잘못된 base64
            br#"{"sequence_num":1,"ack":false,"data":"!!!","retry_count":0,"timestamp_sent":1}"#,
            b"not json",
        ];

        for frame in cases {
            assert!(matches!(Packet::decode(frame), Err(Error::MalformedFrame(_))));
        }
    }

    #[test]
    fn test_decode_rejects_truncated_frame() {
        let bytes = Packet::new(9, b"payload".to_vec(), 0).encode();
        let truncated = &bytes[..bytes.len() - 5];

        assert!(matches!(Packet::decode(truncated), Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn test_ack_packet_has_empty_data() {
        let ack = Packet::ack(11);

        assert!(ack.is_ack());
        assert_eq!(ack.sequence_num(), 11);
        assert!(ack.data().is_empty());
        assert_eq!(ack.retry_count(), 0);
        assert!(!ack.was_retried());
    }

    #[test]
    fn test_frame_size_bound() {
        // base64 로 4/3 배 커지므로 400 바이트면 512 초과
        let oversized = Packet::try_new(0, vec![7u8; 400], 0, MAX_FRAME_SIZE);
        match oversized {
            Err(Error::FrameTooLarge { size, max_size }) => {
                assert!(size > MAX_FRAME_SIZE);
                assert_eq!(max_size, MAX_FRAME_SIZE);
            }
            other => panic!("expected FrameTooLarge, got {:?}", other),
        }

        let fits = Packet::try_new(0, vec![7u8; 100], 0, MAX_FRAME_SIZE).unwrap();
        assert!(fits.encode_within(MAX_FRAME_SIZE).is_ok());
        assert!(fits.encode_within(16).is_err());
    }
}
