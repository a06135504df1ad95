//! 전달 기록 저장소
//!
//! 시퀀싱 버퍼가 순서대로 전달한 패킷을 기록하는 외부 협력자.
//! 버퍼는 [`DeliveryStore`] 트레이트만 알고, 실제 저장 방식은 모름.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::packet::{now_millis, SequenceNum};
use crate::StorageError;

/// 전달 기록 인터페이스
///
/// 시퀀스 번호당 정확히 한번, 증가하는 순서로 호출됨.
pub trait DeliveryStore {
    fn record_delivery(
        &self,
        sequence_id: SequenceNum,
        sent_at: i64,
        retry_count: u32,
        was_retried: bool,
    ) -> Result<(), StorageError>;
}

impl<S: DeliveryStore + ?Sized> DeliveryStore for Box<S> {
    fn record_delivery(
        &self,
        sequence_id: SequenceNum,
        sent_at: i64,
        retry_count: u32,
        was_retried: bool,
    ) -> Result<(), StorageError> {
        (**self).record_delivery(sequence_id, sent_at, retry_count, was_retried)
    }
}

impl<S: DeliveryStore + ?Sized> DeliveryStore for Arc<S> {
    fn record_delivery(
        &self,
        sequence_id: SequenceNum,
        sent_at: i64,
        retry_count: u32,
        was_retried: bool,
    ) -> Result<(), StorageError> {
        (**self).record_delivery(sequence_id, sent_at, retry_count, was_retried)
    }
}

/// 저장되는 전달 기록 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub packet_id: SequenceNum,

    /// 송신 시각 (밀리초)
    pub timestamp_sent: i64,

    /// 기록 시각 (밀리초)
    pub timestamp_received: i64,

    pub retried: bool,

    pub retry_count: u32,
}

impl DeliveryRecord {
    /// 수신 시각을 지금으로 찍어서 기록 생성
    pub fn received_now(
        packet_id: SequenceNum,
        timestamp_sent: i64,
        retry_count: u32,
        retried: bool,
    ) -> Self {
        Self {
            packet_id,
            timestamp_sent,
            timestamp_received: now_millis(),
            retried,
            retry_count,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<DeliveryRecord>,
    failing: HashSet<SequenceNum>,
}

/// 메모리 저장소
///
/// 복제해도 같은 기록을 공유함 (서버에 넘긴 뒤에도 테스트에서 조회 가능).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지정한 시퀀스 번호의 기록을 실패시킴
    pub fn fail_on(&self, sequence_id: SequenceNum) {
        self.inner.lock().failing.insert(sequence_id);
    }

    /// 호출 순서대로 저장된 기록
    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.inner.lock().records.clone()
    }

    /// 저장된 시퀀스 번호 목록
    pub fn sequence_ids(&self) -> Vec<SequenceNum> {
        self.inner.lock().records.iter().map(|r| r.packet_id).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeliveryStore for MemoryStore {
    fn record_delivery(
        &self,
        sequence_id: SequenceNum,
        sent_at: i64,
        retry_count: u32,
        was_retried: bool,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if inner.failing.contains(&sequence_id) {
            return Err(StorageError::Unavailable(format!(
                "seq={} 기록 실패 (주입됨)",
                sequence_id
            )));
        }

        inner.records.push(DeliveryRecord::received_now(
            sequence_id,
            sent_at,
            retry_count,
            was_retried,
        ));
        Ok(())
    }
}

/// JSON lines 파일 저장소 (한 줄에 기록 하나, append-only)
///
/// 버퍼 없이 기록마다 한 줄을 한번에 씀. 실패한 기록이 남아 있다가
/// 다음 기록과 함께 파일에 들어가는 일은 없음.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesStore {
    /// 파일 열기 (없으면 상위 디렉터리까지 생성)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("전달 기록 파일 열림: {:?}", path);

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일에 저장된 모든 기록 읽기
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<DeliveryRecord>, StorageError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }
}

impl DeliveryStore for JsonLinesStore {
    fn record_delivery(
        &self,
        sequence_id: SequenceNum,
        sent_at: i64,
        retry_count: u32,
        was_retried: bool,
    ) -> Result<(), StorageError> {
        let record = DeliveryRecord::received_now(sequence_id, sent_at, retry_count, was_retried);
        append_line(&mut *self.file.lock(), &record)
    }
}

/// 기록 하나를 개행 포함 한 줄로 직렬화해서 쓰기
fn append_line<W: Write>(writer: &mut W, record: &DeliveryRecord) -> Result<(), StorageError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}
