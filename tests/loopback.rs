//! 루프백 소켓으로 서버 수신 루프 전체를 검증
//!
//! 서버는 별도 tokio 태스크에서 `run_until` 로 돌고, 테스트가 원시 전송
//! 계층으로 순서를 섞은 패킷과 중복, 깨진 데이터그램을 보냄.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use rudp::store::{JsonLinesStore, MemoryStore};
use rudp::{Config, Packet, Sender, Server, Transport, MAX_FRAME_SIZE};

const ACK_TIMEOUT: Duration = Duration::from_secs(2);

async fn ephemeral() -> Transport {
    Transport::bind("127.0.0.1:0".parse().unwrap(), MAX_FRAME_SIZE)
        .await
        .expect("bind failed")
}

/// 서버를 띄우고 (주소, 종료 신호, 태스크) 반환
async fn spawn_server(
    store: MemoryStore,
) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<Server<MemoryStore>>) {
    let mut server = Server::bind(Config::loopback(), store).await.expect("server bind");
    let addr = server.local_addr();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        server
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await;
        server
    });

    (addr, stop_tx, handle)
}

async fn recv_ack(client: &Transport) -> u32 {
    let (ack, _) = tokio::time::timeout(ACK_TIMEOUT, client.receive())
        .await
        .expect("ack timeout")
        .expect("ack recv");
    assert!(ack.is_ack());
    assert!(ack.data().is_empty());
    ack.sequence_num()
}

#[tokio::test]
async fn test_reordered_stream_is_delivered_in_order() {
    let store = MemoryStore::new();
    let (server_addr, stop, handle) = spawn_server(store.clone()).await;
    let client = ephemeral().await;

    let mut acks = Vec::new();
    for seq in [2, 0, 1, 3] {
        let packet = Packet::new(seq, format!("packet {}", seq).into_bytes(), 0);
        client.send(&packet, server_addr).await.unwrap();
        // 루프가 순차적이므로 ACK 를 받은 뒤 다음 패킷을 보내면 도착 순서가 고정됨
        acks.push(recv_ack(&client).await);
    }

    assert_eq!(acks, vec![2, 0, 1, 3]);
    assert_eq!(store.sequence_ids(), vec![0, 1, 2, 3]);

    stop.send(()).unwrap();
    let server = handle.await.unwrap();
    let stats = server.stream_stats(&client.local_addr()).unwrap();
    assert_eq!(stats.received, 4);
    assert_eq!(stats.buffered, 1);
    assert_eq!(stats.delivered, 4);
    assert_eq!(server.expected(&client.local_addr()), Some(4));
}

#[tokio::test]
async fn test_duplicate_datagram_acked_but_recorded_once() {
    let store = MemoryStore::new();
    let (server_addr, stop, handle) = spawn_server(store.clone()).await;
    let client = ephemeral().await;

    let packet = Packet::new(0, b"once".to_vec(), 0);
    let frame = packet.encode();
    let other = ephemeral().await;

    // 완전히 같은 바이트를 두 번 전송 (인코딩은 결정적)
    for _ in 0..2 {
        let duplicate = Packet::decode(&frame).unwrap();
        assert_eq!(duplicate.encode(), frame);
        client.send(&duplicate, server_addr).await.unwrap();
        assert_eq!(recv_ack(&client).await, 0);
    }

    // 다른 피어는 자기 스트림을 0부터 시작
    other.send(&Packet::new(0, b"other".to_vec(), 0), server_addr).await.unwrap();
    assert_eq!(recv_ack(&other).await, 0);

    stop.send(()).unwrap();
    let server = handle.await.unwrap();

    let records = store.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].packet_id, 0);
    assert_eq!(records[0].timestamp_sent, packet.timestamp_sent());
    assert_eq!(server.stream_stats(&client.local_addr()).unwrap().duplicates, 1);
    assert_eq!(server.peer_count(), 2);
}

#[tokio::test]
async fn test_malformed_datagram_does_not_stop_loop() {
    let store = MemoryStore::new();
    let (server_addr, stop, handle) = spawn_server(store.clone()).await;
    let client = ephemeral().await;
    let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    raw.send_to(b"\x00\x01garbage", server_addr).await.unwrap();
    raw.send_to(&vec![b'{'; 2048], server_addr).await.unwrap();

    client.send(&Packet::new(0, b"after".to_vec(), 0), server_addr).await.unwrap();
    assert_eq!(recv_ack(&client).await, 0);

    stop.send(()).unwrap();
    let server = handle.await.unwrap();

    assert_eq!(store.sequence_ids(), vec![0]);
    assert_eq!(server.stats().malformed, 2);
}

#[tokio::test]
async fn test_sender_against_server_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deliveries.jsonl");

    let store = JsonLinesStore::open(&path).unwrap();
    let config = Config::loopback().with_store_path(&path);
    let mut server = Server::bind(config, store).await.unwrap();
    let server_addr = server.local_addr();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        server
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await;
    });

    let mut sender = Sender::with_transport(ephemeral().await, server_addr);
    for i in 0..5u32 {
        let seq = sender.send(format!("Timestamp: {}", i).into_bytes()).await.unwrap();
        assert_eq!(seq, i);
        let acked = tokio::time::timeout(ACK_TIMEOUT, sender.recv_ack())
            .await
            .expect("ack timeout")
            .unwrap();
        assert_eq!(acked, i);
    }

    stop_tx.send(()).unwrap();
    handle.await.unwrap();

    let records = JsonLinesStore::load(&path).unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.packet_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert!(records.iter().all(|r| !r.retried && r.retry_count == 0));
}
