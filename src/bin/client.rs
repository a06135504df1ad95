//! RUDP 클라이언트 (송신자)
//!
//! 주기적으로 현재 타임스탬프를 담은 패킷을 전송하고 ACK 를 로그로 남김
//! 재전송 없음 (ACK 는 정보용)
//!
//! 사용법:
//!   cargo run --release --bin rudp-client -- [OPTIONS]
//!
//! 예시:
//!   # 5초마다 전송
//!   cargo run --release --bin rudp-client -- --server 127.0.0.1:8080
//!
//!   # 10개만 100ms 간격으로
//!   cargo run --release --bin rudp-client -- -i 100 -n 10

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rudp::packet::now_millis;
use rudp::{Config, Sender};

/// 클라이언트 설정
struct ClientConfig {
    /// 전송할 패킷 수 (None 이면 무한)
    count: Option<u64>,
    config: Config,
}

fn parse_args() -> ClientConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ClientConfig {
        count: None,
        config: Config::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" | "-s" => {
                if i + 1 < args.len() {
                    config.config.server_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--interval" | "-i" => {
                if i + 1 < args.len() {
                    config.config.send_interval_ms = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--count" | "-n" => {
                if i + 1 < args.len() {
                    config.count = Some(args[i + 1].parse().expect("유효한 숫자 필요"));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"RUDP Client - 순서 보장 UDP 송신 클라이언트

0번부터 시퀀스 번호를 붙여 주기적으로 전송, 수신한 ACK 출력

사용법:
  cargo run --release --bin rudp-client -- [OPTIONS]

옵션:
  -s, --server <ADDR>     서버 주소 (기본: 127.0.0.1:8080)
  -i, --interval <MS>     전송 주기 밀리초 (기본: 5000)
  -n, --count <N>         전송할 패킷 수 (기본: 무한)
  -h, --help              이 도움말 출력
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client_config = parse_args();
    let config = client_config.config;

    info!("RUDP Client starting...");
    info!("Send interval: {}ms", config.send_interval_ms);

    let mut sender = Sender::connect(&config).await?;
    info!("Server: {}", sender.server_addr());
    let mut ticker = tokio::time::interval(config.send_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut sent = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if client_config.count.is_some_and(|count| sent >= count) {
                    break;
                }

                let payload = format!("Timestamp: {}", now_millis());
                match sender.send(payload.into_bytes()).await {
                    Ok(seq) => info!("Packet with sequence number {} sent", seq),
                    Err(e) => warn!("패킷 전송 실패: {}", e),
                }
                sent += 1;
            }
            ack = sender.recv_ack() => {
                match ack {
                    Ok(seq) => info!("ACK received for sequence number {}", seq),
                    Err(e) => warn!("ACK 수신 실패: {}", e),
                }
            }
            _ = &mut shutdown => {
                info!("종료 요청 수신");
                break;
            }
        }
    }

    info!("RUDP Client stopped after {} packets", sent);
    Ok(())
}
