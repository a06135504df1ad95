//! RUDP 서버 (수신자)
//!
//! 시퀀스 패킷을 받아 피어별로 재정렬/중복 제거 후 저장소에 기록하고 ACK 응답
//!
//! 사용법:
//!   cargo run --release --bin rudp-server -- [OPTIONS]
//!
//! 예시:
//!   # 기본 수신 (0.0.0.0:8080, 메모리 저장소)
//!   cargo run --release --bin rudp-server
//!
//!   # 전달 기록을 파일로 남김
//!   cargo run --release --bin rudp-server -- --store logs/deliveries.jsonl

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rudp::store::{DeliveryStore, JsonLinesStore, MemoryStore};
use rudp::{Config, Server};

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    config.store_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--max-peers" => {
                if i + 1 < args.len() {
                    config.max_peers = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"RUDP Server - 순서 보장 UDP 수신 서버

시퀀스 번호 순서대로 전달, 중복 제거, 모든 데이터 패킷에 ACK 응답

사용법:
  cargo run --release --bin rudp-server -- [OPTIONS]

옵션:
  -b, --bind <ADDR>       바인드 주소 (기본: 0.0.0.0:8080)
  -s, --store <PATH>      전달 기록 파일 (JSON lines, 기본: 메모리)
  --max-peers <N>         동시에 추적할 최대 피어 수 (기본: 1024)
  -h, --help              이 도움말 출력

로그 레벨은 RUST_LOG 로 조정 (기본: info)
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

    let config = parse_args();

    info!("RUDP Server starting...");
    info!("Bind address: {}", config.bind_addr);
    info!("Max frame size: {} bytes", config.max_frame_size);

    let store: Box<dyn DeliveryStore + Send + Sync> = match &config.store_path {
        Some(path) => {
            let store = JsonLinesStore::open(path)?;
            info!("Delivery log: {:?}", store.path());
            Box::new(store)
        }
        None => {
            info!("Delivery log: in-memory");
            Box::new(MemoryStore::new())
        }
    };

    // 소켓 바인딩 실패는 치명적
    let mut server = Server::bind(config, store).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // 시그널 핸들러 없이 계속 수신
                warn!("Ctrl-C 핸들러 설치 실패: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("RUDP Server stopped");
    Ok(())
}
