//! NDN 소비자 - 이름으로 데이터 한 건 요청
//!
//! 포워더에 연결해 인터레스트를 보내고 응답 데이터를 출력한다
//!
//! 사용법:
//!   cargo run --release --bin ndn_consumer -- [OPTIONS]
//!
//! 예시:
//!   cargo run --release --bin ndn_consumer -- --forwarder 127.0.0.1:6363 --name /example/hello

use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ndn::{ContentStore, Face, Interest, Name};

/// 소비자 설정
struct ConsumerConfig {
    forwarder: String,
    name: String,
    lifetime_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            forwarder: format!("127.0.0.1:{}", ndn::DEFAULT_PORT),
            name: "/example/hello".to_string(),
            lifetime_ms: 4000,
        }
    }
}

fn parse_args() -> ConsumerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ConsumerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--forwarder" | "-f" => {
                if i + 1 < args.len() {
                    config.forwarder = args[i + 1].clone();
                    i += 1;
                }
            }
            "--name" | "-n" => {
                if i + 1 < args.len() {
                    config.name = args[i + 1].clone();
                    i += 1;
                }
            }
            "--lifetime" | "-l" => {
                if i + 1 < args.len() {
                    config.lifetime_ms = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"NDN Consumer - 이름으로 데이터 요청

사용법:
  cargo run --release --bin ndn_consumer -- [OPTIONS]

옵션:
  -f, --forwarder <ADDR>  포워더 주소 (기본: 127.0.0.1:6363)
  -n, --name <NAME>       요청할 이름 (기본: /example/hello)
  -l, --lifetime <MS>     인터레스트 수명 밀리초 (기본: 4000)
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
async fn main() -> ndn::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("로깅 초기화 실패");

    let config = parse_args();

    let cs = Arc::new(ContentStore::new());
    let face = Face::connect(&config.forwarder, None, cs).await?;

    let mut interest = Interest::new(Name::from_uri(&config.name));
    interest.lifetime_ms = config.lifetime_ms;

    info!("인터레스트 전송: {}", config.name);
    let rx = face.send_interest(interest).await?;

    match rx.await {
        Ok(data) => {
            info!(
                "데이터 수신: {} ({} bytes, freshness {}ms)",
                data.name,
                data.content.len(),
                data.meta_info.freshness_period_ms
            );
            println!("{}", String::from_utf8_lossy(&data.content));
        }
        Err(_) => {
            eprintln!("타임아웃: {}ms 안에 응답 없음", config.lifetime_ms);
            face.close().await?;
            std::process::exit(1);
        }
    }

    info!("{}", face.stats().summary());
    face.close().await?;
    Ok(())
}
