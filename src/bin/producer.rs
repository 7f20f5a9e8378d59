//! NDN 생산자 - 프리픽스 등록 후 인터레스트 응답
//!
//! 포워더에 프리픽스를 등록하고, 들어오는 인터레스트마다
//! 고정 콘텐츠의 데이터 패킷으로 응답한다
//!
//! 사용법:
//!   cargo run --release --bin ndn_producer -- [OPTIONS]
//!
//! 예시:
//!   cargo run --release --bin ndn_producer -- --forwarder 127.0.0.1:6363 --prefix /example

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ndn::{ContentStore, Data, Ed25519Signer, Face, Name};

/// 생산자 설정
struct ProducerConfig {
    forwarder: String,
    prefix: String,
    content: String,
    freshness_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            forwarder: format!("127.0.0.1:{}", ndn::DEFAULT_PORT),
            prefix: "/example".to_string(),
            content: "hello from ndn producer".to_string(),
            freshness_ms: 1000,
        }
    }
}

fn parse_args() -> ProducerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ProducerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--forwarder" | "-f" => {
                if i + 1 < args.len() {
                    config.forwarder = args[i + 1].clone();
                    i += 1;
                }
            }
            "--prefix" | "-p" => {
                if i + 1 < args.len() {
                    config.prefix = args[i + 1].clone();
                    i += 1;
                }
            }
            "--content" | "-c" => {
                if i + 1 < args.len() {
                    config.content = args[i + 1].clone();
                    i += 1;
                }
            }
            "--freshness" => {
                if i + 1 < args.len() {
                    config.freshness_ms = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"NDN Producer - 프리픽스 등록 후 인터레스트 응답

사용법:
  cargo run --release --bin ndn_producer -- [OPTIONS]

옵션:
  -f, --forwarder <ADDR>  포워더 주소 (기본: 127.0.0.1:6363)
  -p, --prefix <PREFIX>   등록할 프리픽스 (기본: /example)
  -c, --content <TEXT>    응답 콘텐츠 (기본: hello from ndn producer)
  --freshness <MS>        응답 FreshnessPeriod 밀리초 (기본: 1000)
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
    let (interest_tx, mut interest_rx) = mpsc::channel(16);
    let face = Face::connect(&config.forwarder, Some(interest_tx), cs).await?;

    let key_name = Name::from_uri(&format!("{}/KEY/producer", config.prefix));
    face.set_signer(Arc::new(Ed25519Signer::generate(key_name)));

    face.register(&config.prefix).await?;
    info!("서비스 시작: {}", config.prefix);

    // 싱크가 닫히면 (트랜스포트 종료) 루프 탈출
    while let Some(interest) = interest_rx.recv().await {
        info!("인터레스트 수신: {}", interest.name);

        let mut data = Data::new(
            interest.name.clone(),
            Bytes::from(config.content.clone().into_bytes()),
        );
        data.meta_info.freshness_period_ms = config.freshness_ms;
        face.send_data(&data).await?;
    }

    info!("{}", face.stats().summary());
    face.close().await?;
    Ok(())
}
