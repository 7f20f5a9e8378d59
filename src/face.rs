//! Face - 단일 트랜스포트 다중화 디스패처
//!
//! - 전용 리더 태스크가 인바운드 패킷을 Data/Interest로 분기
//! - 아웃바운드 인터레스트는 PIT에 등록, 같은 이름의 요청은 합쳐짐
//! - 도착한 데이터는 접두사 일치하는 PIT 엔트리 전체로 팬아웃
//! - 인터레스트별 수명 타이머가 만료된 대기자를 정리
//! - 인바운드 인터레스트는 사용자 제공 채널로 전달 (역압 유지)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use bytes::Bytes;

use crate::cs::ContentStore;
use crate::crypto::Signer;
use crate::name::Name;
use crate::nfd::{Control, ControlResponse, STATUS_CODE_OK};
use crate::packet::{Data, Interest, Selectors, TLV_DATA, TLV_INTEREST};
use crate::pit::Matcher;
use crate::stats::{FaceStats, StatsSnapshot};
use crate::{Config, Error, Result};

/// 데이터 응답 채널 (단일 슬롯)
///
/// 값 없이 닫히면 타임아웃을 의미
pub type DataReceiver = oneshot::Receiver<Data>;

/// PIT 엔트리: 대기자 ID -> 대기자
type PitEntry = HashMap<u64, Waiter>;

struct Waiter {
    tx: oneshot::Sender<Data>,
    selectors: Selectors,
}

/// 리더 태스크와 핸들이 공유하는 상태
struct Shared {
    pit: Mutex<Matcher<PitEntry>>,
    cs: Arc<ContentStore>,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    stats: FaceStats,
    config: Config,
    next_waiter_id: AtomicU64,
    signer: parking_lot::Mutex<Option<Arc<dyn Signer>>>,
}

/// 원격 포워더(또는 피어)와의 단일 연결 엔드포인트
pub struct Face {
    shared: Arc<Shared>,
    local_addr: Option<SocketAddr>,
    remote_addr: Option<SocketAddr>,
    shutdown: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
}

impl Face {
    /// 연결된 트랜스포트로 Face 생성
    ///
    /// interest_tx가 None이면 인바운드 인터레스트는 조용히 버려짐.
    /// 리더 루프 종료 시 interest_tx는 정확히 한 번 닫힌다.
    pub fn new<T>(
        transport: T,
        interest_tx: Option<mpsc::Sender<Interest>>,
        cs: Arc<ContentStore>,
    ) -> Face
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_config(transport, interest_tx, cs, Config::default())
    }

    /// 설정을 지정해 Face 생성
    pub fn with_config<T>(
        transport: T,
        interest_tx: Option<mpsc::Sender<Interest>>,
        cs: Arc<ContentStore>,
        config: Config,
    ) -> Face
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(transport);
        Self::start(reader, writer, None, None, interest_tx, cs, config)
    }

    /// TCP로 포워더에 연결해 Face 생성
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        interest_tx: Option<mpsc::Sender<Interest>>,
        cs: Arc<ContentStore>,
    ) -> Result<Face> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let local_addr = stream.local_addr().ok();
        let remote_addr = stream.peer_addr().ok();

        if let (Some(local), Some(remote)) = (local_addr, remote_addr) {
            info!("Face 연결: {} -> {}", local, remote);
        }

        let (reader, writer) = tokio::io::split(stream);
        Ok(Self::start(
            reader,
            writer,
            local_addr,
            remote_addr,
            interest_tx,
            cs,
            Config::default(),
        ))
    }

    fn start<R, W>(
        reader: R,
        writer: W,
        local_addr: Option<SocketAddr>,
        remote_addr: Option<SocketAddr>,
        interest_tx: Option<mpsc::Sender<Interest>>,
        cs: Arc<ContentStore>,
        config: Config,
    ) -> Face
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let shared = Arc::new(Shared {
            pit: Mutex::new(Matcher::new()),
            cs,
            writer: Mutex::new(Box::new(writer)),
            stats: FaceStats::default(),
            config,
            next_waiter_id: AtomicU64::new(1),
            signer: parking_lot::Mutex::new(None),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let reader_shared = shared.clone();
        tokio::spawn(async move {
            reader_loop(reader_shared, reader, interest_tx, shutdown_rx).await;
        });

        Face {
            shared,
            local_addr,
            remote_addr,
            shutdown: parking_lot::Mutex::new(Some(shutdown_tx)),
        }
    }

    /// 로컬 소켓 주소 (TCP 연결일 때)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 원격 소켓 주소 (TCP 연결일 때)
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// 컨트롤 인터레스트 서명에 쓸 키 설정
    pub fn set_signer(&self, signer: Arc<dyn Signer>) {
        *self.shared.signer.lock() = Some(signer);
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// 현재 PIT 엔트리 수
    pub async fn pending_interest_count(&self) -> usize {
        self.shared.pit.lock().await.len()
    }

    /// 데이터 패킷 전송
    pub async fn send_data(&self, data: &Data) -> Result<()> {
        let wire = data.to_bytes();
        let mut writer = self.shared.writer.lock().await;
        writer.write_all(&wire).await?;
        writer.flush().await?;
        self.shared.stats.record_data_sent();
        Ok(())
    }

    /// 인터레스트 전송, 응답 채널 반환
    ///
    /// 1. 콘텐츠 스토어 적중 시 즉시 캐시 값을 담아 반환 (전송 없음)
    /// 2. 새 이름이면 트랜스포트로 전송 후 PIT 등록, 기존 이름이면 합침
    /// 3. lifetime_ms 후 만료 타이머가 대기자를 정리
    pub async fn send_interest(&self, interest: Interest) -> Result<DataReceiver> {
        let mut interest = interest;
        if interest.lifetime_ms == 0 {
            interest.lifetime_ms = self.shared.config.default_interest_lifetime_ms;
        }

        let (tx, rx) = oneshot::channel();

        if let Some(cached) = self.shared.cs.lookup(&interest.name) {
            self.shared.stats.record_cs_hit();
            let _ = tx.send(cached);
            return Ok(rx);
        }

        let wire = interest.to_bytes();
        let id = self.shared.next_waiter_id.fetch_add(1, Ordering::Relaxed);
        let name = interest.name.clone();
        let waiter = Waiter {
            tx,
            selectors: interest.selectors.clone(),
        };

        // PIT 트랜잭션과 첫 전송은 같은 락 아래에서 수행
        let mut pit = self.shared.pit.lock().await;
        let mut fresh = false;
        pit.update(&name, |entry| {
            let mut waiters = entry.unwrap_or_else(|| {
                fresh = true;
                PitEntry::new()
            });
            waiters.insert(id, waiter);
            Some(waiters)
        });

        if fresh {
            let write_result = {
                let mut writer = self.shared.writer.lock().await;
                match writer.write_all(&wire).await {
                    Ok(()) => writer.flush().await,
                    Err(e) => Err(e),
                }
            };
            if let Err(e) = write_result {
                // 전송 실패 시 방금 만든 엔트리 롤백
                pit.update(&name, |entry| {
                    let mut waiters = entry?;
                    waiters.remove(&id);
                    if waiters.is_empty() {
                        None
                    } else {
                        Some(waiters)
                    }
                });
                return Err(e.into());
            }
            self.shared.stats.record_interest_sent();
        } else {
            self.shared.stats.record_interest_aggregated();
        }
        drop(pit);

        // 수명 만료 타이머: 이미 만족된 대기자에 대해서는 no-op
        let shared = self.shared.clone();
        let lifetime = interest.lifetime_ms;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(lifetime)).await;
            let mut pit = shared.pit.lock().await;
            let mut expired = false;
            pit.update(&name, |entry| {
                let mut waiters = entry?;
                if waiters.remove(&id).is_some() {
                    expired = true;
                }
                if waiters.is_empty() {
                    None
                } else {
                    Some(waiters)
                }
            });
            drop(pit);
            if expired {
                shared.stats.record_timeout();
                debug!("인터레스트 수명 만료: {}", name);
            }
        });

        Ok(rx)
    }

    /// 프리픽스 등록
    pub async fn register(&self, prefix: &str) -> Result<()> {
        let mut control = Control::new("rib", "register");
        control.parameters.name = Name::from_uri(prefix);
        self.send_control_interest(&control).await?;
        info!("프리픽스 등록: {}", prefix);
        Ok(())
    }

    /// 프리픽스 등록 해제
    pub async fn unregister(&self, prefix: &str) -> Result<()> {
        let mut control = Control::new("rib", "unregister");
        control.parameters.name = Name::from_uri(prefix);
        self.send_control_interest(&control).await?;
        info!("프리픽스 등록 해제: {}", prefix);
        Ok(())
    }

    /// 서명된 컨트롤 인터레스트 전송 후 응답 대기
    pub async fn send_control_interest(&self, control: &Control) -> Result<ControlResponse> {
        let signer = self
            .shared
            .signer
            .lock()
            .clone()
            .ok_or(Error::SigningKeyMissing)?;

        let interest = control.to_interest(signer.as_ref())?;
        let rx = self.send_interest(interest).await?;

        let data = rx.await.map_err(|_| Error::ControlTimeout)?;
        let response = ControlResponse::decode(data.content.clone())?;
        if response.status_code != STATUS_CODE_OK {
            warn!(
                "컨트롤 명령 거부: {}/{} ({}) {}",
                control.module, control.command, response.status_code, response.status_text
            );
            return Err(Error::ControlCommand {
                code: response.status_code,
                text: response.status_text,
            });
        }
        Ok(response)
    }

    /// Face 종료
    ///
    /// 리더 루프가 끝나면서 인터레스트 싱크가 닫힌다.
    /// 남은 대기자는 각자의 수명 타이머로 정리됨
    pub async fn close(&self) -> Result<()> {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(());
        }
        let mut writer = self.shared.writer.lock().await;
        let _ = writer.shutdown().await;
        Ok(())
    }
}

/// 리더 루프: 트랜스포트 EOF, 파싱 실패, 종료 신호까지 반복
async fn reader_loop<R>(
    shared: Arc<Shared>,
    mut reader: R,
    interest_tx: Option<mpsc::Sender<Interest>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    R: AsyncRead + Send + Unpin + 'static,
{
    loop {
        let frame = tokio::select! {
            _ = &mut shutdown_rx => break,
            frame = read_frame(&mut reader, shared.config.max_packet_size) => frame,
        };

        match frame {
            Ok(None) => {
                debug!("트랜스포트 EOF");
                break;
            }
            Err(e) => {
                warn!("수신 실패: {}", e);
                break;
            }
            Ok(Some((typ, value))) => match typ {
                TLV_DATA => match Data::decode_value(value) {
                    Ok(data) => {
                        shared.stats.record_data_received();
                        recv_data(&shared, data).await;
                    }
                    Err(e) => {
                        warn!("데이터 디코딩 실패: {}", e);
                        break;
                    }
                },
                TLV_INTEREST => match &interest_tx {
                    Some(tx) => match Interest::decode_value(value) {
                        Ok(interest) => {
                            shared.stats.record_interest_received();
                            // 소비자가 느리면 여기서 리더가 멈춤 (의도된 역압)
                            if tx.send(interest).await.is_err() {
                                debug!("인터레스트 싱크 수신측 종료");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("인터레스트 디코딩 실패: {}", e);
                            break;
                        }
                    },
                    // 싱크 미설정이면 조용히 버림
                    None => debug!("인바운드 인터레스트 무시 (싱크 없음)"),
                },
                typ => {
                    warn!("알 수 없는 패킷 타입: {}", typ);
                    break;
                }
            },
        }
    }
    // interest_tx 드롭: 싱크는 여기서 정확히 한 번 닫힘
}

/// 외부 TLV 요소 하나 읽기 (타입으로 분기하므로 되감기 불필요)
///
/// 프레임 경계에서의 EOF는 Ok(None)
async fn read_frame<R>(reader: &mut R, max_packet_size: usize) -> Result<Option<(u64, Bytes)>>
where
    R: AsyncRead + Unpin,
{
    let typ = match read_varnum(reader).await? {
        Some(typ) => typ,
        None => return Ok(None),
    };
    let len = read_varnum(reader)
        .await?
        .ok_or(Error::VarNumTruncated)? as usize;

    if len > max_packet_size {
        return Err(Error::PacketTooLarge {
            size: len,
            max: max_packet_size,
        });
    }

    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|_| Error::ElementTruncated { typ })?;
    Ok(Some((typ, Bytes::from(buf))))
}

/// 스트림에서 VarNumber 읽기. 첫 바이트 전 EOF면 Ok(None)
async fn read_varnum<R>(reader: &mut R) -> Result<Option<u64>>
where
    R: AsyncRead + Unpin,
{
    let mut first = [0u8; 1];
    match reader.read_exact(&mut first).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let value = match first[0] {
        v @ 0..=252 => v as u64,
        253 => {
            let mut b = [0u8; 2];
            reader.read_exact(&mut b).await?;
            let v = u16::from_be_bytes(b) as u64;
            if v <= 252 {
                return Err(Error::NonMinimalVarNum);
            }
            v
        }
        254 => {
            let mut b = [0u8; 4];
            reader.read_exact(&mut b).await?;
            let v = u32::from_be_bytes(b) as u64;
            if v <= 65535 {
                return Err(Error::NonMinimalVarNum);
            }
            v
        }
        255 => {
            let mut b = [0u8; 8];
            reader.read_exact(&mut b).await?;
            let v = u64::from_be_bytes(b);
            if v <= 4294967295 {
                return Err(Error::NonMinimalVarNum);
            }
            v
        }
    };
    Ok(Some(value))
}

/// 도착한 데이터 처리: 캐시 삽입 + PIT 접두사 워크 팬아웃
async fn recv_data(shared: &Arc<Shared>, data: Data) {
    let name = data.name.clone();
    let mut pit = shared.pit.lock().await;
    pit.update_all(&name, |node_name, waiters| {
        // 신선한 데이터는 캐시. 방문 노드마다 실행되지만
        // lookup 가드 덕에 두 번째부터는 no-op
        if data.meta_info.freshness_period_ms > 0 && shared.cs.lookup(&data.name).is_none() {
            shared.cs.add(data.name.clone(), data.clone());
            let cs = shared.cs.clone();
            let name = data.name.clone();
            let ttl = data.meta_info.freshness_period_ms;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ttl)).await;
                cs.remove(&name);
            });
        }

        // 방문 노드가 가리키는 인터레스트 이름 기준 서픽스 길이
        let suffix_len = data.name.len() - node_name.len() + 1;

        let matched: Vec<u64> = waiters
            .iter()
            .filter(|(_, w)| w.selectors.matches(&data, suffix_len))
            .map(|(id, _)| *id)
            .collect();

        for id in matched {
            if let Some(waiter) = waiters.remove(&id) {
                if waiter.tx.send(data.clone()).is_ok() {
                    shared.stats.record_data_delivered();
                }
            }
        }

        !waiters.is_empty()
    });
}
