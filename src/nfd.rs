//! NFD 관리 프로토콜
//!
//! 포워더의 컨트롤 명령은 서명된 인터레스트의 이름에 실린다:
//! `/localhost/nfd/<module>/<command>/<params>/<timestamp>/<nonce>/<sig-info>/<sig-value>`
//!
//! 응답은 Data 콘텐츠의 ControlResponse TLV

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};

use crate::crypto::Signer;
use crate::name::{self, Name};
use crate::packet::{self, Interest};
use crate::tlv::{self, Element};
use crate::{Error, Result};

/// TLV: ControlResponse
pub const TLV_CONTROL_RESPONSE: u64 = 101;

/// TLV: StatusCode
pub const TLV_STATUS_CODE: u64 = 102;

/// TLV: StatusText
pub const TLV_STATUS_TEXT: u64 = 103;

/// TLV: ControlParameters
pub const TLV_CONTROL_PARAMETERS: u64 = 104;

/// TLV: FaceId
pub const TLV_FACE_ID: u64 = 105;

/// TLV: Cost
pub const TLV_COST: u64 = 106;

/// TLV: Strategy
pub const TLV_STRATEGY: u64 = 107;

/// TLV: LocalControlFeature
pub const TLV_LOCAL_CONTROL_FEATURE: u64 = 110;

/// TLV: Uri
pub const TLV_URI: u64 = 114;

/// 상태 코드: 성공
pub const STATUS_CODE_OK: u64 = 200;

/// 상태 코드: 잘못된 인자
pub const STATUS_CODE_ARGS_INCORRECT: u64 = 400;

/// 상태 코드: 권한 없음
pub const STATUS_CODE_NOT_AUTHORIZED: u64 = 403;

/// 상태 코드: 대상 없음
pub const STATUS_CODE_NOT_FOUND: u64 = 404;

/// 상태 코드: 미지원 명령
pub const STATUS_CODE_NOT_SUPPORTED: u64 = 501;

/// 컨트롤 명령 파라미터
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlParameters {
    /// 대상 이름 (프리픽스 등)
    pub name: Name,

    /// Face ID (0 = 미설정)
    pub face_id: u64,

    /// 원격 URI
    pub uri: String,

    /// 로컬 컨트롤 기능 번호 (0 = 미설정)
    pub local_control_feature: u64,

    /// 라우트 비용 (0 = 미설정)
    pub cost: u64,

    /// 포워딩 전략 이름
    pub strategy: Name,
}

impl ControlParameters {
    /// 모든 필드가 미설정이면 true
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.face_id == 0
            && self.uri.is_empty()
            && self.local_control_feature == 0
            && self.cost == 0
            && self.strategy.is_empty()
    }

    /// ControlParameters TLV 요소 전체 인코딩
    pub fn encode(&self) -> Bytes {
        let mut inner = BytesMut::new();
        if !self.name.is_empty() {
            self.name.encode(&mut inner);
        }
        if self.face_id != 0 {
            tlv::write_nonneg_element(&mut inner, TLV_FACE_ID, self.face_id);
        }
        if !self.uri.is_empty() {
            tlv::write_element(&mut inner, TLV_URI, self.uri.as_bytes());
        }
        if self.local_control_feature != 0 {
            tlv::write_nonneg_element(
                &mut inner,
                TLV_LOCAL_CONTROL_FEATURE,
                self.local_control_feature,
            );
        }
        if self.cost != 0 {
            tlv::write_nonneg_element(&mut inner, TLV_COST, self.cost);
        }
        if !self.strategy.is_empty() {
            let mut strategy = BytesMut::new();
            self.strategy.encode(&mut strategy);
            tlv::write_element(&mut inner, TLV_STRATEGY, &strategy);
        }

        let mut buf = BytesMut::new();
        tlv::write_element(&mut buf, TLV_CONTROL_PARAMETERS, &inner);
        buf.freeze()
    }

    /// ControlParameters TLV의 값 부분 디코딩
    pub fn decode_value(mut value: Bytes) -> Result<ControlParameters> {
        let mut params = ControlParameters::default();
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                name::TLV_NAME => params.name = Name::decode_value(el.value)?,
                TLV_FACE_ID => params.face_id = el.as_nonneg()?,
                TLV_URI => params.uri = String::from_utf8_lossy(&el.value).into_owned(),
                TLV_LOCAL_CONTROL_FEATURE => params.local_control_feature = el.as_nonneg()?,
                TLV_COST => params.cost = el.as_nonneg()?,
                TLV_STRATEGY => {
                    let mut inner = el.value;
                    params.strategy = Name::decode(&mut inner)?;
                }
                _ => {}
            }
        }
        Ok(params)
    }
}

/// 컨트롤 명령 기술자
#[derive(Debug, Clone, Default)]
pub struct Control {
    /// 관리 모듈 (`rib` 등)
    pub module: String,

    /// 명령 (`register` 등)
    pub command: String,

    /// 명령 파라미터
    pub parameters: ControlParameters,
}

impl Control {
    /// 새 컨트롤 명령 생성
    pub fn new(module: &str, command: &str) -> Self {
        Self {
            module: module.to_string(),
            command: command.to_string(),
            parameters: ControlParameters::default(),
        }
    }

    /// 서명된 인터레스트로 변환
    ///
    /// 마지막 서명 값 컴포넌트를 제외한 모든 컴포넌트의
    /// 인코딩 연접이 서명 대상
    pub fn to_interest(&self, signer: &dyn Signer) -> Result<Interest> {
        let mut name = Name::from_uri("/localhost/nfd");
        name.push(Bytes::from(self.module.clone().into_bytes()));
        name.push(Bytes::from(self.command.clone().into_bytes()));
        name.push(self.parameters.encode());

        // 타임스탬프 (epoch 밀리초)
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        name.push(Bytes::from(tlv::encode_nonneg(timestamp_ms)));

        // 명령 난수
        let nonce: [u8; 4] = rand::random();
        name.push(Bytes::copy_from_slice(&nonce));

        // 서명 정보 컴포넌트
        let mut sig_info_inner = BytesMut::new();
        tlv::write_nonneg_element(
            &mut sig_info_inner,
            packet::TLV_SIGNATURE_TYPE,
            signer.signature_type(),
        );
        let locator = signer.key_locator();
        if !locator.is_empty() {
            tlv::write_element(
                &mut sig_info_inner,
                packet::TLV_KEY_LOCATOR,
                &locator.encode_value(),
            );
        }
        let mut sig_info = BytesMut::new();
        tlv::write_element(&mut sig_info, packet::TLV_SIGNATURE_INFO, &sig_info_inner);
        name.push(sig_info.freeze());

        // 서명 값 컴포넌트
        let mut signed = BytesMut::new();
        for c in name.components() {
            tlv::write_element(&mut signed, name::TLV_NAME_COMPONENT, c);
        }
        let signature = signer
            .sign(&signed)
            .map_err(|e| Error::Signing(e.to_string()))?;
        let mut sig_value = BytesMut::new();
        tlv::write_element(&mut sig_value, packet::TLV_SIGNATURE_VALUE, &signature);
        name.push(sig_value.freeze());

        let mut interest = Interest::new(name);
        interest.selectors.must_be_fresh = true;
        Ok(interest)
    }

    /// 인바운드 인터레스트에서 컨트롤 명령 해석
    ///
    /// 서명 검증은 하지 않는다. 명령을 실행하는 쪽은 별도 검증 필요
    pub fn from_interest(interest: &Interest) -> Result<Control> {
        let comps = interest.name.components();
        if comps.len() < 9 {
            return Err(Error::MalformedControl);
        }
        if comps[0].as_ref() != b"localhost" || comps[1].as_ref() != b"nfd" {
            return Err(Error::MalformedControl);
        }

        let module = String::from_utf8_lossy(&comps[2]).into_owned();
        let command = String::from_utf8_lossy(&comps[3]).into_owned();

        let mut params_buf = comps[4].clone();
        let params_value = Element::expect(&mut params_buf, TLV_CONTROL_PARAMETERS)
            .map_err(|_| Error::MalformedControl)?;
        let parameters = ControlParameters::decode_value(params_value)?;

        Ok(Control {
            module,
            command,
            parameters,
        })
    }
}

/// 포워더의 명령 응답
#[derive(Debug, Clone, Default)]
pub struct ControlResponse {
    /// 상태 코드 (200 = 성공)
    pub status_code: u64,

    /// 상태 텍스트
    pub status_text: String,

    /// 에코된 파라미터 (선택)
    pub body: ControlParameters,
}

impl ControlResponse {
    /// 새 응답 생성
    pub fn new(status_code: u64, status_text: &str) -> Self {
        Self {
            status_code,
            status_text: status_text.to_string(),
            body: ControlParameters::default(),
        }
    }

    /// Data 콘텐츠로 들어갈 ControlResponse TLV 인코딩
    pub fn encode(&self) -> Bytes {
        let mut inner = BytesMut::new();
        tlv::write_nonneg_element(&mut inner, TLV_STATUS_CODE, self.status_code);
        tlv::write_element(&mut inner, TLV_STATUS_TEXT, self.status_text.as_bytes());
        if !self.body.is_empty() {
            inner.extend_from_slice(&self.body.encode());
        }

        let mut buf = BytesMut::new();
        tlv::write_element(&mut buf, TLV_CONTROL_RESPONSE, &inner);
        buf.freeze()
    }

    /// Data 콘텐츠에서 디코딩
    pub fn decode(content: Bytes) -> Result<ControlResponse> {
        let mut buf = content;
        let mut value = Element::expect(&mut buf, TLV_CONTROL_RESPONSE)?;

        let mut response = ControlResponse::default();
        while !value.is_empty() {
            let el = Element::read(&mut value)?;
            match el.typ {
                TLV_STATUS_CODE => response.status_code = el.as_nonneg()?,
                TLV_STATUS_TEXT => {
                    response.status_text = String::from_utf8_lossy(&el.value).into_owned()
                }
                TLV_CONTROL_PARAMETERS => {
                    response.body = ControlParameters::decode_value(el.value)?
                }
                _ => {}
            }
        }
        Ok(response)
    }
}
