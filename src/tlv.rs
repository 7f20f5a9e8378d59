//! TLV (Type-Length-Value) 인코딩/디코딩
//!
//! - VarNumber: 1/3/5/9 바이트 가변 길이 정수 (253/254/255 마커)
//! - NonNegativeInteger: 1/2/4/8 바이트 빅엔디언 정수
//! - Element: 외부 TLV 요소 단위 파싱

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// VarNumber 인코딩 길이
pub fn varnum_len(n: u64) -> usize {
    if n <= 252 {
        1
    } else if n <= 65535 {
        3
    } else if n <= 4294967295 {
        5
    } else {
        9
    }
}

/// VarNumber 기록
pub fn write_varnum(buf: &mut BytesMut, n: u64) {
    if n <= 252 {
        buf.put_u8(n as u8);
    } else if n <= 65535 {
        buf.put_u8(253);
        buf.put_u16(n as u16);
    } else if n <= 4294967295 {
        buf.put_u8(254);
        buf.put_u32(n as u32);
    } else {
        buf.put_u8(255);
        buf.put_u64(n);
    }
}

/// VarNumber 읽기
///
/// 최소 길이 인코딩이 아니면 거부
pub fn read_varnum(buf: &mut impl Buf) -> Result<u64> {
    if buf.remaining() < 1 {
        return Err(Error::VarNumTruncated);
    }
    let first = buf.get_u8();
    match first {
        0..=252 => Ok(first as u64),
        253 => {
            if buf.remaining() < 2 {
                return Err(Error::VarNumTruncated);
            }
            let val = buf.get_u16() as u64;
            if val <= 252 {
                return Err(Error::NonMinimalVarNum);
            }
            Ok(val)
        }
        254 => {
            if buf.remaining() < 4 {
                return Err(Error::VarNumTruncated);
            }
            let val = buf.get_u32() as u64;
            if val <= 65535 {
                return Err(Error::NonMinimalVarNum);
            }
            Ok(val)
        }
        255 => {
            if buf.remaining() < 8 {
                return Err(Error::VarNumTruncated);
            }
            let val = buf.get_u64();
            if val <= 4294967295 {
                return Err(Error::NonMinimalVarNum);
            }
            Ok(val)
        }
    }
}

/// TLV 요소 기록 (타입 + 길이 + 값)
pub fn write_element(buf: &mut BytesMut, typ: u64, value: &[u8]) {
    write_varnum(buf, typ);
    write_varnum(buf, value.len() as u64);
    buf.put_slice(value);
}

/// NonNegativeInteger 값 기록 (TLV 요소 전체)
pub fn write_nonneg_element(buf: &mut BytesMut, typ: u64, n: u64) {
    let value = encode_nonneg(n);
    write_element(buf, typ, &value);
}

/// NonNegativeInteger 인코딩 (최단 표현)
pub fn encode_nonneg(n: u64) -> Vec<u8> {
    if n <= 0xFF {
        vec![n as u8]
    } else if n <= 0xFFFF {
        (n as u16).to_be_bytes().to_vec()
    } else if n <= 0xFFFF_FFFF {
        (n as u32).to_be_bytes().to_vec()
    } else {
        n.to_be_bytes().to_vec()
    }
}

/// NonNegativeInteger 디코딩
pub fn read_nonneg(value: &[u8]) -> Result<u64> {
    match value.len() {
        1 => Ok(value[0] as u64),
        2 => Ok(u16::from_be_bytes([value[0], value[1]]) as u64),
        4 => Ok(u32::from_be_bytes([value[0], value[1], value[2], value[3]]) as u64),
        8 => Ok(u64::from_be_bytes([
            value[0], value[1], value[2], value[3], value[4], value[5], value[6], value[7],
        ])),
        len => Err(Error::InvalidNonNegative { len }),
    }
}

/// 파싱된 TLV 요소
#[derive(Debug, Clone)]
pub struct Element {
    /// TLV 타입 번호
    pub typ: u64,

    /// 값 바이트
    pub value: Bytes,
}

impl Element {
    /// 버퍼 앞에서 요소 하나 읽기
    pub fn read(buf: &mut Bytes) -> Result<Element> {
        let typ = read_varnum(buf)?;
        let len = read_varnum(buf)? as usize;
        if buf.remaining() < len {
            return Err(Error::ElementTruncated { typ });
        }
        let value = buf.split_to(len);
        Ok(Element { typ, value })
    }

    /// 지정된 타입의 요소를 읽고 값 반환
    pub fn expect(buf: &mut Bytes, expected: u64) -> Result<Bytes> {
        let el = Element::read(buf)?;
        if el.typ != expected {
            return Err(Error::TypeMismatch {
                expected,
                got: el.typ,
            });
        }
        Ok(el.value)
    }

    /// NonNegativeInteger 값으로 해석
    pub fn as_nonneg(&self) -> Result<u64> {
        read_nonneg(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varnum_lengths() {
        for v in 0u64..=252 {
            assert_eq!(varnum_len(v), 1);
        }
        assert_eq!(varnum_len(253), 3);
        assert_eq!(varnum_len(65535), 3);
        assert_eq!(varnum_len(65536), 5);
        assert_eq!(varnum_len(4294967295), 5);
        assert_eq!(varnum_len(4294967296), 9);
    }

    #[test]
    fn test_varnum_roundtrip() {
        for v in [0u64, 1, 252, 253, 300, 65535, 65536, 4294967295, 4294967296] {
            let mut buf = BytesMut::new();
            write_varnum(&mut buf, v);
            assert_eq!(buf.len(), varnum_len(v));

            let mut bytes = buf.freeze();
            assert_eq!(read_varnum(&mut bytes).unwrap(), v);
            assert!(bytes.is_empty());
        }
    }

    #[test]
    fn test_varnum_non_minimal() {
        // 253 마커로 인코딩된 100은 거부
        let mut bytes = Bytes::from_static(&[253, 0, 100]);
        assert!(matches!(
            read_varnum(&mut bytes),
            Err(Error::NonMinimalVarNum)
        ));

        let mut bytes = Bytes::from_static(&[254, 0, 0, 255, 255]);
        assert!(matches!(
            read_varnum(&mut bytes),
            Err(Error::NonMinimalVarNum)
        ));
    }

    #[test]
    fn test_varnum_truncated() {
        let mut bytes = Bytes::from_static(&[253, 1]);
        assert!(matches!(
            read_varnum(&mut bytes),
            Err(Error::VarNumTruncated)
        ));

        let mut bytes = Bytes::new();
        assert!(matches!(
            read_varnum(&mut bytes),
            Err(Error::VarNumTruncated)
        ));
    }

    #[test]
    fn test_element_roundtrip() {
        let mut buf = BytesMut::new();
        write_element(&mut buf, 7, b"hello");
        write_element(&mut buf, 300, b"");

        let mut bytes = buf.freeze();
        let el = Element::read(&mut bytes).unwrap();
        assert_eq!(el.typ, 7);
        assert_eq!(el.value.as_ref(), b"hello");

        let el = Element::read(&mut bytes).unwrap();
        assert_eq!(el.typ, 300);
        assert!(el.value.is_empty());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_element_truncated() {
        let mut buf = BytesMut::new();
        write_varnum(&mut buf, 7);
        write_varnum(&mut buf, 10);
        buf.put_slice(b"abc");

        let mut bytes = buf.freeze();
        assert!(matches!(
            Element::read(&mut bytes),
            Err(Error::ElementTruncated { typ: 7 })
        ));
    }

    #[test]
    fn test_nonneg_roundtrip() {
        for v in [0u64, 1, 255, 256, 65535, 65536, 4294967295, 4294967296] {
            let encoded = encode_nonneg(v);
            assert_eq!(read_nonneg(&encoded).unwrap(), v);
        }
        assert!(matches!(
            read_nonneg(&[1, 2, 3]),
            Err(Error::InvalidNonNegative { len: 3 })
        ));
    }
}
