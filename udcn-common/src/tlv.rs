//! Variable-length integers and TLV element framing.
//!
//! The wire format is NDN's classic Type-Length-Value encoding: every field
//! is `type (varnum) || length (varnum) || value (length bytes)`. Both type
//! and length are encoded with the same variable-length integer scheme.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::CodecError;

/// TLV type numbers used on the wire (spec'd bit-exact, see `ndn-constants.h`
/// in the original source for the authoritative values).
pub mod types {
    pub const INTEREST: u64 = 5;
    pub const DATA: u64 = 6;
    pub const NAME: u64 = 7;
    pub const NAME_COMPONENT: u64 = 8;
    pub const SELECTORS: u64 = 9;
    pub const NONCE: u64 = 10;
    pub const INTEREST_LIFETIME: u64 = 11;
    pub const META_INFO: u64 = 20;
    pub const CONTENT: u64 = 21;
    pub const SIGNATURE_INFO: u64 = 22;
    pub const SIGNATURE_VALUE: u64 = 23;
    pub const CONTENT_TYPE: u64 = 24;
    pub const FRESHNESS_PERIOD: u64 = 25;
    pub const SIGNATURE_TYPE: u64 = 27;
}

/// Signature algorithm codes carried in a `SignatureInfo` TLV. `HMAC_SHA256`
/// is a local convention (spec.md §9 open question (b)), not a registered
/// NDN code point; confirm peer interoperability before relying on it.
pub mod sig_types {
    pub const DIGEST_SHA256: u8 = 0;
    pub const ECDSA_SHA256: u8 = 3;
    pub const HMAC_SHA256: u8 = 4;
}

/// Number of bytes `encode_varnum` would write for `n`, without writing it.
pub fn varnum_length(n: u64) -> usize {
    if n < 253 {
        1
    } else if n <= 0xFFFF {
        3
    } else {
        5
    }
}

/// Encodes `n` as a varnum into `buf`.
pub fn encode_varnum(n: u64, buf: &mut BytesMut) {
    if n < 253 {
        buf.put_u8(n as u8);
    } else if n <= 0xFFFF {
        buf.put_u8(253);
        buf.put_u16(n as u16);
    } else {
        buf.put_u8(254);
        buf.put_u32(n as u32);
    }
}

/// Decodes a varnum from the front of `buf`. Returns `(value, bytes_consumed)`.
/// The 9-byte (`255, ...`) form is reserved and rejected.
pub fn decode_varnum(buf: &[u8]) -> Result<(u64, usize), CodecError> {
    let first = *buf.first().ok_or(CodecError::InvalidVarnum)?;
    match first {
        0..=252 => Ok((first as u64, 1)),
        253 => {
            if buf.len() < 3 {
                return Err(CodecError::InvalidVarnum);
            }
            let v = u16::from_be_bytes([buf[1], buf[2]]);
            Ok((v as u64, 3))
        }
        254 => {
            if buf.len() < 5 {
                return Err(CodecError::InvalidVarnum);
            }
            let v = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
            Ok((v as u64, 5))
        }
        255 => Err(CodecError::InvalidVarnum),
    }
}

/// Total encoded length of a TLV element with the given type and value length.
pub fn block_total_length(tlv_type: u64, length: usize) -> usize {
    varnum_length(tlv_type) + varnum_length(length as u64) + length
}

/// A decoded `type || length || value` element. `value` is a zero-copy slice
/// of the buffer it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    pub tlv_type: u64,
    pub value: Bytes,
}

impl TlvElement {
    pub fn new(tlv_type: u64, value: Bytes) -> Self {
        Self { tlv_type, value }
    }

    pub fn encoded_len(&self) -> usize {
        block_total_length(self.tlv_type, self.value.len())
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        encode_varnum(self.tlv_type, buf);
        encode_varnum(self.value.len() as u64, buf);
        buf.extend_from_slice(&self.value);
    }

    /// Decodes one element from the front of `buf`, advancing it past the
    /// element on success.
    pub fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        let (tlv_type, type_len) = decode_varnum(buf)?;
        if buf.remaining() < type_len {
            return Err(CodecError::Truncated);
        }
        buf.advance(type_len);
        let (length, len_len) = decode_varnum(buf)?;
        if buf.remaining() < len_len {
            return Err(CodecError::Truncated);
        }
        buf.advance(len_len);
        let length = length as usize;
        if buf.remaining() < length {
            return Err(CodecError::Truncated);
        }
        let value = buf.split_to(length);
        Ok(Self { tlv_type, value })
    }
}

/// Extracts the view `(block_bytes, total_length)` of the single complete TLV
/// element starting at the front of `frame`, without copying. Fails with
/// `Truncated` if the asserted length does not fit in `frame`.
pub fn extract_block(frame: &[u8]) -> Result<(&[u8], usize), CodecError> {
    let (tlv_type, type_len) = decode_varnum(frame)?;
    let _ = tlv_type;
    let rest = frame.get(type_len..).ok_or(CodecError::Truncated)?;
    let (length, len_len) = decode_varnum(rest)?;
    let total = type_len + len_len + length as usize;
    if frame.len() < total {
        return Err(CodecError::Truncated);
    }
    Ok((&frame[..total], total))
}

/// Smallest-fitting big-endian encoding of a non-negative integer field: 1,
/// 2 or 4 bytes.
pub fn encode_nonneg_integer(n: u64, buf: &mut BytesMut) {
    if n <= u8::MAX as u64 {
        buf.put_u8(n as u8);
    } else if n <= u16::MAX as u64 {
        buf.put_u16(n as u16);
    } else {
        buf.put_u32(n as u32);
    }
}

/// Decodes a non-negative integer field of the given byte length (1, 2 or 4).
pub fn decode_nonneg_integer(bytes: &[u8]) -> Result<u64, CodecError> {
    match bytes.len() {
        1 => Ok(bytes[0] as u64),
        2 => Ok(u16::from_be_bytes([bytes[0], bytes[1]]) as u64),
        4 => Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64),
        _ => Err(CodecError::InvalidLength),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varnum_round_trip() {
        for n in [0u64, 1, 252, 253, 254, 65535, 65536, u32::MAX as u64] {
            let mut buf = BytesMut::new();
            encode_varnum(n, &mut buf);
            let (decoded, consumed) = decode_varnum(&buf).unwrap();
            assert_eq!(decoded, n);
            assert_eq!(consumed, varnum_length(n));
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn varnum_thresholds() {
        let mut buf = BytesMut::new();
        encode_varnum(252, &mut buf);
        assert_eq!(&buf[..], &[252]);

        let mut buf = BytesMut::new();
        encode_varnum(253, &mut buf);
        assert_eq!(&buf[..], &[253, 0, 253]);

        let mut buf = BytesMut::new();
        encode_varnum(65536, &mut buf);
        assert_eq!(&buf[..], &[254, 0, 1, 0, 0]);
    }

    #[test]
    fn truncated_varnum_rejected() {
        assert_eq!(decode_varnum(&[253, 0]), Err(CodecError::InvalidVarnum));
        assert_eq!(decode_varnum(&[254, 0, 0]), Err(CodecError::InvalidVarnum));
        assert_eq!(decode_varnum(&[255]), Err(CodecError::InvalidVarnum));
        assert_eq!(decode_varnum(&[]), Err(CodecError::InvalidVarnum));
    }

    #[test]
    fn element_round_trip() {
        let mut buf = BytesMut::new();
        let el = TlvElement::new(types::NAME_COMPONENT, Bytes::from_static(b"abc"));
        el.encode(&mut buf);
        let mut frozen = buf.freeze();
        let decoded = TlvElement::decode(&mut frozen).unwrap();
        assert_eq!(decoded, el);
        assert_eq!(frozen.remaining(), 0);
    }

    #[test]
    fn extract_block_reports_truncation() {
        let frame = [types::NAME as u8, 0x05, b'a', b'b'];
        assert_eq!(extract_block(&frame), Err(CodecError::Truncated));
    }

    #[test]
    fn extract_block_finds_exact_span() {
        let frame = [types::NAME_COMPONENT as u8, 0x02, b'a', b'b', 0xff, 0xff];
        let (block, total) = extract_block(&frame).unwrap();
        assert_eq!(total, 4);
        assert_eq!(block, &[8, 2, b'a', b'b']);
    }
}
