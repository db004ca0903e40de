//! Data packet metainfo: content type and freshness period.

use bytes::{Bytes, BytesMut};

use crate::error::CodecError;
use crate::tlv::{self, types};

/// Two optional fields; `None` corresponds to the source's `-1` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metainfo {
    pub content_type: Option<u64>,
    pub freshness_period_ms: Option<u64>,
}

impl Metainfo {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn encode(&self) -> BytesMut {
        let mut value = BytesMut::new();
        if let Some(ct) = self.content_type {
            let mut field = BytesMut::new();
            tlv::encode_nonneg_integer(ct, &mut field);
            tlv::encode_varnum(types::CONTENT_TYPE, &mut value);
            tlv::encode_varnum(field.len() as u64, &mut value);
            value.extend_from_slice(&field);
        }
        if let Some(fp) = self.freshness_period_ms {
            let mut field = BytesMut::new();
            tlv::encode_nonneg_integer(fp, &mut field);
            tlv::encode_varnum(types::FRESHNESS_PERIOD, &mut value);
            tlv::encode_varnum(field.len() as u64, &mut value);
            value.extend_from_slice(&field);
        }
        let mut out = BytesMut::with_capacity(value.len() + 5);
        tlv::encode_varnum(types::META_INFO, &mut out);
        tlv::encode_varnum(value.len() as u64, &mut out);
        out.unsplit(value);
        out
    }

    pub fn parse_from_block(mut block: Bytes) -> Result<Self, CodecError> {
        let el = tlv::TlvElement::decode(&mut block)?;
        if el.tlv_type != types::META_INFO {
            return Err(CodecError::UnexpectedType { want: types::META_INFO, got: el.tlv_type });
        }
        Self::parse_value(el.value)
    }

    /// Parses the *inner* value of a `META_INFO` TLV (its header already
    /// consumed by the caller).
    pub(crate) fn parse_value(mut value: Bytes) -> Result<Self, CodecError> {
        let mut info = Metainfo::none();
        while !value.is_empty() {
            let field = tlv::TlvElement::decode(&mut value)?;
            match field.tlv_type {
                types::CONTENT_TYPE => {
                    info.content_type = Some(tlv::decode_nonneg_integer(&field.value)?)
                }
                types::FRESHNESS_PERIOD => {
                    info.freshness_period_ms = Some(tlv::decode_nonneg_integer(&field.value)?)
                }
                other => return Err(CodecError::UnexpectedType { want: types::CONTENT_TYPE, got: other }),
            }
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_round_trip() {
        let m = Metainfo::none();
        let block = m.encode().freeze();
        assert_eq!(Metainfo::parse_from_block(block).unwrap(), m);
    }

    #[test]
    fn present_fields_round_trip() {
        let m = Metainfo { content_type: Some(0x07102034), freshness_period_ms: Some(1000) };
        let block = m.encode().freeze();
        assert_eq!(Metainfo::parse_from_block(block).unwrap(), m);
    }
}
