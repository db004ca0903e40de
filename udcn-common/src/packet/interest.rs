//! Interest packet encoding and decoding.
//!
//! Wire shape: `INTEREST || name || [selectors] || NONCE(4) || INTEREST_LIFETIME`.
//! Selectors are never generated; the decoder skips over one if present so
//! that it can still read Nonce and InterestLifetime from a peer that sends
//! them.

use bytes::{Bytes, BytesMut};

use crate::block::SharedBlock;
use crate::error::CodecError;
use crate::name::Name;
use crate::tlv::{self, types};

/// Convenience bundle of a decoded Interest's three logical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    pub nonce: u32,
    pub lifetime_ms: u64,
}

impl Interest {
    pub fn encode(&self) -> SharedBlock {
        create(&self.name, self.nonce, self.lifetime_ms)
    }

    pub fn decode(block: &SharedBlock) -> Result<Self, CodecError> {
        Ok(Interest {
            name: get_name(block)?,
            nonce: get_nonce(block)?,
            lifetime_ms: get_lifetime_ms(block)?,
        })
    }
}

/// Builds `INTEREST || name || NONCE(4) || INTEREST_LIFETIME(m)`.
pub fn create(name: &Name, nonce: u32, lifetime_ms: u64) -> SharedBlock {
    let name_block = name.encode();

    let mut nonce_value = BytesMut::with_capacity(4);
    nonce_value.extend_from_slice(&nonce.to_be_bytes());
    let nonce_el_len = tlv::block_total_length(types::NONCE, 4);

    let mut lifetime_value = BytesMut::new();
    tlv::encode_nonneg_integer(lifetime_ms, &mut lifetime_value);
    let lifetime_el_len = tlv::block_total_length(types::INTEREST_LIFETIME, lifetime_value.len());

    let dl = name_block.len() + nonce_el_len + lifetime_el_len;
    let mut out = BytesMut::with_capacity(tlv::block_total_length(types::INTEREST, dl));
    tlv::encode_varnum(types::INTEREST, &mut out);
    tlv::encode_varnum(dl as u64, &mut out);
    out.unsplit(name_block);
    tlv::encode_varnum(types::NONCE, &mut out);
    tlv::encode_varnum(4, &mut out);
    out.unsplit(nonce_value);
    tlv::encode_varnum(types::INTEREST_LIFETIME, &mut out);
    tlv::encode_varnum(lifetime_value.len() as u64, &mut out);
    out.unsplit(lifetime_value);

    SharedBlock::new(out.freeze())
}

/// Walks past the outer `INTEREST` header and the `NAME` element, returning
/// the remaining cursor (pointing at Selectors, if present, else Nonce).
fn after_name(block: &SharedBlock) -> Result<Bytes, CodecError> {
    let mut cursor = block.as_bytes().clone();
    let outer = tlv::TlvElement::decode(&mut cursor)?;
    if outer.tlv_type != types::INTEREST {
        return Err(CodecError::UnexpectedType { want: types::INTEREST, got: outer.tlv_type });
    }
    let mut body = outer.value;
    let name_el = tlv::TlvElement::decode(&mut body)?;
    if name_el.tlv_type != types::NAME {
        return Err(CodecError::UnexpectedType { want: types::NAME, got: name_el.tlv_type });
    }
    Ok(body)
}

pub fn get_name(block: &SharedBlock) -> Result<Name, CodecError> {
    let mut cursor = block.as_bytes().clone();
    let outer = tlv::TlvElement::decode(&mut cursor)?;
    if outer.tlv_type != types::INTEREST {
        return Err(CodecError::UnexpectedType { want: types::INTEREST, got: outer.tlv_type });
    }
    let mut body = outer.value;
    let name_el = tlv::TlvElement::decode(&mut body)?;
    if name_el.tlv_type != types::NAME {
        return Err(CodecError::UnexpectedType { want: types::NAME, got: name_el.tlv_type });
    }
    Name::parse_components(name_el.value)
}

/// Skips an optional `SELECTORS` element at the front of `body`.
fn skip_selectors(mut body: Bytes) -> Result<Bytes, CodecError> {
    if body.is_empty() {
        return Err(CodecError::Truncated);
    }
    let (peek_type, _) = tlv::decode_varnum(&body)?;
    if peek_type == types::SELECTORS {
        let _ = tlv::TlvElement::decode(&mut body)?;
    }
    Ok(body)
}

pub fn get_nonce(block: &SharedBlock) -> Result<u32, CodecError> {
    let body = after_name(block)?;
    let mut body = skip_selectors(body)?;
    let nonce_el = tlv::TlvElement::decode(&mut body)?;
    if nonce_el.tlv_type != types::NONCE {
        return Err(CodecError::UnexpectedType { want: types::NONCE, got: nonce_el.tlv_type });
    }
    if nonce_el.value.len() != 4 {
        return Err(CodecError::InvalidLength);
    }
    let mut n = [0u8; 4];
    n.copy_from_slice(&nonce_el.value);
    Ok(u32::from_be_bytes(n))
}

pub fn get_lifetime_ms(block: &SharedBlock) -> Result<u64, CodecError> {
    let body = after_name(block)?;
    let mut body = skip_selectors(body)?;
    let _nonce_el = tlv::TlvElement::decode(&mut body)?;
    let lifetime_el = tlv::TlvElement::decode(&mut body)?;
    if lifetime_el.tlv_type != types::INTEREST_LIFETIME {
        return Err(CodecError::UnexpectedType {
            want: types::INTEREST_LIFETIME,
            got: lifetime_el.tlv_type,
        });
    }
    tlv::decode_nonneg_integer(&lifetime_el.value)
}
