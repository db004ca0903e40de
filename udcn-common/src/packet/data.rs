//! Data packet encoding, signing and verification.
//!
//! Wire shape: `DATA || name || metainfo || content || signature_info ||
//! signature_value`. The signed region is everything between the outer
//! `DATA` header and the end of `signature_info`, matching the source's
//! `ndn_data_create2`/`ndn_data_verify_signature` byte-offset math exactly.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

use crate::block::SharedBlock;
use crate::crypto::{self, SigningKeyMaterial, VerifyKeyMaterial};
use crate::error::{CodecError, CryptoError};
use crate::metainfo::Metainfo;
use crate::name::Name;
use crate::tlv::{self, sig_types, types};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DataError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// The fixed 5-byte `SignatureInfo` element: `{SIG_INFO, 03, SIG_TYPE, 01, algorithm}`.
fn encode_signature_info(algorithm: u8) -> [u8; 5] {
    [types::SIGNATURE_INFO as u8, 0x03, types::SIGNATURE_TYPE as u8, 0x01, algorithm]
}

fn signature_value_len(algorithm: u8) -> Result<usize, CryptoError> {
    match algorithm {
        sig_types::DIGEST_SHA256 | sig_types::HMAC_SHA256 => Ok(32),
        sig_types::ECDSA_SHA256 => Ok(64),
        other => Err(CryptoError::UnsupportedAlgorithm(other)),
    }
}

/// Builds, signs and frames a complete Data block.
pub fn create(
    name: &Name,
    metainfo: &Metainfo,
    content: &[u8],
    algorithm: u8,
    key: &SigningKeyMaterial,
) -> Result<SharedBlock, DataError> {
    let sig_len = signature_value_len(algorithm)?;

    let name_block = name.encode();
    let metainfo_block = metainfo.encode();

    let mut content_block = BytesMut::with_capacity(tlv::block_total_length(types::CONTENT, content.len()));
    tlv::encode_varnum(types::CONTENT, &mut content_block);
    tlv::encode_varnum(content.len() as u64, &mut content_block);
    content_block.extend_from_slice(content);

    let signature_info = encode_signature_info(algorithm);

    let dl = name_block.len()
        + metainfo_block.len()
        + content_block.len()
        + signature_info.len()
        + tlv::block_total_length(types::SIGNATURE_VALUE, sig_len);

    let mut signed_region = BytesMut::with_capacity(dl - tlv::block_total_length(types::SIGNATURE_VALUE, sig_len));
    signed_region.unsplit(name_block);
    signed_region.unsplit(metainfo_block);
    signed_region.unsplit(content_block);
    signed_region.extend_from_slice(&signature_info);

    let signature = crypto::sign(algorithm, key, &signed_region)?;
    if signature.len() != sig_len {
        return Err(DataError::Crypto(CryptoError::InvalidKey));
    }

    let mut out = BytesMut::with_capacity(tlv::block_total_length(types::DATA, dl));
    tlv::encode_varnum(types::DATA, &mut out);
    tlv::encode_varnum(dl as u64, &mut out);
    out.unsplit(signed_region);
    tlv::encode_varnum(types::SIGNATURE_VALUE, &mut out);
    tlv::encode_varnum(signature.len() as u64, &mut out);
    out.extend_from_slice(&signature);

    Ok(SharedBlock::new(out.freeze()))
}

struct Parsed {
    signed_region: Bytes,
    algorithm: u8,
    signature: Bytes,
    name_value: Bytes,
    metainfo_value: Bytes,
    content_value: Bytes,
}

fn parse(block: &SharedBlock) -> Result<Parsed, CodecError> {
    let mut cursor = block.as_bytes().clone();
    let outer = tlv::TlvElement::decode(&mut cursor)?;
    if outer.tlv_type != types::DATA {
        return Err(CodecError::UnexpectedType { want: types::DATA, got: outer.tlv_type });
    }
    let body = outer.value;
    let body_len = body.remaining();
    let mut walk = body.clone();

    let before = walk.remaining();
    let name_el = tlv::TlvElement::decode(&mut walk)?;
    if name_el.tlv_type != types::NAME {
        return Err(CodecError::UnexpectedType { want: types::NAME, got: name_el.tlv_type });
    }
    let name_end = before - walk.remaining();

    let before = walk.remaining();
    let metainfo_el = tlv::TlvElement::decode(&mut walk)?;
    if metainfo_el.tlv_type != types::META_INFO {
        return Err(CodecError::UnexpectedType { want: types::META_INFO, got: metainfo_el.tlv_type });
    }
    let metainfo_end = name_end + (before - walk.remaining());

    let before = walk.remaining();
    let content_el = tlv::TlvElement::decode(&mut walk)?;
    if content_el.tlv_type != types::CONTENT {
        return Err(CodecError::UnexpectedType { want: types::CONTENT, got: content_el.tlv_type });
    }
    let content_end = metainfo_end + (before - walk.remaining());

    let before = walk.remaining();
    let siginfo_el = tlv::TlvElement::decode(&mut walk)?;
    if siginfo_el.tlv_type != types::SIGNATURE_INFO {
        return Err(CodecError::UnexpectedType { want: types::SIGNATURE_INFO, got: siginfo_el.tlv_type });
    }
    let siginfo_end = content_end + (before - walk.remaining());
    let _ = body_len;

    let mut sig_type_cursor = siginfo_el.value;
    let sig_type_el = tlv::TlvElement::decode(&mut sig_type_cursor)?;
    if sig_type_el.tlv_type != types::SIGNATURE_TYPE {
        return Err(CodecError::UnexpectedType { want: types::SIGNATURE_TYPE, got: sig_type_el.tlv_type });
    }
    if sig_type_el.value.len() != 1 {
        return Err(CodecError::InvalidLength);
    }
    let algorithm = sig_type_el.value[0];

    let sigvalue_el = tlv::TlvElement::decode(&mut walk)?;
    if sigvalue_el.tlv_type != types::SIGNATURE_VALUE {
        return Err(CodecError::UnexpectedType { want: types::SIGNATURE_VALUE, got: sigvalue_el.tlv_type });
    }

    Ok(Parsed {
        signed_region: body.slice(0..siginfo_end),
        algorithm,
        signature: sigvalue_el.value,
        name_value: name_el.value,
        metainfo_value: metainfo_el.value,
        content_value: content_el.value,
    })
}

/// Re-derives the signature over the signed region and compares it against
/// the embedded `SignatureValue`. Unknown algorithms fail closed.
pub fn verify_signature(block: &SharedBlock, key: &VerifyKeyMaterial) -> Result<(), DataError> {
    let parsed = parse(block)?;
    let key = match (parsed.algorithm, key) {
        (sig_types::DIGEST_SHA256, _) => VerifyKeyMaterial::None,
        (sig_types::HMAC_SHA256, VerifyKeyMaterial::Hmac(k)) => VerifyKeyMaterial::Hmac(k.clone()),
        (sig_types::ECDSA_SHA256, VerifyKeyMaterial::EcdsaPublic(k)) => VerifyKeyMaterial::EcdsaPublic(*k),
        (sig_types::HMAC_SHA256 | sig_types::ECDSA_SHA256, _) => {
            return Err(DataError::Crypto(CryptoError::InvalidKey))
        }
        (other, _) => return Err(DataError::Crypto(CryptoError::UnsupportedAlgorithm(other))),
    };
    crypto::verify(parsed.algorithm, &key, &parsed.signed_region, &parsed.signature)
        .map_err(DataError::Crypto)
}

pub fn get_name(block: &SharedBlock) -> Result<Name, CodecError> {
    Name::parse_components(parse(block)?.name_value)
}

pub fn get_metainfo(block: &SharedBlock) -> Result<Metainfo, CodecError> {
    Metainfo::parse_value(parse(block)?.metainfo_value)
}

pub fn get_content(block: &SharedBlock) -> Result<Bytes, CodecError> {
    Ok(parse(block)?.content_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{SigningKeyMaterial, VerifyKeyMaterial};

    fn s2_inputs() -> (Name, Metainfo, Vec<u8>) {
        let name = Name::from_uri("/a/b/c/d").unwrap();
        let metainfo = Metainfo { content_type: Some(0), freshness_period_ms: Some(0x07102034) };
        let content = vec![0x91, 0x82, 0x73, 0x64, 0x55, 0x44, 0x33, 0x22, 0x10];
        (name, metainfo, content)
    }

    #[test]
    fn s2_digest_block_shape() {
        let (name, metainfo, content) = s2_inputs();
        let block =
            create(&name, &metainfo, &content, sig_types::DIGEST_SHA256, &SigningKeyMaterial::None).unwrap();
        assert_eq!(block.len(), 77);
        assert_eq!(block.as_slice()[0], types::DATA as u8);

        use sha2::{Digest, Sha256};
        let expected = Sha256::digest(&block.as_slice()[2..43]);
        assert_eq!(&block.as_slice()[45..77], expected.as_slice());
    }

    #[test]
    fn s3_hmac_verify_and_tamper() {
        let (name, metainfo, content) = s2_inputs();
        let key = vec![0xa1, 0xb9, 0xc8, 0xd7, 0xe0, 0xf3, 0xf2, 0xe4];
        let block = create(
            &name,
            &metainfo,
            &content,
            sig_types::HMAC_SHA256,
            &SigningKeyMaterial::Hmac(key.clone()),
        )
        .unwrap();

        verify_signature(&block, &VerifyKeyMaterial::Hmac(key.clone())).unwrap();

        let mut tampered = block.as_slice().to_vec();
        tampered[70] ^= 0xff;
        let tampered = SharedBlock::from_vec(tampered);
        assert!(verify_signature(&tampered, &VerifyKeyMaterial::Hmac(key)).is_err());
    }

    #[test]
    fn ecdsa_verify_and_tamper() {
        use p256::ecdsa::SigningKey;
        let signing_key = SigningKey::from_bytes(&[11u8; 32].into()).unwrap();
        let verifying_key = p256::ecdsa::VerifyingKey::from(&signing_key);
        let point = verifying_key.to_encoded_point(false);
        let mut pubkey = [0u8; 64];
        pubkey.copy_from_slice(&point.as_bytes()[1..]);

        let (name, metainfo, content) = s2_inputs();
        let block = create(
            &name,
            &metainfo,
            &content,
            sig_types::ECDSA_SHA256,
            &SigningKeyMaterial::EcdsaPrivate([11u8; 32]),
        )
        .unwrap();
        verify_signature(&block, &VerifyKeyMaterial::EcdsaPublic(pubkey)).unwrap();

        let mut tampered = block.as_slice().to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xff;
        let tampered = SharedBlock::from_vec(tampered);
        assert!(verify_signature(&tampered, &VerifyKeyMaterial::EcdsaPublic(pubkey)).is_err());
    }

    #[test]
    fn accessors_round_trip() {
        let (name, metainfo, content) = s2_inputs();
        let block =
            create(&name, &metainfo, &content, sig_types::DIGEST_SHA256, &SigningKeyMaterial::None).unwrap();
        assert_eq!(get_name(&block).unwrap(), name);
        assert_eq!(get_metainfo(&block).unwrap(), metainfo);
        assert_eq!(get_content(&block).unwrap(), Bytes::from(content));
    }
}
