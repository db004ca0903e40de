//! Signing and verification for the three supported Data signature
//! algorithms: `DIGEST_SHA256`, `HMAC_SHA256`, `ECDSA_SHA256` (secp256r1).

use hmac::{Hmac, Mac};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;
use crate::tlv::sig_types;

type HmacSha256 = Hmac<Sha256>;

/// The key material a signer presents when creating a Data packet.
pub enum SigningKeyMaterial {
    None,
    Hmac(Vec<u8>),
    /// Raw 32-byte secp256r1 private scalar.
    EcdsaPrivate([u8; 32]),
}

/// The key material a verifier presents when checking a signature.
pub enum VerifyKeyMaterial {
    None,
    Hmac(Vec<u8>),
    /// Raw uncompressed 64-byte public key (`x || y`), no `0x04` SEC1 prefix.
    EcdsaPublic([u8; 64]),
}

/// Computes the SignatureValue bytes for `region` under `algorithm`.
///
/// Preconditions enforced here, matching the source's `ndn_data_create2`:
/// the ECDSA key must be exactly 32 bytes, the HMAC key must be non-empty,
/// and `DIGEST_SHA256` rejects any key at all.
pub fn sign(algorithm: u8, key: &SigningKeyMaterial, region: &[u8]) -> Result<Vec<u8>, CryptoError> {
    match algorithm {
        sig_types::DIGEST_SHA256 => {
            if !matches!(key, SigningKeyMaterial::None) {
                return Err(CryptoError::InvalidKey);
            }
            Ok(Sha256::digest(region).to_vec())
        }
        sig_types::HMAC_SHA256 => {
            let SigningKeyMaterial::Hmac(k) = key else { return Err(CryptoError::InvalidKey) };
            if k.is_empty() {
                return Err(CryptoError::InvalidKey);
            }
            let mut mac = HmacSha256::new_from_slice(k).map_err(|_| CryptoError::InvalidKey)?;
            mac.update(region);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        sig_types::ECDSA_SHA256 => {
            let SigningKeyMaterial::EcdsaPrivate(bytes) = key else {
                return Err(CryptoError::InvalidKey);
            };
            let signing_key =
                SigningKey::from_bytes(bytes.into()).map_err(|_| CryptoError::InvalidKey)?;
            let signature: Signature = signing_key.sign(region);
            Ok(signature.to_bytes().to_vec())
        }
        other => Err(CryptoError::UnsupportedAlgorithm(other)),
    }
}

/// Verifies `signature` over `region` for the given algorithm and key.
/// Digest/HMAC comparisons are constant-time via the RustCrypto traits.
pub fn verify(
    algorithm: u8,
    key: &VerifyKeyMaterial,
    region: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    match algorithm {
        sig_types::DIGEST_SHA256 => {
            let expected = Sha256::digest(region);
            if expected.as_slice() == signature {
                Ok(())
            } else {
                Err(CryptoError::VerifyFailed)
            }
        }
        sig_types::HMAC_SHA256 => {
            let VerifyKeyMaterial::Hmac(k) = key else { return Err(CryptoError::InvalidKey) };
            let mut mac = HmacSha256::new_from_slice(k).map_err(|_| CryptoError::InvalidKey)?;
            mac.update(region);
            mac.verify_slice(signature).map_err(|_| CryptoError::VerifyFailed)
        }
        sig_types::ECDSA_SHA256 => {
            let VerifyKeyMaterial::EcdsaPublic(pubkey) = key else {
                return Err(CryptoError::InvalidKey);
            };
            let mut sec1 = [0u8; 65];
            sec1[0] = 0x04;
            sec1[1..].copy_from_slice(pubkey);
            let verifying_key =
                VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::InvalidKey)?;
            let signature = Signature::from_slice(signature).map_err(|_| CryptoError::VerifyFailed)?;
            verifying_key
                .verify(region, &signature)
                .map_err(|_| CryptoError::VerifyFailed)
        }
        other => Err(CryptoError::UnsupportedAlgorithm(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_sign_verify() {
        let region = b"hello ndn";
        let sig = sign(sig_types::DIGEST_SHA256, &SigningKeyMaterial::None, region).unwrap();
        verify(sig_types::DIGEST_SHA256, &VerifyKeyMaterial::None, region, &sig).unwrap();
    }

    #[test]
    fn digest_tamper_detected() {
        let region = b"hello ndn";
        let mut sig = sign(sig_types::DIGEST_SHA256, &SigningKeyMaterial::None, region).unwrap();
        sig[0] ^= 0xff;
        assert_eq!(
            verify(sig_types::DIGEST_SHA256, &VerifyKeyMaterial::None, region, &sig),
            Err(CryptoError::VerifyFailed)
        );
    }

    #[test]
    fn hmac_sign_verify() {
        let region = b"signed region bytes";
        let key = vec![0xa1, 0xb9, 0xc8, 0xd7, 0xe0, 0xf3, 0xf2, 0xe4];
        let sig = sign(sig_types::HMAC_SHA256, &SigningKeyMaterial::Hmac(key.clone()), region).unwrap();
        verify(sig_types::HMAC_SHA256, &VerifyKeyMaterial::Hmac(key), region, &sig).unwrap();
    }

    #[test]
    fn hmac_rejects_empty_key() {
        let region = b"x";
        assert_eq!(
            sign(sig_types::HMAC_SHA256, &SigningKeyMaterial::Hmac(vec![]), region),
            Err(CryptoError::InvalidKey)
        );
    }

    #[test]
    fn ecdsa_sign_verify() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32].into()).unwrap();
        let verifying_key = VerifyingKey::from(&signing_key);
        let point = verifying_key.to_encoded_point(false);
        let mut pubkey = [0u8; 64];
        pubkey.copy_from_slice(&point.as_bytes()[1..]);

        let region = b"ecdsa signed region";
        let sig = sign(
            sig_types::ECDSA_SHA256,
            &SigningKeyMaterial::EcdsaPrivate([7u8; 32]),
            region,
        )
        .unwrap();
        verify(
            sig_types::ECDSA_SHA256,
            &VerifyKeyMaterial::EcdsaPublic(pubkey),
            region,
            &sig,
        )
        .unwrap();
    }

    #[test]
    fn unknown_algorithm_rejected() {
        assert_eq!(
            verify(0xee, &VerifyKeyMaterial::None, b"x", b"y"),
            Err(CryptoError::UnsupportedAlgorithm(0xee))
        );
    }
}
