//! Reference-counted immutable byte buffers.
//!
//! `bytes::Bytes` already gives us exactly the semantics the source's
//! hand-rolled shared blocks were built for: cheap `Clone` (an `Arc` bump),
//! no interior mutability, and a `Drop` that releases the backing storage
//! when the last holder goes away. `SharedBlock` is a thin newtype over it
//! so call sites read as "a complete wire element", not "some bytes".

use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedBlock(Bytes);

impl SharedBlock {
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn from_vec(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The outer TLV type of this block, i.e. the first varnum on the wire.
    pub fn tlv_type(&self) -> Result<u64, crate::error::CodecError> {
        let (t, _) = crate::tlv::decode_varnum(&self.0)?;
        Ok(t)
    }
}

impl From<Bytes> for SharedBlock {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for SharedBlock {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
