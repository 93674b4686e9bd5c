//! Little-endian base-128 varints as used by the wire protocol.

use thiserror::Error;

/// A varint never spans more than 5 bytes (32 bits of payload).
pub const MAX_VARINT_LEN: usize = 5;

/// Errors while reading a varint from a byte slice
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarintError {
    #[error("varint ran past the end of the buffer")]
    Unterminated,

    #[error("varint exceeds 32 bits")]
    Overflow,
}

/// Decoded value together with the number of bytes it occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Varint {
    pub value: u32,
    pub len: usize,
}

/// Read a varint starting at `offset`.
///
/// The continuation bit is 0x80; a sequence without a terminating byte or
/// one that would shift past 32 bits fails explicitly.
pub fn read_varint(bytes: &[u8], offset: usize) -> Result<Varint, VarintError> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    let mut count: usize = 0;
    loop {
        let Some(&b) = bytes.get(offset + count) else {
            return Err(VarintError::Unterminated);
        };
        count += 1;
        value |= u32::from(b & 0x7F) << shift;
        if b & 0x80 == 0 {
            return Ok(Varint { value, len: count });
        }
        shift += 7;
        if shift >= 32 {
            return Err(VarintError::Overflow);
        }
    }
}

/// Encode a value as a varint. Used to build byte-pattern keywords for the
/// corruption-recovery scan.
pub fn encode_varint(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    let mut v = value;
    while v > 0x7F {
        out.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
    out
}
