//! Error types for wire decoding

use thiserror::Error;

use super::varint::VarintError;

/// Errors surfaced to the frame assembler.
///
/// Most malformed input is consumed silently by the resync heuristics; only
/// failures that abort a whole frame end up here.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame length prefix unreadable")]
    BadLengthPrefix(#[from] VarintError),

    #[error("frame shorter than the minimum message ({len} bytes)")]
    FrameTooShort { len: usize },
}
