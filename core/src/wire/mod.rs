//! Byte-stream reassembly and protocol decoding.

mod assembler;
mod decoder;
mod error;
mod ring_buffer;
mod varint;

#[cfg(test)]
mod decoder_tests;

pub use assembler::{FrameAssembler, FrameSink, FRAME_DELIMITER};
pub use decoder::ProtocolDecoder;
pub use error::DecodeError;
pub use ring_buffer::RingBuffer;
pub use varint::{encode_varint, read_varint, Varint, VarintError};
