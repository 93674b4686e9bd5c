//! Reassembles delimiter-terminated frames out of the raw TCP byte stream.

use tracing::warn;

use super::error::DecodeError;
use super::ring_buffer::RingBuffer;

/// Literal that terminates every frame on the wire.
pub const FRAME_DELIMITER: [u8; 3] = [0x06, 0x00, 0x36];

/// Receives completed frames from the assembler.
pub trait FrameSink {
    fn on_frame(&self, frame: &[u8]) -> Result<(), DecodeError>;
}

/// Feeds chunks into the ring buffer and emits one frame per delimiter hit.
///
/// A failure while decoding one frame is logged and never stops the scan for
/// the next delimiter.
pub struct FrameAssembler<S: FrameSink> {
    buffer: RingBuffer,
    sink: S,
}

impl<S: FrameSink> FrameAssembler<S> {
    pub fn new(sink: S, ring_capacity: usize) -> Self {
        Self {
            buffer: RingBuffer::new(ring_capacity),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Buffered bytes awaiting a delimiter.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn process_chunk(&self, chunk: &[u8]) {
        self.buffer.append(chunk);
        loop {
            let Some(idx) = self.buffer.index_of(&FRAME_DELIMITER) else {
                // Frame still incomplete, wait for more input
                break;
            };
            let frame = self.buffer.read_and_discard(idx + FRAME_DELIMITER.len());
            if frame.is_empty() {
                continue;
            }
            if let Err(err) = self.sink.on_frame(&frame) {
                warn!(error = %err, frame_len = frame.len(), "frame dropped by decoder");
            }
        }
    }

    /// Discard any partially assembled bytes (fresh observation session).
    pub fn reset(&self) {
        self.buffer.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CollectingSink {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl FrameSink for CollectingSink {
        fn on_frame(&self, frame: &[u8]) -> Result<(), DecodeError> {
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }
    }

    fn stream_with_frames(payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for p in payloads {
            out.extend_from_slice(p);
            out.extend_from_slice(&FRAME_DELIMITER);
        }
        out
    }

    #[test]
    fn emits_one_frame_per_delimiter_regardless_of_chunking() {
        let stream = stream_with_frames(&[b"first", b"second payload", b"", b"x"]);

        // Split the same stream at every possible boundary
        for split in 0..=stream.len() {
            let sink = CollectingSink::default();
            let assembler = FrameAssembler::new(sink, 1024);
            assembler.process_chunk(&stream[..split]);
            assembler.process_chunk(&stream[split..]);

            let frames = assembler.sink().frames.lock().unwrap();
            assert_eq!(frames.len(), 4, "split at {split}");
            assert_eq!(frames[0], stream_with_frames(&[b"first"]));
            for frame in frames.iter() {
                assert!(frame.ends_with(&FRAME_DELIMITER));
            }
        }
    }

    #[test]
    fn frames_arrive_in_stream_order() {
        let sink = CollectingSink::default();
        let assembler = FrameAssembler::new(sink, 1024);
        for byte in stream_with_frames(&[b"a", b"bb", b"ccc"]) {
            assembler.process_chunk(&[byte]);
        }
        let frames = assembler.sink().frames.lock().unwrap();
        let payloads: Vec<Vec<u8>> = frames
            .iter()
            .map(|f| f[..f.len() - FRAME_DELIMITER.len()].to_vec())
            .collect();
        assert_eq!(payloads, vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]);
    }

    #[test]
    fn incomplete_tail_stays_buffered() {
        let sink = CollectingSink::default();
        let assembler = FrameAssembler::new(sink, 1024);
        assembler.process_chunk(b"partial\x06\x00");
        assert!(assembler.sink().frames.lock().unwrap().is_empty());
        assert_eq!(assembler.pending_bytes(), 9);
        assembler.process_chunk(&[0x36]);
        assert_eq!(assembler.sink().frames.lock().unwrap().len(), 1);
        assert_eq!(assembler.pending_bytes(), 0);
    }
}
