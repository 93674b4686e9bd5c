//! Fixed-capacity circular byte store feeding the frame assembler.
//!
//! The capture producer and the consumer thread touch this concurrently, so
//! every operation runs inside a single critical section. Overflow is handled
//! by a full, logged reset rather than partial overwrites.

use std::sync::Mutex;

use memchr::memmem;
use tracing::{error, info, warn};

/// Default reassembly capacity (10 MiB).
pub const DEFAULT_CAPACITY: usize = 10 * 1024 * 1024;

pub struct RingBuffer {
    inner: Mutex<Inner>,
}

struct Inner {
    buf: Vec<u8>,
    /// Physical index of the first unread byte.
    read: usize,
    /// Physical index of the next write position.
    write: usize,
    /// Bytes currently held.
    count: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                buf: vec![0; capacity],
                read: 0,
                write: 0,
                count: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.count).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append bytes, wrapping at the physical end of the buffer.
    ///
    /// If the data does not fit, the whole buffer is discarded and the loss is
    /// logged. There is no partial-overflow handling: a half-written stream
    /// would desync every later frame anyway.
    pub fn append(&self, data: &[u8]) {
        let Ok(mut g) = self.inner.lock() else { return };
        let capacity = g.buf.len();
        if g.count + data.len() > capacity {
            error!(
                held = g.count,
                incoming = data.len(),
                "ring buffer overflow, dropping all buffered bytes"
            );
            g.reset();
            return;
        }

        let write = g.write;
        let space_to_end = capacity - write;
        let head = data.len().min(space_to_end);
        g.buf[write..write + head].copy_from_slice(&data[..head]);
        if data.len() > head {
            let tail = data.len() - head;
            g.buf[..tail].copy_from_slice(&data[head..]);
        }

        g.write = (write + data.len()) % capacity;
        g.count += data.len();
    }

    /// Lowest logical offset (relative to the read cursor) where `pattern`
    /// occurs, matching across the physical wraparound boundary.
    pub fn index_of(&self, pattern: &[u8]) -> Option<usize> {
        let g = self.inner.lock().ok()?;
        let n = pattern.len();
        if n == 0 || g.count < n {
            return None;
        }
        let capacity = g.buf.len();

        if g.read + g.count <= capacity {
            return memmem::find(&g.buf[g.read..g.read + g.count], pattern);
        }

        // Wrapped: search the head run, then the seam, then the tail run.
        let head_len = capacity - g.read;
        let tail_len = g.count - head_len;
        let head = &g.buf[g.read..];

        if let Some(i) = memmem::find(head, pattern) {
            return Some(i);
        }

        let overlap = n - 1;
        let take_head = overlap.min(head_len);
        let take_tail = overlap.min(tail_len);
        let mut seam = Vec::with_capacity(take_head + take_tail);
        seam.extend_from_slice(&head[head_len - take_head..]);
        seam.extend_from_slice(&g.buf[..take_tail]);
        if let Some(i) = memmem::find(&seam, pattern) {
            return Some(head_len - take_head + i);
        }

        memmem::find(&g.buf[..tail_len], pattern).map(|i| head_len + i)
    }

    /// Copy out `length` logical bytes and advance the read cursor.
    /// Requesting more than is available is clamped to what is available.
    pub fn read_and_discard(&self, length: usize) -> Vec<u8> {
        let Ok(mut g) = self.inner.lock() else {
            return Vec::new();
        };
        if length == 0 {
            return Vec::new();
        }
        let take = if length > g.count {
            warn!(
                requested = length,
                available = g.count,
                "read past buffered data, clamping"
            );
            g.count
        } else {
            length
        };

        let capacity = g.buf.len();
        let mut out = vec![0u8; take];
        let space_to_end = capacity - g.read;
        let head = take.min(space_to_end);
        out[..head].copy_from_slice(&g.buf[g.read..g.read + head]);
        if take > head {
            out[head..].copy_from_slice(&g.buf[..take - head]);
        }

        g.read = (g.read + take) % capacity;
        g.count -= take;
        out
    }

    pub fn reset(&self) {
        if let Ok(mut g) = self.inner.lock() {
            g.reset();
        }
    }
}

impl Inner {
    fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
        self.count = 0;
        info!("ring buffer reset");
    }
}
