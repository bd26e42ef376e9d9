use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Ordered fragments of one recording run
///
/// A run starts at `start()` and survives pause/resume. Every run gets a new
/// id so a sink left over from an earlier run can never write into a later one.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    run: u64,
    closed: bool,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current run id
    pub fn run(&self) -> u64 {
        self.run
    }

    /// Discard all fragments and open a new run
    pub fn begin_run(&mut self) -> u64 {
        self.chunks.clear();
        self.run += 1;
        self.run
    }

    /// Discard all fragments without opening a new run
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Append a fragment for `run`; returns whether it was kept
    pub fn push(&mut self, run: u64, data: Vec<u8>) -> bool {
        if self.closed || run != self.run || data.is_empty() {
            return false;
        }

        self.chunks.push(data);
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// All fragments in emission order as one byte vector
    pub fn concat(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.total_bytes());
        for chunk in &self.chunks {
            data.extend_from_slice(chunk);
        }
        data
    }

    /// Drop all fragments and refuse any further delivery
    pub fn close(&mut self) {
        self.closed = true;
        self.chunks.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Data-available callback handed to an encoder
///
/// Holds only a weak reference: once the controller is gone, deliveries are
/// silently dropped.
#[derive(Debug, Clone)]
pub struct ChunkSink {
    buffer: Weak<Mutex<ChunkBuffer>>,
    run: u64,
}

impl ChunkSink {
    /// A sink writing into the buffer's current run
    pub fn new(buffer: &Arc<Mutex<ChunkBuffer>>) -> Self {
        let run = buffer.lock().run();
        Self {
            buffer: Arc::downgrade(buffer),
            run,
        }
    }

    /// A sink that discards everything
    pub fn detached() -> Self {
        Self {
            buffer: Weak::new(),
            run: 0,
        }
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Deliver one fragment; returns whether the buffer kept it
    pub fn deliver(&self, data: Vec<u8>) -> bool {
        let Some(buffer) = self.buffer.upgrade() else {
            debug!("Dropping {} bytes: recorder is gone", data.len());
            return false;
        };

        let len = data.len();
        let kept = buffer.lock().push(self.run, data);
        if !kept {
            debug!("Discarded fragment of {} bytes (run {})", len, self.run);
        }
        kept
    }
}
