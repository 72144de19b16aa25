//! In-memory link used by tests to capture wire traffic and script faults.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::transport::WireLink;
use crate::{Error, Result};

#[derive(Default)]
struct Captured {
    bytes: Vec<u8>,
    write_lens: Vec<usize>,
    flushes: usize,
}

/// Shared handle onto a [`FakeLink`]'s capture buffer. The link itself is
/// moved into the transport; the handle stays with the test.
#[derive(Clone, Default)]
pub struct FakeLog {
    captured: Arc<Mutex<Captured>>,
    fail_writes: Arc<AtomicUsize>,
}

impl FakeLog {
    /// Everything written so far, writes concatenated in order.
    pub fn bytes(&self) -> Vec<u8> {
        self.locked().bytes.clone()
    }

    /// Length of each individual write call.
    pub fn write_lens(&self) -> Vec<usize> {
        self.locked().write_lens.clone()
    }

    pub fn flushes(&self) -> usize {
        self.locked().flushes
    }

    pub fn clear(&self) {
        let mut captured = self.locked();
        captured.bytes.clear();
        captured.write_lens.clear();
        captured.flushes = 0;
    }

    /// Make the next `n` write calls fail with a broken-pipe error.
    pub fn fail_next_writes(&self, n: usize) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Captured> {
        match self.captured.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Default)]
pub struct FakeLink {
    log: FakeLog,
}

impl FakeLink {
    pub fn new() -> (Self, FakeLog) {
        let log = FakeLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl WireLink for FakeLink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let pending = self.log.fail_writes.load(Ordering::SeqCst);
        if pending > 0 {
            self.log.fail_writes.store(pending - 1, Ordering::SeqCst);
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        let mut captured = self.log.locked();
        captured.bytes.extend_from_slice(bytes);
        captured.write_lens.push(bytes.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.log.locked().flushes += 1;
        Ok(())
    }
}
