//! Inbound free-text commands from the companion app.
//!
//! The BLE callback context produces, the roast control loop consumes.
//! Commands are opaque here (`PRESET1`, `ABORT`, ...); only the control
//! loop interprets them.
//!
//! ```text
//! ┌──────────────┐  on_command_write  ┌──────────────┐  dequeue  ┌──────────────┐
//! │  BLE stack   │──────────────────▶│ CommandQueue │─────────▶│ Control loop │
//! │  (callback)  │                    │   (FIFO)     │           │  (consumer)  │
//! └──────────────┘                    └──────────────┘           └──────────────┘
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};
use std::collections::VecDeque;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, warn};

use crate::error::GattError;
use crate::gatt::MAX_ATTR_LEN;

/// What happened to a command write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingress {
    /// Appended; carries the queue depth after the push.
    Queued(usize),
    /// Nothing left after stripping the line terminator.
    Empty,
}

/// FIFO of commands awaiting the control loop.
pub struct CommandQueue {
    inner: Mutex<CriticalSectionRawMutex, RefCell<VecDeque<String>>>,
    limit: Option<usize>,
    dropped: AtomicU32,
}

impl CommandQueue {
    /// Unbounded queue.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// `Some(n)` keeps at most `n` commands, dropping the oldest on overflow.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(VecDeque::new())),
            limit: limit.map(|n| n.max(1)),
            dropped: AtomicU32::new(0),
        }
    }

    /// Handle a write to the command characteristic.
    pub fn on_command_write(&self, raw: &[u8]) -> Result<Ingress, GattError> {
        if raw.len() > MAX_ATTR_LEN {
            return Err(GattError::DataTooLong);
        }
        let text = core::str::from_utf8(raw).map_err(|_| GattError::InvalidUtf8)?;
        let command = strip_line_terminator(text);
        if command.is_empty() {
            return Ok(Ingress::Empty);
        }

        debug!("CMD: received '{}'", command);
        let (depth, evicted) = self.inner.lock(|q| {
            let mut q = q.borrow_mut();
            let mut evicted = None;
            if let Some(limit) = self.limit {
                if q.len() >= limit {
                    evicted = q.pop_front();
                }
            }
            q.push_back(command.to_owned());
            (q.len(), evicted)
        });

        if let Some(old) = evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("CMD: queue full, dropped oldest '{}'", old);
        }
        Ok(Ingress::Queued(depth))
    }

    /// Oldest pending command, if any. Never blocks.
    pub fn dequeue(&self) -> Option<String> {
        self.inner.lock(|q| q.borrow_mut().pop_front())
    }

    /// Pass every pending command to `handler`, oldest first.
    pub fn drain(&self, mut handler: impl FnMut(String)) {
        while let Some(cmd) = self.dequeue() {
            handler(cmd);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commands evicted by the overflow policy since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove one trailing `\n`, `\r\n` or `\r`.
fn strip_line_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .or_else(|| text.strip_suffix('\r'))
        .unwrap_or(text)
}
