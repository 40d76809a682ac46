//! Cross-thread data ingestion.
//!
//! Producers on any thread push into an [`Inbox`]; the layout thread drains
//! it once per frame from a control's `ingest` hook. A pending `clear`
//! discards everything queued before it, so a producer can reset a view
//! without racing the consumer.

use std::{
    fmt,
    io::{Result as IoResult, Write},
    mem,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing_subscriber::fmt::{MakeWriter, fmt as subscriber_builder, format};

use crate::error::{Error, Result};

/// Queued work behind the inbox lock.
struct Pending<T> {
    /// Items pushed since the last drain or clear.
    items: Vec<T>,
    /// True if the consumer should drop its existing data first.
    clear: bool,
}

/// Shared inbox state.
struct Shared<T> {
    /// Queue.
    pending: Mutex<Pending<T>>,
    /// Cheap flag checked before taking the lock.
    signal: AtomicBool,
}

/// A multi-producer queue drained by the layout thread.
pub struct Inbox<T> {
    /// State shared between all clones.
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Inbox<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Inbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Inbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox")
            .field("pending", &self.has_pending())
            .finish()
    }
}

/// The result of draining an inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drained<T> {
    /// The consumer should discard its existing data before appending.
    pub clear: bool,
    /// Items in push order.
    pub items: Vec<T>,
}

impl<T> Drained<T> {
    /// True if the drain carried nothing.
    pub fn is_empty(&self) -> bool {
        !self.clear && self.items.is_empty()
    }
}

impl<T> Inbox<T> {
    /// An empty inbox.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(Pending {
                    items: Vec::new(),
                    clear: false,
                }),
                signal: AtomicBool::new(false),
            }),
        }
    }

    /// Lock the queue, recovering from poisoning: the queue is never left
    /// half-updated.
    fn lock(&self) -> MutexGuard<'_, Pending<T>> {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue one item.
    pub fn push(&self, item: T) {
        self.lock().items.push(item);
        self.shared.signal.store(true, Ordering::Release);
    }

    /// Queue several items at once.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let mut pending = self.lock();
        let before = pending.items.len();
        pending.items.extend(items);
        if pending.items.len() > before {
            self.shared.signal.store(true, Ordering::Release);
        }
    }

    /// Drop everything queued so far and tell the consumer to reset.
    pub fn clear(&self) {
        let mut pending = self.lock();
        pending.items.clear();
        pending.clear = true;
        self.shared.signal.store(true, Ordering::Release);
    }

    /// True if a drain would return something.
    pub fn has_pending(&self) -> bool {
        self.shared.signal.load(Ordering::Acquire)
    }

    /// Take everything queued.
    pub fn drain(&self) -> Drained<T> {
        if !self.has_pending() {
            return Drained {
                clear: false,
                items: Vec::new(),
            };
        }
        let mut pending = self.lock();
        self.shared.signal.store(false, Ordering::Release);
        Drained {
            clear: mem::take(&mut pending.clear),
            items: mem::take(&mut pending.items),
        }
    }
}

/// A `tracing` writer that feeds formatted log lines into an inbox.
///
/// Hand a clone to a log view and install the source as the global
/// subscriber's writer; events from any thread show up on the next frame.
#[derive(Clone, Debug, Default)]
pub struct LogSource {
    /// Destination for formatted lines.
    inbox: Inbox<String>,
}

impl LogSource {
    /// A source with an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// The inbox lines are delivered to.
    pub fn inbox(&self) -> Inbox<String> {
        self.inbox.clone()
    }

    /// Install a global `tracing` subscriber that writes here. Fails if a
    /// global subscriber is already set.
    pub fn install(&self) -> Result<()> {
        let event_format = format()
            .with_level(true)
            .with_line_number(true)
            .with_ansi(false)
            .without_time()
            .compact();
        subscriber_builder()
            .with_writer(self.clone())
            .event_format(event_format)
            .try_init()
            .map_err(|e| Error::Internal(format!("log subscriber: {e}")))
    }
}

impl<'a> MakeWriter<'a> for LogSource {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            inbox: self.inbox.clone(),
        }
    }
}

/// Writer handed to the subscriber for one event.
#[derive(Debug)]
pub struct LogWriter {
    /// Destination for formatted lines.
    inbox: Inbox<String>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inbox.extend(
            text.lines()
                .map(str::trim_end)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
