// ABOUTME: Time-ordered log message queues buffering out-of-order arrivals.
// ABOUTME: Delay-windowed variant for tailing, immediate-drain variant for one-shot queries.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::LogMessage;

/// Returned by [`SortedMessageQueue::next_timestamp`] when the queue is
/// empty: no held message can become eligible before this.
pub const NO_PENDING_TIMESTAMP: i64 = i64::MAX;

type NanoClock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

struct HeldMessage {
    message: LogMessage,
    /// Wall clock time (nanoseconds since epoch) at which the message
    /// becomes eligible for emission.
    available_at: i64,
}

/// Buffers log messages and releases them in timestamp order after a fixed
/// delay window.
///
/// Messages arrive from the transport in arbitrary order. Each push records
/// an eligibility time of arrival + delay window; insertion keeps the buffer
/// sorted by message timestamp, so as long as arrival skew stays inside the
/// window, pops come out chronologically. The queue does not enforce the
/// delay itself - callers poll [`next_timestamp`](Self::next_timestamp)
/// before [`pop`](Self::pop).
pub struct SortedMessageQueue {
    buffer_delay: Duration,
    items: Mutex<Vec<HeldMessage>>,
    clock: NanoClock,
}

impl SortedMessageQueue {
    pub fn new(buffer_delay: Duration) -> Self {
        Self::with_clock(buffer_delay, Arc::new(system_now_nanos))
    }

    pub(crate) fn with_clock(buffer_delay: Duration, clock: NanoClock) -> Self {
        Self {
            buffer_delay,
            items: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Insert a message, keeping the buffer sorted by message timestamp.
    /// Equal timestamps preserve push order.
    pub fn push(&self, message: LogMessage) {
        let available_at = (self.clock)() + self.buffer_delay.as_nanos() as i64;
        let mut items = self.items.lock();
        let pos = items.partition_point(|held| held.message.timestamp <= message.timestamp);
        items.insert(
            pos,
            HeldMessage {
                message,
                available_at,
            },
        );
    }

    /// Remove and return the message with the smallest timestamp.
    pub fn pop(&self) -> Option<LogMessage> {
        let mut items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        Some(items.remove(0).message)
    }

    /// Eligibility time of the head message, or [`NO_PENDING_TIMESTAMP`]
    /// when empty.
    pub fn next_timestamp(&self) -> i64 {
        self.items
            .lock()
            .first()
            .map(|held| held.available_at)
            .unwrap_or(NO_PENDING_TIMESTAMP)
    }

    /// Current wall clock reading on the queue's clock.
    pub fn now_nanos(&self) -> i64 {
        (self.clock)()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

/// Accumulates log messages and drains them all at once in timestamp order.
///
/// Backs one-shot queries where the full message set is already known: no
/// delay window, just a stable sort at drain time.
#[derive(Default)]
pub struct BufferedMessageQueue {
    items: Mutex<Vec<LogMessage>>,
}

impl BufferedMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: LogMessage) {
        self.items.lock().push(message);
    }

    /// Stable-sort everything pushed so far by timestamp and feed it to the
    /// sink, emptying the queue. A no-op on an empty queue. Pushes that race
    /// with a drain land in the next one.
    ///
    /// The sink runs outside the lock so a slow consumer never blocks
    /// ingestion.
    pub fn drain_sorted(&self, mut sink: impl FnMut(LogMessage)) {
        let mut drained = std::mem::take(&mut *self.items.lock());
        drained.sort_by_key(|message| message.timestamp);
        for message in drained {
            sink(message);
        }
    }
}
