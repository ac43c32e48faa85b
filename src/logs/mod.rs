// ABOUTME: Log retrieval and ordering pipeline.
// ABOUTME: Consumer port, time-ordered queues, and the orchestrating repository.

mod consumer;
mod queue;
mod repository;

pub use consumer::{ConnectCallback, ConsumerError, LogConsumer, LogStream};
pub use queue::{BufferedMessageQueue, NO_PENDING_TIMESTAMP, SortedMessageQueue};
pub use repository::{LogError, LogsRepository};
