pub mod sqs;

#[cfg(test)]
pub mod memory;

use crate::common::error::Result;
use async_trait::async_trait;

/// Approximate message counts for a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub visible: u64,
    pub in_flight: u64,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publishes `body` to the named FIFO queue under `group_id`, returning the message id.
    async fn send(&self, queue_name: &str, body: &str, group_id: &str) -> Result<String>;

    async fn depth(&self, queue_name: &str) -> Result<QueueDepth>;
}
