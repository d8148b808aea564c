//! Recording queue for tests.

use super::{MessageQueue, QueueDepth};
use crate::common::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub queue: String,
    pub body: String,
    pub group_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(&self, queue_name: &str, body: &str, group_id: &str) -> Result<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            queue: queue_name.to_string(),
            body: body.to_string(),
            group_id: group_id.to_string(),
        });
        Ok(format!("msg-{}", sent.len()))
    }

    async fn depth(&self, queue_name: &str) -> Result<QueueDepth> {
        let sent = self.sent.lock().unwrap();
        let visible = sent.iter().filter(|m| m.queue == queue_name).count() as u64;
        Ok(QueueDepth {
            visible,
            in_flight: 0,
        })
    }
}
