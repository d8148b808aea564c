use super::{MessageQueue, QueueDepth};
use crate::common::error::{DeepSeaError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use tracing::debug;

fn queue_error<E: std::error::Error + 'static>(e: E) -> DeepSeaError {
    DeepSeaError::Queue(DisplayErrorContext(&e).to_string())
}

#[derive(Clone)]
pub struct QueueService {
    client: Client,
}

impl QueueService {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk),
        }
    }

    async fn queue_url(&self, queue_name: &str) -> Result<String> {
        let out = self
            .client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(queue_error)?;

        out.queue_url()
            .map(str::to_string)
            .ok_or_else(|| DeepSeaError::Queue(format!("No url for queue {queue_name}")))
    }
}

#[async_trait]
impl MessageQueue for QueueService {
    async fn send(&self, queue_name: &str, body: &str, group_id: &str) -> Result<String> {
        let url = self.queue_url(queue_name).await?;
        debug!("Publishing to {} in group {}", url, group_id);

        let out = self
            .client
            .send_message()
            .queue_url(url)
            .message_body(body)
            .message_group_id(group_id)
            .send()
            .await
            .map_err(queue_error)?;

        Ok(out.message_id().unwrap_or_default().to_string())
    }

    async fn depth(&self, queue_name: &str) -> Result<QueueDepth> {
        let url = self.queue_url(queue_name).await?;
        let out = self
            .client
            .get_queue_attributes()
            .queue_url(url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesNotVisible)
            .send()
            .await
            .map_err(queue_error)?;

        let count = |name: &QueueAttributeName| {
            out.attributes()
                .and_then(|attrs| attrs.get(name))
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_default()
        };

        Ok(QueueDepth {
            visible: count(&QueueAttributeName::ApproximateNumberOfMessages),
            in_flight: count(&QueueAttributeName::ApproximateNumberOfMessagesNotVisible),
        })
    }
}
