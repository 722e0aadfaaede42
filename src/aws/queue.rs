//! SQS message emission.

use aws_config::SdkConfig;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use aws_sdk_sqs::Client;
use tracing::debug;

use crate::emitter::MetricMessage;
use crate::error::{ScrapeError, ScrapeResult};

/// SendMessageBatch accepts at most 10 entries per call.
pub(crate) const QUEUE_BATCH_SIZE: usize = 10;

pub struct QueueSender {
    client: Client,
    queue_url: String,
}

impl QueueSender {
    pub fn new(conf: &SdkConfig, queue_url: String) -> Self {
        Self {
            client: Client::new(conf),
            queue_url,
        }
    }

    /// Send messages in batches of 10, draining sequentially. The entry id
    /// is the index within its batch.
    pub async fn send_messages(&self, messages: &[MetricMessage]) -> ScrapeResult<()> {
        let mut bodies = Vec::with_capacity(messages.len());
        for message in messages {
            bodies.push(
                serde_json::to_string(message)
                    .map_err(|e| ScrapeError::queue("serialize message", e))?,
            );
        }

        for chunk in bodies.chunks(QUEUE_BATCH_SIZE) {
            let mut entries = Vec::with_capacity(chunk.len());
            for (ix, body) in chunk.iter().enumerate() {
                entries.push(
                    SendMessageBatchRequestEntry::builder()
                        .id(ix.to_string())
                        .message_body(body)
                        .build()
                        .map_err(|e| ScrapeError::queue("build batch entry", e))?,
                );
            }
            self.client
                .send_message_batch()
                .queue_url(&self.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|e| ScrapeError::queue("send_message_batch", e))?;
        }

        debug!(count = messages.len(), "sent messages");
        Ok(())
    }
}
