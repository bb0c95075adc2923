//! Kafka transport.
//!
//! Subscribes to a topic as part of a consumer group and polls it without
//! blocking, using the rdkafka library (librdkafka bindings).
//!
//! ## Example
//!
//! ```rust,no_run
//! use streamchart::source::{KafkaTransport, Transport};
//!
//! let mut transport = KafkaTransport::builder()
//!     .brokers("localhost:9092")
//!     .topic("buzzline-topic")
//!     .group_id("streamchart")
//!     .build()?;
//!
//! let poll = transport.next()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::Message;
use tracing::info;

use super::{Poll, Transport};
use crate::error::TransportError;

/// A transport backed by a Kafka consumer group subscription.
pub struct KafkaTransport {
    consumer: Option<BaseConsumer>,
    description: String,
}

impl KafkaTransport {
    /// Create a new builder for configuring the transport.
    pub fn builder() -> KafkaTransportBuilder {
        KafkaTransportBuilder::default()
    }
}

impl std::fmt::Debug for KafkaTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaTransport")
            .field("description", &self.description)
            .field("connected", &self.consumer.is_some())
            .finish()
    }
}

impl Transport for KafkaTransport {
    fn next(&mut self) -> Result<Poll, TransportError> {
        let Some(consumer) = self.consumer.as_ref() else {
            return Ok(Poll::End);
        };

        match consumer.poll(Duration::ZERO) {
            None => Ok(Poll::Pending),
            Some(Ok(message)) => Ok(Poll::Payload(
                message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            )),
            Some(Err(e)) => Err(TransportError::Queue(e.to_string())),
        }
    }

    fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.unsubscribe();
            info!(source = %self.description, "Kafka consumer closed");
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`KafkaTransport`].
#[derive(Debug)]
pub struct KafkaTransportBuilder {
    brokers: String,
    topic: String,
    group_id: String,
}

impl Default for KafkaTransportBuilder {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "buzzline-topic".to_string(),
            group_id: "streamchart".to_string(),
        }
    }
}

impl KafkaTransportBuilder {
    /// Set the bootstrap brokers (comma-separated list).
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = brokers.into();
        self
    }

    /// Set the topic to subscribe to.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the consumer group.
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Connect and subscribe.
    ///
    /// New consumer groups start from the earliest retained offset.
    pub fn build(self) -> Result<KafkaTransport, TransportError> {
        let consumer: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| TransportError::Queue(e.to_string()))?;

        consumer
            .subscribe(&[self.topic.as_str()])
            .map_err(|e| TransportError::Queue(e.to_string()))?;

        info!(
            brokers = %self.brokers,
            topic = %self.topic,
            group = %self.group_id,
            "Kafka consumer subscribed"
        );

        Ok(KafkaTransport {
            consumer: Some(consumer),
            description: format!("kafka://{}/{}", self.brokers, self.topic),
        })
    }
}
