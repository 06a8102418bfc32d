use crate::messaging::config::RabbitMqConfig;
use chrono::{DateTime, FixedOffset, Utc};
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::{AMQPValue, FieldTable, LongString, ShortString},
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    ConnectionError(#[from] lapin::Error),

    #[error("Failed to serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Publisher not initialized")]
    NotInitialized
}

/// One rating delta carried by a match-calculated message.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatingChange {
    pub player_id: i64,
    pub attribute_id: i32,
    pub ordinal_before: f64,
    pub ordinal_after: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_rating_before: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_rating_after: Option<f64>
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerHistory {
    pub player_id: i64,
    pub attributes_updated: i32
}

/// Message sent when a match has finished rating calculation.
/// This format matches what the downstream MatchCalculatedConsumer expects.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchCalculatedMessage {
    pub match_id: i64,
    pub match_name: String,
    pub ended_at: Option<DateTime<FixedOffset>>,
    pub rating_changes: Vec<RatingChange>,
    pub player_histories: Vec<PlayerHistory>,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>
}

/// MassTransit message envelope structure
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MassTransitEnvelope<T> {
    message_id: String,
    conversation_id: String,
    correlation_id: Option<String>,
    source_address: String,
    destination_address: String,
    message_type: Vec<String>,
    message: T,
    sent_time: DateTime<Utc>
}

/// RabbitMQ publisher for match-calculated events
pub struct RabbitMqPublisher {
    connection: Option<Arc<Connection>>,
    channel: Option<Channel>,
    exchange: String,
    routing_key: String
}

impl RabbitMqPublisher {
    /// Creates a new RabbitMQ publisher instance
    pub fn new(exchange: String, routing_key: String) -> Self {
        Self {
            connection: None,
            channel: None,
            exchange,
            routing_key
        }
    }

    /// Creates a new RabbitMQ publisher from configuration
    pub fn from_config(config: &RabbitMqConfig) -> Self {
        Self::new(config.exchange.clone(), config.routing_key.clone())
    }

    /// Creates and connects a publisher from configuration
    pub async fn connect_from_config(config: &RabbitMqConfig) -> Result<Self, PublisherError> {
        let mut publisher = Self::from_config(config);
        publisher.connect(&config.connection_url()).await?;
        Ok(publisher)
    }

    /// Connects to RabbitMQ and initializes the publisher
    pub async fn connect(&mut self, rabbitmq_url: &str) -> Result<(), PublisherError> {
        let connection = Connection::connect(rabbitmq_url, ConnectionProperties::default()).await?;
        let connection = Arc::new(connection);

        let channel = connection.create_channel().await?;

        // Declare the exchange (fanout type for broadcasting)
        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default()
            )
            .await?;

        self.connection = Some(connection);
        self.channel = Some(channel);

        info!("Connected to RabbitMQ at {}", rabbitmq_url);
        info!(
            "Exchange '{}' declared with routing key '{}'",
            self.exchange, self.routing_key
        );

        Ok(())
    }

    /// Publishes a match calculated message
    pub async fn publish_match_calculated(&self, message: MatchCalculatedMessage) -> Result<(), PublisherError> {
        let channel = self.channel.as_ref().ok_or(PublisherError::NotInitialized)?;

        let message_id = Uuid::new_v4().to_string();
        let conversation_id = Uuid::new_v4().to_string();
        let match_id = message.match_id;
        let correlation_id = message.correlation_id.clone();

        // Wrap in MassTransit envelope
        let envelope = MassTransitEnvelope {
            message_id: message_id.clone(),
            conversation_id,
            correlation_id,
            source_address: format!("rabbitmq://localhost/{}", self.exchange),
            destination_address: format!("rabbitmq://localhost/{}", self.routing_key),
            message_type: vec!["urn:message:Ratings.Messages:MatchCalculatedMessage".to_string()],
            message,
            sent_time: Utc::now()
        };

        let payload = serde_json::to_vec(&envelope)?;

        // Create headers for MassTransit
        let mut headers = BTreeMap::new();
        headers.insert(
            ShortString::from("Content-Type"),
            AMQPValue::LongString(LongString::from("application/vnd.masstransit+json"))
        );

        channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/vnd.masstransit+json".into())
                    .with_headers(FieldTable::from(headers))
                    .with_message_id(message_id.into())
                    .with_timestamp(Utc::now().timestamp() as u64)
            )
            .await?;

        debug!(
            "Published match calculated message for match {} to exchange '{}' with routing key '{}'",
            match_id, self.exchange, self.routing_key
        );

        Ok(())
    }

    /// Checks if the publisher is connected
    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.channel.is_some()
    }

    /// Closes the connection to RabbitMQ
    pub async fn close(&mut self) -> Result<(), PublisherError> {
        if let Some(channel) = self.channel.take() {
            channel.close(200, "Normal shutdown").await?;
        }

        if let Some(connection) = self.connection.take() {
            if let Ok(conn) = Arc::try_unwrap(connection) {
                conn.close(200, "Normal shutdown").await?;
            }
        }

        info!("RabbitMQ connection closed");
        Ok(())
    }
}

impl Drop for RabbitMqPublisher {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("RabbitMQ publisher dropped without proper closure");
        }
    }
}
