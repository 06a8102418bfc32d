mod config;
mod publisher;

pub use config::RabbitMqConfig;
pub use publisher::{MatchCalculatedMessage, PlayerHistory, PublisherError, RabbitMqPublisher, RatingChange};
