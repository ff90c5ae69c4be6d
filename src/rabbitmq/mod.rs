// src/rabbitmq/mod.rs
// RabbitMQ connection handling on top of lapin

pub mod amqp_client;
pub mod connection;
pub mod errors;

// Re-export specific items to simplify imports elsewhere
pub use amqp_client::{BrokerChannel, BrokerConnection, LapinTransport, QueueDeclaration, Transport};
pub use connection::{ConnectionManager, ConnectionState, Subscription};
pub use errors::{RabbitMQError, Result};
