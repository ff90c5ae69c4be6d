// src/rabbitmq/amqp_client.rs
// The broker seam. `ConnectionManager` only talks to these traits; `LapinTransport`
// is the real thing.

use super::errors::{RabbitMQError, Result};
use crate::message::Publishing;
use async_trait::async_trait;
use lapin::{
    options::{
        BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueDeclareOptions,
    },
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind,
};

/// The broker's answer to a queue declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDeclaration {
    pub name: String,
    pub message_count: u32,
    pub consumer_count: u32,
}

/// Opens broker connections.
#[async_trait]
pub trait Transport: Send + Sync {
    type Connection: BrokerConnection;

    async fn connect(&self, uri: &str) -> Result<Self::Connection>;
}

#[async_trait]
pub trait BrokerConnection: Send + Sync {
    type Channel: BrokerChannel;

    async fn create_channel(&self) -> Result<Self::Channel>;

    /// `false` once the broker or the client has closed the connection.
    fn is_open(&self) -> bool;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// What `basic_consume` hands back: a stream of deliveries for the real broker.
    type Consumer: Send;

    async fn exchange_declare(
        &self,
        exchange: &str,
        kind: &str,
        options: ExchangeDeclareOptions,
    ) -> Result<()>;

    async fn queue_declare(
        &self,
        queue: &str,
        options: QueueDeclareOptions,
    ) -> Result<QueueDeclaration>;

    async fn basic_consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
    ) -> Result<Self::Consumer>;

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        options: BasicPublishOptions,
        message: &Publishing,
    ) -> Result<()>;

    /// `false` once the channel is closed, e.g. after the broker rejects a declaration.
    fn is_open(&self) -> bool;

    async fn close(&self) -> Result<()>;
}

/// `lapin`-backed transport.
#[derive(Clone, Default)]
pub struct LapinTransport {
    properties: ConnectionProperties,
}

impl LapinTransport {
    pub fn new(properties: ConnectionProperties) -> Self {
        Self { properties }
    }

    /// Properties carrying a connection name, shown in the broker's management UI.
    pub fn named(name: &str) -> Self {
        Self::new(ConnectionProperties::default().with_connection_name(name.to_string().into()))
    }
}

pub fn exchange_kind(kind: &str) -> ExchangeKind {
    match kind.to_ascii_lowercase().as_str() {
        "direct" => ExchangeKind::Direct,
        "fanout" => ExchangeKind::Fanout,
        "topic" => ExchangeKind::Topic,
        "headers" => ExchangeKind::Headers,
        _ => ExchangeKind::Custom(kind.to_string()),
    }
}

#[async_trait]
impl Transport for LapinTransport {
    type Connection = Connection;

    async fn connect(&self, uri: &str) -> Result<Connection> {
        Connection::connect(uri, self.properties.clone())
            .await
            .map_err(|e| RabbitMQError::ConnectionError(format!("Failed to connect: {}", e)))
    }
}

#[async_trait]
impl BrokerConnection for Connection {
    type Channel = Channel;

    async fn create_channel(&self) -> Result<Channel> {
        Connection::create_channel(self)
            .await
            .map_err(|e| RabbitMQError::ChannelError(format!("Failed to open a channel: {}", e)))
    }

    fn is_open(&self) -> bool {
        self.status().connected()
    }

    async fn close(&self) -> Result<()> {
        Connection::close(self, 200, "Closing connection")
            .await
            .map_err(|e| RabbitMQError::CloseError(e.to_string()))
    }
}

#[async_trait]
impl BrokerChannel for Channel {
    type Consumer = Consumer;

    async fn exchange_declare(
        &self,
        exchange: &str,
        kind: &str,
        options: ExchangeDeclareOptions,
    ) -> Result<()> {
        Channel::exchange_declare(
            self,
            exchange,
            exchange_kind(kind),
            options,
            FieldTable::default(),
        )
        .await
        .map_err(|e| {
            RabbitMQError::DeclareError(format!("Failed to declare exchange '{}': {}", exchange, e))
        })
    }

    async fn queue_declare(
        &self,
        queue: &str,
        options: QueueDeclareOptions,
    ) -> Result<QueueDeclaration> {
        let declared = Channel::queue_declare(self, queue, options, FieldTable::default())
            .await
            .map_err(|e| {
                RabbitMQError::DeclareError(format!("Failed to declare queue '{}': {}", queue, e))
            })?;

        Ok(QueueDeclaration {
            name: declared.name().as_str().to_string(),
            message_count: declared.message_count(),
            consumer_count: declared.consumer_count(),
        })
    }

    async fn basic_consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
    ) -> Result<Consumer> {
        Channel::basic_consume(self, queue, consumer_tag, options, FieldTable::default())
            .await
            .map_err(|e| RabbitMQError::ConsumeError(e.to_string()))
    }

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        options: BasicPublishOptions,
        message: &Publishing,
    ) -> Result<()> {
        let mut properties = BasicProperties::default();
        if let Some(content_type) = &message.content_type {
            properties = properties.with_content_type(content_type.as_str().into());
        }

        Channel::basic_publish(self, exchange, routing_key, options, &message.body, properties)
            .await
            .map_err(|e| RabbitMQError::PublishError(e.to_string()))?
            .await
            .map_err(|e| RabbitMQError::PublishError(e.to_string()))?;

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.status().connected()
    }

    async fn close(&self) -> Result<()> {
        Channel::close(self, 200, "Closing channel")
            .await
            .map_err(|e| RabbitMQError::CloseError(e.to_string()))
    }
}
