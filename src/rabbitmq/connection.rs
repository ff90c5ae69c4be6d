// src/rabbitmq/connection.rs
// Lazily built connection -> channel -> exchange/queue cascade.

use super::amqp_client::{
    BrokerChannel, BrokerConnection, LapinTransport, QueueDeclaration, Transport,
};
use super::errors::{RabbitMQError, Result};
use crate::env::{self, RabbitConfig};
use crate::fail;
use crate::message::Publishing;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueDeclareOptions,
};
use tracing::{debug, info, warn};

type ChannelOf<T> = <<T as Transport>::Connection as BrokerConnection>::Channel;

/// Broker subscription handed back by [`ConnectionManager::listen`].
pub type Subscription<T> = <ChannelOf<T> as BrokerChannel>::Consumer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    ChannelOpen,
}

/// Owns at most one connection and one channel, created on first use.
///
/// Not internally synchronized: every broker operation takes `&mut self`. Share one
/// between tasks behind a `tokio::sync::Mutex`.
pub struct ConnectionManager<T: Transport = LapinTransport> {
    transport: T,
    config: RabbitConfig,
    connection: Option<T::Connection>,
    channel: Option<ChannelOf<T>>,
}

impl ConnectionManager<LapinTransport> {
    /// `lapin` transport with the process-wide configuration.
    pub fn from_env() -> Self {
        Self::new(LapinTransport::named("rabbitenv"), env::config().clone())
    }

    /// Resolves a fresh configuration from the environment, returning a malformed value as
    /// an error instead of handing it to the fail logger.
    pub fn try_from_env() -> Result<Self> {
        let config = RabbitConfig::from_env()?;
        Ok(Self::new(LapinTransport::named("rabbitenv"), config))
    }
}

impl<T: Transport> ConnectionManager<T> {
    /// Strict resolution through `lookup`; see [`RabbitConfig::from_lookup`].
    pub fn try_with_lookup<F>(transport: T, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = RabbitConfig::from_lookup(lookup)?;
        Ok(Self::new(transport, config))
    }

    pub fn new(transport: T, config: RabbitConfig) -> Self {
        ConnectionManager {
            transport,
            config,
            connection: None,
            channel: None,
        }
    }

    pub fn config(&self) -> &RabbitConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        match (&self.connection, &self.channel) {
            (None, _) => ConnectionState::Disconnected,
            (Some(_), None) => ConnectionState::Connected,
            (Some(_), Some(_)) => ConnectionState::ChannelOpen,
        }
    }

    /// Returns the connection, dialing the broker if there is none yet or the cached one
    /// has been closed.
    pub async fn connect(&mut self) -> Result<&T::Connection> {
        if self.connection.as_ref().is_some_and(|conn| !conn.is_open()) {
            warn!("Cached connection is closed, reconnecting");
            self.channel = None;
            self.connection = None;
        }

        if self.connection.is_none() {
            if self.config.log_uri {
                info!("Connecting to RabbitMQ at {}", self.config.amqp_uri());
            } else {
                info!("Connecting to RabbitMQ at {}", self.config.redacted_uri());
            }

            let connection = self.transport.connect(&self.config.amqp_uri()).await?;
            info!("Successfully connected to RabbitMQ");
            self.connection = Some(connection);
        }

        self.connection
            .as_ref()
            .ok_or_else(|| RabbitMQError::ConnectionError("No active connection".to_string()))
    }

    /// Returns the channel, connecting first when needed. A closed channel is replaced.
    pub async fn channel(&mut self) -> Result<&ChannelOf<T>> {
        if self.channel.as_ref().is_some_and(|ch| !ch.is_open()) {
            debug!("Dropping closed channel");
            self.channel = None;
        }

        if self.channel.is_none() {
            let channel = self.connect().await?.create_channel().await?;
            debug!("Channel opened");
            self.channel = Some(channel);
        }

        self.channel
            .as_ref()
            .ok_or_else(|| RabbitMQError::ChannelError("Channel is not available".to_string()))
    }

    /// Makes `name` ready for publishing.
    ///
    /// The exchange is only declared when `RABBITMQ_DECLARE_EXCHANGE` is on; otherwise it
    /// is expected to exist already and this just ensures a channel.
    pub async fn exchange(&mut self, name: &str) -> Result<&ChannelOf<T>> {
        if self.config.declare_exchange && !name.is_empty() {
            self.declare_exchange(name).await
        } else {
            self.channel().await
        }
    }

    /// Declares `name` unconditionally, using `exchangeType` and the configured flags.
    pub async fn declare_exchange(&mut self, name: &str) -> Result<&ChannelOf<T>> {
        let kind = self.config.exchange_type.clone();
        let options = ExchangeDeclareOptions {
            passive: false,
            durable: self.config.durable,
            auto_delete: self.config.auto_delete,
            internal: self.config.internal,
            nowait: self.config.no_wait,
        };

        let channel = self.channel().await?;
        channel.exchange_declare(name, &kind, options).await?;
        info!("Exchange '{}' ({}) declared", name, kind);
        Ok(channel)
    }

    /// Declares queue `name`. Not cached: every call goes to the broker.
    pub async fn queue(&mut self, name: &str) -> Result<QueueDeclaration> {
        let options = QueueDeclareOptions {
            passive: false,
            durable: self.config.durable,
            exclusive: self.config.exclusive,
            auto_delete: self.config.auto_delete,
            nowait: self.config.no_wait,
        };

        let declared = self.channel().await?.queue_declare(name, options).await?;
        info!(
            "Queue '{}' declared with {} messages",
            declared.name, declared.message_count
        );
        Ok(declared)
    }

    /// Declares the configured queue and starts consuming from it.
    pub async fn listen(&mut self) -> Result<Subscription<T>> {
        let queue = self.config.queue.clone();
        let consumer_tag = self.config.consumer.clone();
        let options = BasicConsumeOptions {
            no_local: self.config.no_local,
            no_ack: self.config.ack,
            exclusive: self.config.exclusive,
            nowait: self.config.no_wait,
        };

        self.queue(&queue).await?;
        let consumer = self
            .channel()
            .await?
            .basic_consume(&queue, &consumer_tag, options)
            .await?;

        info!("Started consuming from queue: {}", queue);
        Ok(consumer)
    }

    /// Publishes `message` to the configured exchange, routed by `queue_eng`.
    pub async fn publish(&mut self, message: &Publishing) -> Result<()> {
        let exchange = self.config.exchange.clone();
        let routing_key = self.config.queue_eng.clone();
        let options = BasicPublishOptions {
            mandatory: self.config.mandatory,
            immediate: self.config.immediate,
        };

        self.exchange(&exchange)
            .await?
            .basic_publish(&exchange, &routing_key, options, message)
            .await?;

        debug!(
            "Published {} bytes to exchange '{}' with routing key '{}'",
            message.body.len(),
            exchange,
            routing_key
        );
        Ok(())
    }

    /// Closes the channel, then the connection. Failures are reported, not returned, and
    /// both handles are dropped either way so the next call starts from scratch.
    pub async fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            if let Err(err) = channel.close().await {
                fail::report("Failed to close channel", &err);
            }
        }

        if let Some(connection) = self.connection.take() {
            info!("Closing RabbitMQ connection gracefully");
            if let Err(err) = connection.close().await {
                fail::report("Failed to close connection", &err);
            }
        }
    }
}
