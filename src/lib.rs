//! Environment-configured RabbitMQ publish/consume facade.
//!
//! Settings come from `RABBITMQ_*` variables (see [`env::ConfigKey`]), the broker
//! connection and channel are opened on first use by [`ConnectionManager`].
//!
//! ```no_run
//! use rabbitenv::{ConnectionManager, Publishing};
//!
//! # async fn run() -> rabbitenv::rabbitmq::Result<()> {
//! let mut manager = ConnectionManager::from_env();
//! manager.publish(&Publishing::text("test")).await?;
//! manager.close().await;
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod fail;
pub mod message;
pub mod rabbitmq;

pub use env::{config, config_value, ConfigError, ConfigKey, ConfigResolver, ConfigValue, RabbitConfig};
pub use fail::{clear_fail_logger, set_fail_logger};
pub use message::{Delivery, Publishing};
pub use rabbitmq::{ConnectionManager, ConnectionState, RabbitMQError};
