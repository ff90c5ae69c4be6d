use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;
use rabbitenv::{ConnectionManager, Publishing};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Publish to or listen on the queue described by the RABBITMQ_* environment.
#[derive(Parser, Debug)]
#[command(name = "rabbitenv", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish one message to the configured exchange
    Publish {
        body: String,
        #[arg(long, default_value = "text/plain")]
        content_type: String,
    },
    /// Consume from the configured queue until Ctrl-C
    Listen {
        /// Stop after this many deliveries
        #[arg(long)]
        count: Option<usize>,
    },
    /// Print the resolved configuration as JSON, or a single value with --key
    Config {
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Config { key: Some(key) } => {
            let value = rabbitenv::config_value(&key)
                .with_context(|| format!("Unknown configuration key: {}", key))?;
            println!("{}", value);
        }
        Command::Config { key: None } => {
            let json = serde_json::to_string_pretty(rabbitenv::config())
                .context("Failed to serialize configuration")?;
            println!("{}", json);
        }
        Command::Publish { body, content_type } => {
            let mut manager = ConnectionManager::try_from_env()?;
            let message = Publishing::new(body).with_content_type(content_type);
            let result = manager.publish(&message).await;
            manager.close().await;
            result.context("Failed to publish message")?;
            info!("Message published");
        }
        Command::Listen { count } => {
            let mut manager = ConnectionManager::try_from_env()?;
            let result = listen(&mut manager, count).await;
            manager.close().await;
            result?;
        }
    }

    Ok(())
}

async fn listen(manager: &mut ConnectionManager, count: Option<usize>) -> Result<()> {
    let auto_ack = manager.config().ack;
    let mut consumer = manager.listen().await.context("Failed to start consuming")?;
    let mut received = 0usize;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, closing");
                break;
            }
            next = consumer.next() => {
                let Some(delivery) = next else { break };
                let delivery = match delivery {
                    Ok(delivery) => delivery,
                    Err(e) => {
                        error!("Error receiving message: {}", e);
                        break;
                    }
                };

                println!("{}", String::from_utf8_lossy(&delivery.data));
                if !auto_ack {
                    delivery
                        .ack(BasicAckOptions::default())
                        .await
                        .context("Failed to acknowledge message")?;
                }

                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
        }
    }

    Ok(())
}
