use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;
use rabbitenv::rabbitmq::LapinTransport;
use rabbitenv::{ConnectionManager, ConnectionState, Publishing, RabbitConfig};

fn local_config() -> RabbitConfig {
    RabbitConfig {
        queue: "rabbitenv_it".into(),
        queue_eng: "rabbitenv_it".into(),
        exchange: "rabbitenv_it_exchange".into(),
        declare_exchange: true,
        durable: false,
        auto_delete: true,
        ..RabbitConfig::default()
    }
}

#[tokio::test]
#[ignore] // Ignore by default as it requires a running RabbitMQ instance
async fn test_publish_without_setup() {
    let mut manager = ConnectionManager::new(LapinTransport::default(), local_config());

    let result = manager.publish(&Publishing::text("test")).await;

    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(manager.state(), ConnectionState::ChannelOpen);
    manager.close().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
#[ignore]
async fn test_published_message_reaches_listener() {
    let config = local_config();
    let mut consumer_side = ConnectionManager::new(LapinTransport::default(), config.clone());
    let mut publisher = ConnectionManager::new(LapinTransport::default(), config.clone());

    publisher.declare_exchange(&config.exchange).await.unwrap();
    let mut subscription = consumer_side.listen().await.unwrap();
    consumer_side
        .channel()
        .await
        .unwrap()
        .queue_bind(
            &config.queue,
            &config.exchange,
            &config.queue_eng,
            Default::default(),
            Default::default(),
        )
        .await
        .unwrap();

    publisher.publish(&Publishing::text("round trip")).await.unwrap();

    let delivery = subscription.next().await.unwrap().unwrap();
    assert_eq!(delivery.data, b"round trip");
    assert_eq!(
        delivery.properties.content_type().as_ref().map(|ct| ct.as_str()),
        Some("text/plain")
    );
    delivery.ack(BasicAckOptions::default()).await.unwrap();

    publisher.close().await;
    consumer_side.close().await;
}

#[tokio::test]
#[ignore]
async fn test_close_then_reuse() {
    let mut manager = ConnectionManager::new(LapinTransport::default(), local_config());

    manager.queue("rabbitenv_it").await.unwrap();
    manager.close().await;
    let declared = manager.queue("rabbitenv_it").await.unwrap();

    assert_eq!(declared.name, "rabbitenv_it");
    manager.close().await;
}
