use std::time::Duration;

use source_status_ws::testing::MockTransport;
use source_status_ws::{ChannelConfig, ChannelState, EndpointConfig, StatusChannel};

fn config() -> ChannelConfig {
    ChannelConfig::new(EndpointConfig::new(false, "status.test"))
}

#[tokio::test(start_paused = true)]
async fn repeated_connect_opens_a_single_transport() {
    let (transport, mut server) = MockTransport::channel_pair();
    let channel = StatusChannel::spawn_with_transport(config(), transport, ());

    let first = channel.connect().await.expect("first connect");
    let second = channel.connect().await.expect("second connect");
    assert_eq!(first.state, ChannelState::Connecting);
    assert!(matches!(
        second.state,
        ChannelState::Connecting | ChannelState::Open
    ));

    let _conn = server.next_connection().await.expect("socket accepted");
    channel
        .wait_for(Duration::from_secs(1), |snap| snap.connected)
        .await
        .expect("channel open");

    let third = channel.connect().await.expect("connect while open");
    assert_eq!(third.state, ChannelState::Open);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(server.connect_attempts(), 1);
    assert_eq!(
        server.last_url().as_deref(),
        Some("ws://status.test/ws/sources")
    );
}

#[tokio::test(start_paused = true)]
async fn connect_while_reconnecting_cancels_timer_and_connects_now() {
    let (transport, mut server) = MockTransport::channel_pair();
    let channel = StatusChannel::spawn_with_transport(config(), transport, ());

    server.refuse_connections(true);
    channel.connect().await.expect("connect");
    let waiting = channel
        .wait_for(Duration::from_millis(100), |snap| {
            snap.state == ChannelState::Reconnecting
        })
        .await
        .expect("reconnect scheduled");
    assert_eq!(waiting.attempt, 1);
    assert!(waiting.reconnecting);

    server.refuse_connections(false);
    channel.connect().await.expect("connect during backoff");
    let _conn = server
        .next_connection_timeout(Duration::from_millis(10))
        .await
        .expect("immediate connect");

    let times = server.attempt_times();
    assert_eq!(times.len(), 2);
    assert!(times[1] - times[0] < Duration::from_millis(100));

    channel
        .wait_for(Duration::from_secs(1), |snap| snap.connected)
        .await
        .expect("channel open");

    // The cancelled timer must not produce another attempt.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(server.connect_attempts(), 2);
    assert_eq!(channel.state(), ChannelState::Open);
}

#[tokio::test(start_paused = true)]
async fn invalid_endpoint_reports_error_and_backs_off() {
    let (transport, server) = MockTransport::channel_pair();
    let endpoint = EndpointConfig::new(false, "   ");
    let (forwarder, mut events) = source_status_ws::EventForwarder::channel();
    let channel =
        StatusChannel::spawn_with_transport(ChannelConfig::new(endpoint), transport, forwarder);

    channel.connect().await.expect("connect");
    let snapshot = channel
        .wait_for(Duration::from_millis(100), |snap| {
            snap.state == ChannelState::Reconnecting
        })
        .await
        .expect("backoff after invalid endpoint");
    assert_eq!(snapshot.attempt, 1);
    assert_eq!(server.connect_attempts(), 0);

    match events.try_recv() {
        Ok(source_status_ws::ChannelEvent::Error(message)) => {
            assert!(message.contains("Invalid endpoint"), "{message}");
        }
        other => panic!("expected error event, got {other:?}"),
    }
    // No socket was ever tried, so there is nothing to report as disconnected.
    assert!(events.try_recv().is_err());
}
