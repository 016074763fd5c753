use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use source_status_ws::{
    ChannelConfig, ChannelEvent, ChannelState, EndpointConfig, EventForwarder, StatusChannel,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug)]
enum ServerEvent {
    Accepted { conn_id: usize },
    Text { conn_id: usize, text: String },
    Closed { conn_id: usize, code: Option<u16>, reason: String },
}

/// Minimal status endpoint: greets each socket with a `connected` envelope and one status
/// change, answers JSON pings with pongs, and reports what it sees.
async fn spawn_status_server() -> (SocketAddr, mpsc::UnboundedReceiver<ServerEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut conn_id = 0usize;
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            conn_id += 1;
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut ws = accept_async(stream).await.unwrap();
                let _ = tx.send(ServerEvent::Accepted { conn_id });

                let connected = format!(
                    r#"{{"type":"connected","data":{{"connection_id":{},"timestamp":"2024-05-01T10:00:00"}}}}"#,
                    1000 + conn_id
                );
                let _ = ws.send(Message::text(connected)).await;
                let _ = ws
                    .send(Message::text(
                        r#"{"type":"source_status_changed","data":{"source_id":3,"is_online":true,"timestamp":"2024-05-01T10:00:01"}}"#,
                    ))
                    .await;

                while let Some(message) = ws.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            let text = text.as_str().to_string();
                            if text.contains(r#""type":"ping""#) {
                                let _ = ws.send(Message::text(r#"{"type":"pong"}"#)).await;
                            }
                            let _ = tx.send(ServerEvent::Text { conn_id, text });
                        }
                        Ok(Message::Close(frame)) => {
                            let _ = tx.send(ServerEvent::Closed {
                                conn_id,
                                code: frame.as_ref().map(|f| u16::from(f.code)),
                                reason: frame
                                    .as_ref()
                                    .map(|f| f.reason.as_str().to_string())
                                    .unwrap_or_default(),
                            });
                            break;
                        }
                        Ok(_) => {}
                        Err(_) => break,
                    }
                }
            });
        }
    });

    (addr, rx)
}

async fn next_server_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("server event before timeout")
        .expect("server still running")
}

async fn next_channel_event(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("channel event before timeout")
        .expect("subscriber still attached")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn talks_to_a_real_websocket_endpoint() {
    let (addr, mut server) = spawn_status_server().await;
    let endpoint = EndpointConfig::new(false, addr.to_string()).without_host_override();
    let config = ChannelConfig::new(endpoint).with_heartbeat_interval(Duration::from_millis(200));
    let (forwarder, mut events) = EventForwarder::channel();
    let channel = StatusChannel::spawn(config, forwarder);

    channel.connect().await.expect("connect");
    assert!(matches!(
        next_server_event(&mut server).await,
        ServerEvent::Accepted { conn_id: 1 }
    ));

    assert_eq!(
        next_channel_event(&mut events).await,
        ChannelEvent::Connected {
            connection_id: 1001
        }
    );
    match next_channel_event(&mut events).await {
        ChannelEvent::StatusChanged {
            source_id,
            is_online,
            data,
        } => {
            assert_eq!((source_id, is_online), (3, true));
            assert_eq!(data.timestamp.as_deref(), Some("2024-05-01T10:00:01"));
        }
        other => panic!("expected status change, got {other:?}"),
    }

    match next_server_event(&mut server).await {
        ServerEvent::Text { conn_id, text } => {
            assert_eq!(conn_id, 1);
            assert_eq!(text, r#"{"type":"ping"}"#);
        }
        other => panic!("expected keepalive, got {other:?}"),
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let stats = channel.stats().await.expect("stats");
        if stats.pongs_received > 0 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "no pong recorded");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(channel.connection_id(), Some(1001));

    channel.disconnect().await.expect("disconnect");
    loop {
        match next_server_event(&mut server).await {
            ServerEvent::Closed {
                conn_id,
                code,
                reason,
            } => {
                assert_eq!(conn_id, 1);
                assert_eq!(code, Some(1000));
                assert_eq!(reason, "Manual disconnect");
                break;
            }
            ServerEvent::Text { .. } => continue,
            other => panic!("unexpected server event {other:?}"),
        }
    }
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(channel.connection_id(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refused_connection_schedules_a_retry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = EndpointConfig::new(false, addr.to_string()).without_host_override();
    let config = ChannelConfig::new(endpoint)
        .with_backoff(Duration::from_secs(60), Duration::from_secs(120));
    let (forwarder, mut events) = EventForwarder::channel();
    let channel = StatusChannel::spawn(config, forwarder);

    channel.connect().await.expect("connect");
    match next_channel_event(&mut events).await {
        ChannelEvent::Error(message) => assert!(message.contains("Connection failed")),
        other => panic!("expected connect error, got {other:?}"),
    }
    let snapshot = channel
        .wait_for(Duration::from_secs(1), |snap| {
            snap.state == ChannelState::Reconnecting
        })
        .await
        .expect("retry scheduled");
    assert_eq!(snapshot.attempt, 1);
    assert_eq!(snapshot.next_delay, Duration::from_secs(120));

    channel.shutdown().await.expect("shutdown");
}
