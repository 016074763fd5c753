use std::time::Duration;

use source_status_ws::{
    ChannelConfig, EndpointConfig, SourceStatusData, StatusCallbacks, StatusChannel,
};
use tracing_subscriber::EnvFilter;

fn usage() -> &'static str {
    "watch_sources\n\
  Connects to the live source-status channel and prints every status change.\n\
\n\
USAGE:\n\
  STATUS_PAGE_URL=http://localhost:8000/ cargo run --example watch_sources -- [--secs <N>]\n\
\n\
ENV:\n\
  STATUS_PAGE_URL         page the status view is served from (default http://localhost/)\n\
  SOURCE_STATUS_WS_HOST   build-time host override for the channel\n\
  RUST_LOG                tracing filter (default info)\n\
"
}

fn parse_secs() -> u64 {
    let mut secs = 120;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--secs" => {
                secs = it
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("{usage}", usage = usage());
                        std::process::exit(2);
                    });
            }
            "-h" | "--help" => {
                println!("{usage}", usage = usage());
                std::process::exit(0);
            }
            other => {
                eprintln!("unknown argument: {other}\n\n{usage}", usage = usage());
                std::process::exit(2);
            }
        }
    }
    secs
}

fn describe(data: &SourceStatusData) -> String {
    match (data.checking, data.attempt, data.max_attempts) {
        (Some(true), Some(attempt), Some(max)) => format!(" (checking {attempt}/{max})"),
        (Some(true), _, _) => " (checking)".to_string(),
        _ => String::new(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let secs = parse_secs();
    let page_url =
        std::env::var("STATUS_PAGE_URL").unwrap_or_else(|_| "http://localhost/".to_string());
    let endpoint = EndpointConfig::from_page_url(&page_url)?;
    tracing::info!(url = %endpoint.url()?, "watching source status");

    let callbacks = StatusCallbacks::new()
        .on_connected(|id| println!("connected (connection {id})"))
        .on_disconnected(|| println!("disconnected"))
        .on_error(|err| eprintln!("channel error: {err}"))
        .on_status_change(|source_id, is_online, data| {
            let state = if is_online { "online" } else { "offline" };
            println!("source {source_id} is {state}{}", describe(data));
        });

    let channel = StatusChannel::spawn(ChannelConfig::new(endpoint), callbacks);
    channel.connect().await?;

    let mut watch = channel.watch();
    let deadline = tokio::time::sleep(Duration::from_secs(secs));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = watch.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *watch.borrow_and_update();
                tracing::info!(
                    state = %snapshot.state,
                    attempt = snapshot.attempt,
                    next_delay_ms = snapshot.next_delay.as_millis() as u64,
                    "channel state"
                );
            }
        }
    }

    let stats = channel.stats().await?;
    tracing::info!(
        messages = stats.messages,
        reconnects = stats.reconnects,
        pongs = stats.pongs_received,
        p50_pong_rtt_us = stats.p50_pong_rtt_us,
        last_error = stats.last_error.as_deref().unwrap_or("none"),
        "shutting down"
    );
    channel.shutdown().await?;
    Ok(())
}
