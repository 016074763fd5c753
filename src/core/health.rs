use std::collections::VecDeque;
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;

use super::types::ChannelStats;

const MAX_RECENT_ERRORS: usize = 100;
const MAX_ERROR_TEXT_BYTES: usize = 1024;

#[derive(Debug, Clone)]
struct ErrorRec {
    _timestamp: Instant,
    context: &'static str,
    error: String,
}

fn truncate_string(s: &str) -> String {
    if s.len() <= MAX_ERROR_TEXT_BYTES {
        return s.to_string();
    }

    let mut end = MAX_ERROR_TEXT_BYTES;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Per-channel counters. Purely observational: nothing here triggers a disconnect.
#[derive(Debug)]
pub struct ChannelHealth {
    connection_started: Instant,
    last_message_received: Instant,
    message_count: u64,
    error_count: u64,
    reconnect_count: u64,
    heartbeats_sent: u64,
    pongs_received: u64,
    recent_errors: VecDeque<ErrorRec>,
    pong_rtt: Histogram<u64>,
}

impl Default for ChannelHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHealth {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            connection_started: now,
            last_message_received: now,
            message_count: 0,
            error_count: 0,
            reconnect_count: 0,
            heartbeats_sent: 0,
            pongs_received: 0,
            recent_errors: VecDeque::with_capacity(MAX_RECENT_ERRORS),
            pong_rtt: Histogram::new_with_bounds(1, 60_000_000, 3)
                .expect("histogram bounds are valid"),
        }
    }

    /// Called on every successful open.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.connection_started = now;
        self.last_message_received = now;
    }

    pub fn record_message(&mut self) {
        self.last_message_received = Instant::now();
        self.message_count = self.message_count.saturating_add(1);
    }

    pub fn record_heartbeat(&mut self) {
        self.heartbeats_sent = self.heartbeats_sent.saturating_add(1);
    }

    pub fn record_pong(&mut self, rtt: Option<Duration>) {
        self.pongs_received = self.pongs_received.saturating_add(1);
        if let Some(rtt) = rtt {
            let micros = rtt.as_micros().clamp(1, u64::MAX as u128) as u64;
            let _ = self.pong_rtt.record(micros);
        }
    }

    pub fn record_error(&mut self, context: &'static str, error: &str) {
        self.error_count = self.error_count.saturating_add(1);
        if self.recent_errors.len() == MAX_RECENT_ERRORS {
            self.recent_errors.pop_front();
        }
        self.recent_errors.push_back(ErrorRec {
            _timestamp: Instant::now(),
            context,
            error: truncate_string(error),
        });
    }

    pub fn increment_reconnect(&mut self) {
        self.reconnect_count = self.reconnect_count.saturating_add(1);
    }

    pub fn last_error(&self) -> Option<(&'static str, &str)> {
        self.recent_errors
            .back()
            .map(|rec| (rec.context, rec.error.as_str()))
    }

    pub fn get_stats(&self) -> ChannelStats {
        let (p50, p99) = if self.pong_rtt.len() == 0 {
            (0, 0)
        } else {
            (
                self.pong_rtt.value_at_percentile(50.0),
                self.pong_rtt.value_at_percentile(99.0),
            )
        };

        ChannelStats {
            uptime: self.connection_started.elapsed(),
            messages: self.message_count,
            errors: self.error_count,
            reconnects: self.reconnect_count,
            last_message_age: self.last_message_received.elapsed(),
            recent_errors: self.recent_errors.len(),
            heartbeats_sent: self.heartbeats_sent,
            pongs_received: self.pongs_received,
            p50_pong_rtt_us: p50,
            p99_pong_rtt_us: p99,
            last_error: self
                .last_error()
                .map(|(context, error)| format!("{context}: {error}")),
        }
    }
}
