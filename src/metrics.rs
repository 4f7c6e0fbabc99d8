//! Prometheus metrics collection for portald.
//!
//! Exposed on the HTTP endpoint served by [`crate::http`].
//!
//! - `portal_command_total{command}` - Commands dispatched by name
//! - `portal_command_duration_seconds{command}` - Command latency histogram
//! - `portal_command_errors_total{command,error}` - Rejected commands
//! - `portal_message_fanout{scope}` - Recipients reached per chat message
//! - `portal_delivery_failures_total{reason}` - Frames dropped on full or closed queues

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Frames handed to session queues.
pub static FRAMES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Connections refused at authentication.
pub static AUTH_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Commands dispatched by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by name and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Frames that could not be queued, by reason.
pub static DELIVERY_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

/// Currently registered sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Command processing latency by command name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Recipients reached per chat message, by scope.
pub static MESSAGE_FANOUT: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
/// Recording before `init` is a silent no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(FRAMES_SENT, IntCounter::new("portal_frames_sent_total", "Frames queued to sessions"));
    register!(AUTH_FAILURES, IntCounter::new("portal_auth_failures_total", "Connections refused at authentication"));
    register!(CONNECTED_SESSIONS, IntGauge::new("portal_connected_sessions", "Currently registered sessions"));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("portal_command_total", "Commands dispatched by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("portal_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("portal_command_errors_total", "Command errors by name"), &["command", "error"]));
    register!(MESSAGE_FANOUT, HistogramVec::new(
        HistogramOpts::new("portal_message_fanout", "Recipients reached per chat message")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
        &["scope"]));
    register!(DELIVERY_FAILURES, IntCounterVec::new(Opts::new("portal_delivery_failures_total", "Frames dropped before reaching a session queue"), &["reason"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record how many sessions a chat message reached.
#[inline]
pub fn record_fanout(scope: &str, recipients: usize) {
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.with_label_values(&[scope]).observe(recipients as f64);
    }
}

/// Record a frame that could not be queued.
#[inline]
pub fn record_delivery_failure(reason: &str) {
    if let Some(c) = DELIVERY_FAILURES.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_frame_sent() {
    if let Some(c) = FRAMES_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn record_auth_failure() {
    if let Some(c) = AUTH_FAILURES.get() {
        c.inc();
    }
}

/// Publish the current session count.
#[inline]
pub fn set_connected_sessions(count: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(count as i64);
    }
}
