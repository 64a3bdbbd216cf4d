//! Session lifecycle hooks

use super::session::SessionSummary;
use crate::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const TRACING_TARGET: &str = "chat_relay::session";

/// Receives session lifecycle events from the gateway.
///
/// All methods have empty default bodies so implementations pick only the
/// events they care about.
pub trait SessionObserver: Send + Sync {
    fn session_opened(&self, _session: Uuid) {}

    fn turn_received(&self, _session: Uuid, _question: &str) {}

    fn turn_answered(&self, _session: Uuid, _latency: Duration) {}

    fn turn_failed(&self, _session: Uuid, _error: &Error) {}

    fn session_closed(&self, _summary: &SessionSummary) {}
}

/// Default observer: one `tracing` event per lifecycle step
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn session_opened(&self, session: Uuid) {
        info!(target: TRACING_TARGET, session_id = %session, "session opened");
    }

    fn turn_received(&self, session: Uuid, question: &str) {
        debug!(
            target: TRACING_TARGET,
            session_id = %session,
            question_len = question.len(),
            "turn received"
        );
    }

    fn turn_answered(&self, session: Uuid, latency: Duration) {
        info!(
            target: TRACING_TARGET,
            session_id = %session,
            latency_ms = latency.as_millis() as u64,
            "turn answered"
        );
    }

    fn turn_failed(&self, session: Uuid, error: &Error) {
        if error.is_upstream() {
            warn!(
                target: TRACING_TARGET,
                session_id = %session,
                error = %error,
                "turn failed"
            );
        } else {
            error!(
                target: TRACING_TARGET,
                session_id = %session,
                error = %error,
                "turn failed outside the provider"
            );
        }
    }

    fn session_closed(&self, summary: &SessionSummary) {
        info!(
            target: TRACING_TARGET,
            session_id = %summary.id,
            turns = summary.turns,
            failed_turns = summary.failed_turns,
            history_len = summary.history_len,
            duration_ms = summary.duration.as_millis() as u64,
            "session closed"
        );
    }
}
