//! The session loop

use super::observer::{SessionObserver, TracingObserver};
use super::protocol::ChatFrame;
use super::session::{Session, SessionSummary};
use super::transport::{FrameSink, Inbound};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::provider::ProviderFactory;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Process-wide counters, shared by every session
#[derive(Debug, Default)]
pub struct GatewayStats {
    active_sessions: AtomicU64,
    total_sessions: AtomicU64,
    turns: AtomicU64,
    failed_turns: AtomicU64,
}

impl GatewayStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            total_sessions: self.total_sessions.load(Ordering::Relaxed),
            turns: self.turns.load(Ordering::Relaxed),
            failed_turns: self.failed_turns.load(Ordering::Relaxed),
        }
    }

    fn session_opened(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
    }

    fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    fn turn(&self, failed: bool) {
        self.turns.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_turns.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of [`GatewayStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub active_sessions: u64,
    pub total_sessions: u64,
    pub turns: u64,
    pub failed_turns: u64,
}

/// How a turn ended, from the client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    Failed,
}

/// Serves chat sessions: one [`Gateway::accept`] call per connection.
pub struct Gateway {
    factory: Arc<dyn ProviderFactory>,
    observer: Arc<dyn SessionObserver>,
    stats: Arc<GatewayStats>,
    answer_timeout: Duration,
    opening_question: Option<String>,
}

impl Gateway {
    pub fn new(factory: Arc<dyn ProviderFactory>, config: &GatewayConfig) -> Self {
        Gateway {
            factory,
            observer: Arc::new(TracingObserver),
            stats: Arc::default(),
            answer_timeout: config.answer_timeout,
            opening_question: config.opening_question.clone(),
        }
    }

    /// Replace the default tracing observer
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn stats(&self) -> &Arc<GatewayStats> {
        &self.stats
    }

    /// Run a session until the client disconnects.
    ///
    /// Sends the opening answer if one is configured, then answers every
    /// non-blank message in order. Never fails: upstream errors become
    /// `error` frames and disconnect ends the session.
    pub async fn accept<S>(&self, sink: &mut S, mut inbound: Inbound) -> SessionSummary
    where
        S: FrameSink + ?Sized,
    {
        let mut session = Session::new(self.factory.create());
        self.stats.session_opened();
        self.observer.session_opened(session.id());
        session.mark_ready();

        if let Err(e) = self.serve(&mut session, sink, &mut inbound).await {
            if e.is_disconnect() {
                debug!(session_id = %session.id(), "Client left mid-turn");
            } else {
                warn!(session_id = %session.id(), "Session loop ended: {}", e);
            }
        }

        session.close();
        self.stats.session_closed();
        let summary = session.summary();
        self.observer.session_closed(&summary);
        summary
    }

    async fn serve<S>(&self, session: &mut Session, sink: &mut S, inbound: &mut Inbound) -> Result<()>
    where
        S: FrameSink + ?Sized,
    {
        let closed = inbound.closed().clone();

        if let Some(question) = &self.opening_question {
            self.answer(session, sink, &closed, question).await?;
        }

        while let Some(text) = inbound.recv().await {
            if text.trim().is_empty() {
                continue;
            }
            self.handle_turn(session, sink, &closed, &text).await?;
        }

        Ok(())
    }

    /// One client turn: echo, then the bracketed answer or an error frame.
    ///
    /// Returns `Err` only when the connection is gone.
    pub async fn handle_turn<S>(
        &self,
        session: &mut Session,
        sink: &mut S,
        closed: &CancellationToken,
        text: &str,
    ) -> Result<TurnOutcome>
    where
        S: FrameSink + ?Sized,
    {
        self.observer.turn_received(session.id(), text);
        sink.send_frame(&ChatFrame::echo(text)).await?;
        self.answer(session, sink, closed, text).await
    }

    async fn answer<S>(
        &self,
        session: &mut Session,
        sink: &mut S,
        closed: &CancellationToken,
        question: &str,
    ) -> Result<TurnOutcome>
    where
        S: FrameSink + ?Sized,
    {
        sink.send_frame(&ChatFrame::start()).await?;

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = closed.cancelled() => return Err(Error::ConnectionClosed),
            result = session.ask(question, self.answer_timeout) => result,
        };

        match result {
            Ok(answer) => {
                self.stats.turn(false);
                self.observer.turn_answered(session.id(), started.elapsed());
                sink.send_frame(&ChatFrame::stream(answer)).await?;
                sink.send_frame(&ChatFrame::end()).await?;
                Ok(TurnOutcome::Answered)
            }
            Err(e) => {
                self.stats.turn(true);
                self.observer.turn_failed(session.id(), &e);
                sink.send_frame(&ChatFrame::error()).await?;
                Ok(TurnOutcome::Failed)
            }
        }
    }
}
