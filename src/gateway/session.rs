//! Per-connection session state

use crate::error::{Error, Result};
use crate::provider::{AnswerProvider, HistoryEntry};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle of a session.
///
/// `Connecting -> Ready -> (AwaitingAnswer -> Ready)* -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Ready,
    AwaitingAnswer,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::AwaitingAnswer => "awaiting_answer",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// One client's conversation. Owned by the task serving its connection.
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: SessionState,
    history: Vec<HistoryEntry>,
    provider: Box<dyn AnswerProvider>,
    turns: u64,
    failed_turns: u64,
}

impl Session {
    /// New session in the `Connecting` state
    pub fn new(provider: Box<dyn AnswerProvider>) -> Self {
        Session {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: SessionState::Connecting,
            history: Vec::new(),
            provider,
            turns: 0,
            failed_turns: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Completed exchanges, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Connection established
    pub fn mark_ready(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Ready;
        }
    }

    /// Connection gone. Terminal.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Ask the provider, bounded by `limit`.
    ///
    /// The exchange is appended to history only on success. If the returned
    /// future is dropped mid-call the session stays in `AwaitingAnswer`
    /// until [`Session::close`].
    pub async fn ask(&mut self, question: &str, limit: Duration) -> Result<String> {
        if self.state != SessionState::Ready {
            return Err(Error::Internal(format!(
                "session {} cannot take a question while {}",
                self.id, self.state
            )));
        }

        self.state = SessionState::AwaitingAnswer;
        self.turns += 1;

        let result = match tokio::time::timeout(limit, self.provider.answer(question, &self.history)).await {
            Ok(result) => result,
            Err(_) => Err(Error::UpstreamTimeout(format!(
                "no answer within {}",
                humantime_serde::re::humantime::format_duration(limit)
            ))),
        };

        self.state = SessionState::Ready;
        match result {
            Ok(answer) => {
                self.history.push(HistoryEntry::new(question, answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                self.failed_turns += 1;
                Err(e)
            }
        }
    }

    /// Summary for logging once the session ends
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            turns: self.turns,
            failed_turns: self.failed_turns,
            history_len: self.history.len(),
            duration: (Utc::now() - self.created_at).to_std().unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("state", &self.state)
            .field("history_len", &self.history.len())
            .finish()
    }
}

/// What a session did over its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub turns: u64,
    pub failed_turns: u64,
    pub history_len: usize,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl AnswerProvider for Fixed {
        async fn answer(&mut self, _question: &str, _history: &[HistoryEntry]) -> Result<String> {
            self.0
                .map(String::from)
                .ok_or_else(|| Error::UpstreamRejected("quota".into()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl AnswerProvider for Stalled {
        async fn answer(&mut self, _question: &str, _history: &[HistoryEntry]) -> Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_success_is_recorded() {
        let mut session = Session::new(Box::new(Fixed(Some("4."))));
        assert_eq!(session.state(), SessionState::Connecting);
        session.mark_ready();

        let answer = session.ask("What is 2+2?", Duration::from_secs(1)).await.unwrap();
        assert_eq!(answer, "4.");
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.history(), &[HistoryEntry::new("What is 2+2?", "4.")]);
    }

    #[tokio::test]
    async fn test_failure_leaves_history_unchanged() {
        let mut session = Session::new(Box::new(Fixed(None)));
        session.mark_ready();

        assert!(session.ask("hi", Duration::from_secs(1)).await.is_err());
        assert!(session.history().is_empty());
        assert_eq!(session.state(), SessionState::Ready);

        let summary = session.summary();
        assert_eq!(summary.turns, 1);
        assert_eq!(summary.failed_turns, 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut session = Session::new(Box::new(Stalled));
        session.mark_ready();

        let err = session.ask("hi", Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout(_)));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_questions() {
        let mut session = Session::new(Box::new(Fixed(Some("4."))));
        session.mark_ready();
        session.close();
        session.mark_ready();

        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.ask("hi", Duration::from_secs(1)).await.is_err());
    }
}
