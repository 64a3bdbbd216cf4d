//! Outbound chat frames
//!
//! Every message the gateway sends is one JSON object:
//!
//! ```json
//! { "sender": "bot", "message": "4.", "type": "stream" }
//! ```
//!
//! An answer is always bracketed as `start`, `stream`, `end`. A failed turn
//! sends a single `error` frame in place of `stream` and `end`.

use serde::{Deserialize, Serialize};

/// Message shown to the client when a turn fails
pub const ERROR_MESSAGE: &str = "Sorry, something went wrong. Try again.";

/// Who a frame is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Echo of the client's own question
    You,
    /// Answer frames
    Bot,
}

/// Position of a frame within one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Start,
    Stream,
    End,
    Error,
}

/// One outbound frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub sender: Sender,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: FrameType,
}

impl ChatFrame {
    fn new(sender: Sender, message: impl Into<String>, kind: FrameType) -> Self {
        ChatFrame {
            sender,
            message: message.into(),
            kind,
        }
    }

    /// Echo of the question as received
    pub fn echo(question: impl Into<String>) -> Self {
        Self::new(Sender::You, question, FrameType::Stream)
    }

    /// Opens an answer
    pub fn start() -> Self {
        Self::new(Sender::Bot, "", FrameType::Start)
    }

    /// Carries the full answer text
    pub fn stream(answer: impl Into<String>) -> Self {
        Self::new(Sender::Bot, answer, FrameType::Stream)
    }

    /// Closes an answer
    pub fn end() -> Self {
        Self::new(Sender::Bot, "", FrameType::End)
    }

    /// Replaces `stream` and `end` when the turn failed
    pub fn error() -> Self {
        Self::new(Sender::Bot, ERROR_MESSAGE, FrameType::Error)
    }

    /// Serialize for the wire
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
