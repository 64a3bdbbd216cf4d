//! Gateway module - WebSocket chat sessions
//!
//! ## Architecture
//!
//! ```text
//!   browser / terminal client
//!             │  text in, JSON frames out
//!             ▼
//!   ┌──────────────────┐   reader task   ┌────────────────┐
//!   │  axum WebSocket  │ ──────────────▶ │ Gateway loop   │
//!   │   (transport)    │ ◀────────────── │  one per conn  │
//!   └──────────────────┘    FrameSink    └───────┬────────┘
//!                                                │ answer(question, history)
//!                                                ▼
//!                                        ┌────────────────┐
//!                                        │ AnswerProvider │
//!                                        └────────────────┘
//! ```

mod handler;
mod observer;
pub mod protocol;
mod server;
mod session;
pub mod transport;

pub use handler::{Gateway, GatewayStats, StatsSnapshot, TurnOutcome};
pub use observer::{SessionObserver, TracingObserver};
pub use protocol::{ChatFrame, FrameType, Sender, ERROR_MESSAGE};
pub use server::{router, serve, shutdown_signal, AppState, RESERVED_PATHS};
pub use session::{Session, SessionState, SessionSummary};
pub use transport::{FrameSink, Inbound};
