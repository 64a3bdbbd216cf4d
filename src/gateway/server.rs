//! HTTP surface: chat WebSocket, bundled page, health

use super::handler::{Gateway, StatsSnapshot};
use super::transport;
use crate::agent::CompletionClient;
use crate::config::AnswerMode;
use crate::error::Result;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Embedded chat page
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Placeholder in the page replaced by the chat path as a JS string literal
const CHAT_PATH_PLACEHOLDER: &str = "__CHAT_PATH__";

const INDEX_PATH: &str = "/";
const HEALTH_PATH: &str = "/health";

/// Routes the chat socket cannot be mounted on
pub const RESERVED_PATHS: &[&str] = &[INDEX_PATH, HEALTH_PATH];

/// Shared by every request handler
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<Gateway>,
    mode: AnswerMode,
    client: Option<CompletionClient>,
}

impl AppState {
    pub fn new(gateway: Gateway, mode: AnswerMode) -> Self {
        AppState {
            gateway: Arc::new(gateway),
            mode,
            client: None,
        }
    }

    /// Report the client's token usage on `/health`
    pub fn with_client(mut self, client: CompletionClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    mode: AnswerMode,
    #[serde(flatten)]
    stats: StatsSnapshot,
    total_tokens: u64,
}

/// The bundled page with the socket path filled in
fn render_index(chat_path: &str) -> String {
    let literal = serde_json::Value::from(chat_path).to_string().replace("</", "<\\/");
    INDEX_HTML.replace(CHAT_PATH_PLACEHOLDER, &literal)
}

async fn serve_index(page: Arc<str>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], page.to_string())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        mode: state.mode,
        stats: state.gateway.stats().snapshot(),
        total_tokens: state.client.as_ref().map_or(0, |c| c.total_tokens()),
    })
}

async fn chat_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (mut sink, inbound, reader) = transport::split(socket);
        state.gateway.accept(&mut sink, inbound).await;
        reader.abort();
        sink.close().await;
    })
}

/// Build the router with the chat socket mounted at `chat_path`
pub fn router(state: AppState, chat_path: &str) -> Router {
    let page: Arc<str> = render_index(chat_path).into();
    Router::new()
        .route(INDEX_PATH, get(move || serve_index(page.clone())))
        .route(HEALTH_PATH, get(health))
        .route(chat_path, get(chat_socket))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve until `shutdown` resolves. New connections stop being accepted
/// at that point; open sessions run until their clients leave.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Chat relay listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_connects_to_configured_path() {
        let page = render_index("/ws/tutor");
        assert!(page.contains(r#"const chatPath = "/ws/tutor";"#));
        assert!(!page.contains(CHAT_PATH_PLACEHOLDER));
    }

    #[test]
    fn test_page_path_cannot_close_script() {
        let page = render_index("/a</script>");
        assert!(!page.contains("/a</script>"));
        assert!(page.contains(r#""/a<\/script>""#));
    }
}
