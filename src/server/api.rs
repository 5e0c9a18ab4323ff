use crate::agent::ChatAgent;
use crate::error::AgentError;
use crate::models::api::{ ChatRequest, ErrorResponse };
use std::any::Any;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::post,
    Router,
    Json,
    extract::{ DefaultBodyLimit, State, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    http::{ StatusCode, Uri },
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{ Any as AnyOrigin, CorsLayer };
use log::{ info, warn, error, debug };
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    agent: Arc<ChatAgent>,
}

pub fn router(agent: Arc<ChatAgent>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(AppState { agent })
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<ChatAgent>,
    max_body_bytes: usize
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(agent, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
        e
    })?;
    info!("HTTP server listening on: http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>
) -> Response {
    let request_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("[{}] Rejected chat payload: {}", request_id, rejection.body_text());
            return AgentError::Unexpected(rejection.body_text()).into_response();
        }
    };

    info!(
        "[{}] Chat request: message={} audio={}",
        request_id,
        request.message.as_deref().map_or(0, str::len),
        request.audio.as_deref().map_or(0, str::len)
    );

    // Detached from the connection: a client hanging up mid-generation does
    // not cut the request short.
    let agent = state.agent.clone();
    let outcome = tokio::spawn(async move { agent.process_message(request).await }).await;

    match outcome {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => {
            warn!("[{}] Chat request failed ({}): {}", request_id, e.status_code(), e);
            e.into_response()
        }
        Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
        Err(join_err) => {
            error!("[{}] Chat task aborted: {}", request_id, join_err);
            AgentError::Unexpected(join_err.to_string()).into_response()
        }
    }
}

async fn not_found_handler(uri: Uri) -> Response {
    debug!("No route for {}", uri);
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::with_error("Endpoint not found", "The requested endpoint does not exist.")),
    ).into_response()
}

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_error("Internal server error", "Something went wrong on our end.")),
    ).into_response()
}
