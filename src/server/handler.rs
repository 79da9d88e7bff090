use std::convert::Infallible;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::stream::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::services::ServeDir;
use tracing::debug;

use super::rebuild::SharedSnapshot;
use super::reload;
use crate::config::ErrorPolicy;
use crate::shutdown::Shutdown;

/// Path of the rebuild event stream.
pub const EVENTS_PATH: &str = "/_/events";

#[derive(Clone)]
pub struct AppState {
    pub snapshot: SharedSnapshot,
    pub reload: broadcast::Sender<()>,
    pub on_error: ErrorPolicy,
    pub shutdown: Shutdown,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(events))
        .fallback(files)
        .with_state(state)
}

/// SSE stream with one `rebuild` event per finished build.
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.reload.subscribe();
    let mut shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        loop {
            let received = tokio::select! {
                _ = shutdown.wait() => None,
                received = rx.recv() => Some(received),
            };
            match received {
                // Missed notifications still mean the build changed.
                Some(Ok(())) | Some(Err(RecvError::Lagged(_))) => {
                    yield Ok(Event::default().data("rebuild"));
                }
                Some(Err(RecvError::Closed)) | None => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Serve a file from the current build, with the reload script in HTML pages.
async fn files(State(state): State<AppState>, request: Request) -> Response {
    let Some(snapshot) = state.snapshot.load_full() else {
        return server_error("not built yet");
    };

    let dir = match (&snapshot.error, &snapshot.dir, state.on_error) {
        (Some(e), _, ErrorPolicy::ShowError) | (Some(e), None, ErrorPolicy::KeepLastGood) => {
            return server_error(e.to_string());
        }
        (_, Some(dir), _) => dir,
        (None, None, _) => return server_error("not built yet"),
    };

    let mut serve_dir = ServeDir::new(dir).append_index_html_on_directories(true);
    let response = match serve_dir.try_call(request).await {
        Ok(response) => response,
        Err(e) => return server_error(e.to_string()),
    };

    let (mut parts, body) = response.into_parts();
    if parts.status.is_redirection() {
        return Response::from_parts(parts, Body::new(body));
    }

    let bytes = match axum::body::to_bytes(Body::new(body), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return server_error(e.to_string()),
    };

    strip_caching_headers(&mut parts.headers);
    let body = if is_html(&parts.headers) {
        debug!(generation = snapshot.generation, "injecting reload script");
        Body::from(reload::inject(&bytes))
    } else {
        Body::from(bytes)
    };

    Response::from_parts(parts, body)
}

fn strip_caching_headers(headers: &mut HeaderMap) {
    headers.remove(CONTENT_LENGTH);
    headers.remove(LAST_MODIFIED);
    headers.remove(ETAG);
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("text/html"))
}

fn server_error(message: impl Into<String>) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message.into()).into_response()
}
