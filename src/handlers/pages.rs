use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::routes::pages::{guard, requires_auth, Page};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    pub page: Page,
    pub requires_auth: bool,
    /// Login page to show instead, when the visitor is signed out
    pub redirect: Option<String>,
}

/// Resolve a page path and apply the login guard
pub async fn navigate(
    State(state): State<AppState>,
    Query(query): Query<NavigateQuery>,
) -> Json<NavigateResponse> {
    let target = query.path.unwrap_or_else(|| "/".to_string());
    let signed_in = state.session.auth().await.is_some();

    Json(NavigateResponse {
        page: Page::from_path(&target),
        requires_auth: requires_auth(&target),
        redirect: guard(&target, signed_in),
    })
}

/// Stream of store changes so open clients can re-read session state
pub async fn storage_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.session.store().subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(change) => Event::default().event("storage").json_data(&change).ok().map(Ok),
        Err(e) => {
            // lagged receivers skip ahead; clients re-read on the next event
            tracing::debug!(error = %e, "Storage event stream lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
