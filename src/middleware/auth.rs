use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};

use crate::entities::auth::AuthRecord;
use crate::error::{AppError, AppResult};
use crate::routes::pages::{login_redirect, Page};
use crate::AppState;

/// Require a signed-in session and expose the auth record to handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let Some(auth) = state.session.auth().await else {
        // nested routers see a stripped uri
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        let page = Page::for_api_path(&path);

        tracing::debug!(path = %path, "Rejected request without a session");
        return Err(AppError::Unauthorized {
            message: "Please login to continue".to_string(),
            redirect: login_redirect(page.path()),
        });
    };

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Require a rider whose KYC documents are on file
pub async fn require_rider(request: Request, next: Next) -> AppResult<Response> {
    let auth = request
        .extensions()
        .get::<AuthRecord>()
        .ok_or_else(|| AppError::Unauthorized {
            message: "Please login to continue".to_string(),
            redirect: login_redirect(Page::PostRide.path()),
        })?;

    if !auth.can_offer_rides() {
        return Err(AppError::Forbidden(
            "Switch to Rider and complete KYC to offer rides".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
