pub mod pages;

use axum::{
    handler::Handler,
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{account, auth, help, pages as page_handlers, passenger, rider};
use crate::middleware::auth::{auth_middleware, require_rider};
use crate::middleware::rate_limit::{limit_login_code, limit_ride_otp};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Login / registration flow (public)
    let login_routes = Router::new()
        .route("/", get(auth::login_state))
        .route("/details", post(auth::submit_details))
        .route("/resend", post(auth::resend_code))
        .route(
            "/verify",
            post(auth::verify_code.layer(middleware::from_fn_with_state(state.clone(), limit_login_code))),
        )
        .route("/role", post(auth::choose_role))
        .route("/kyc", post(auth::submit_kyc));

    // Public routes
    let public_routes = Router::new()
        .route("/navigate", get(page_handlers::navigate))
        .route("/events", get(page_handlers::storage_events))
        .route("/riders", get(passenger::list_riders))
        .route("/help", get(help::greeting))
        .route("/help/messages", post(help::send_message));

    // Search page (requires session)
    let ride_routes = Router::new()
        .route("/search", get(passenger::search))
        .route("/rides", post(passenger::request_ride))
        .route("/rides/current", get(passenger::current_ride))
        .route(
            "/rides/current/verify",
            post(passenger::verify_otp.layer(middleware::from_fn_with_state(state.clone(), limit_ride_otp))),
        )
        .route("/rides/current/complete", post(passenger::complete_ride))
        .route("/rides/current/cancel", post(passenger::cancel_ride))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Post-ride page: anyone signed in may browse and price, riders with KYC may post
    let offer_routes = Router::new()
        .route(
            "/",
            get(rider::list_offers)
                .post(rider::post_ride.layer(middleware::from_fn(require_rider))),
        )
        .route("/quote", get(rider::quote))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Account page (requires session)
    let account_routes = Router::new()
        .route(
            "/",
            get(account::get_account)
                .put(account::update_profile)
                .delete(account::delete_account),
        )
        .route("/kyc", post(account::save_kyc))
        .route("/logout", post(account::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/login", login_routes)
        .nest("/api", public_routes.merge(ride_routes))
        .nest("/api/offers", offer_routes)
        .nest("/api/account", account_routes)
        .with_state(state)
}
