use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::entities::ride::{Ride, RideError, RideState, TripRequest};
use crate::entities::rider::{self, Rider};
use crate::error::{AppError, AppResult};
use crate::utils::otp::generate_ride_otp;
use crate::utils::ranking::{best_match, rank, SortCriterion};
use crate::{now_ms, AppState};

pub const MAX_SEATS: u32 = 4;

const DEFAULT_FROM: &str = "Current location";
const DEFAULT_TO: &str = "Destination";

fn place_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Missing or unparseable counts fall back to one seat
fn seats_or_one(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SEATS)
}

fn criterion_or_default(raw: Option<&str>) -> SortCriterion {
    match raw.map(str::parse::<SortCriterion>) {
        Some(Ok(criterion)) => criterion,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Falling back to price ordering");
            SortCriterion::default()
        }
        None => SortCriterion::default(),
    }
}

// ============ Rider directory ============

#[derive(Debug, Deserialize)]
pub struct RankQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RankedRiders {
    pub sort: SortCriterion,
    pub riders: Vec<Rider>,
    pub best_match: Option<Rider>,
}

fn ranked(sort: SortCriterion) -> RankedRiders {
    let catalog = rider::catalog();
    RankedRiders {
        sort,
        riders: rank(&catalog, sort),
        best_match: best_match(&catalog),
    }
}

/// Rider catalog in the requested order
pub async fn list_riders(Query(query): Query<RankQuery>) -> Json<RankedRiders> {
    Json(ranked(criterion_or_default(query.sort.as_deref())))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub seats: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub from: String,
    pub to: String,
    pub seats: u32,
    #[serde(flatten)]
    pub ranking: RankedRiders,
    pub current_ride: Option<Ride>,
}

/// Search results for a trip, alongside any ride already in flight
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let ranking = ranked(criterion_or_default(query.sort.as_deref()));
    let current_ride = state.session.ride_state().await.into_ride();

    Ok(Json(SearchResponse {
        from: place_or(query.from, DEFAULT_FROM),
        to: place_or(query.to, DEFAULT_TO),
        seats: seats_or_one(query.seats.as_deref()),
        ranking,
        current_ride,
    }))
}

// ============ Ride lifecycle ============

#[derive(Debug, Deserialize)]
pub struct RequestRideRequest {
    pub rider_id: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub seats: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    /// `idle`, `allocated` or `ongoing`
    pub state: &'static str,
    pub ride: Option<Ride>,
    pub notice: Option<String>,
}

impl RideResponse {
    fn new(state: RideState, notice: Option<String>) -> Self {
        Self {
            state: state.name(),
            ride: state.into_ride(),
            notice,
        }
    }
}

/// Pick a rider and wait for them to accept
pub async fn request_ride(
    State(state): State<AppState>,
    Json(payload): Json<RequestRideRequest>,
) -> AppResult<Json<RideResponse>> {
    let rider = rider::find(&payload.rider_id)
        .ok_or_else(|| AppError::NotFound("Rider not found".to_string()))?;

    let trip = TripRequest {
        from: place_or(payload.from, DEFAULT_FROM),
        to: place_or(payload.to, DEFAULT_TO),
        seats: payload.seats.unwrap_or(1).clamp(1, MAX_SEATS),
    };

    // fail before the wait when a ride is already in flight
    if state.session.ride_state().await != RideState::Idle {
        return Err(RideError::AlreadyActive.into());
    }

    tracing::info!(rider = %rider.id, "Waiting for rider to accept");
    tokio::time::sleep(state.config.allocation_delay).await;

    let _guard = state.session.lock_rides().await;
    // the session may have ended during the wait
    let auth = state.session.auth().await;
    let current = state.session.ride_state().await;

    let rider_name = rider.name.clone();
    let eta_min = rider.eta_min;
    let next = current.allocate(auth.as_ref(), rider, trip, generate_ride_otp(), now_ms())?;
    state.session.set_ride_state(&next).await?;

    tracing::info!(ride = ?next.ride().map(|r| &r.id), "Ride allocated");
    Ok(Json(RideResponse::new(
        next,
        Some(format!("{} arriving in {} min", rider_name, eta_min)),
    )))
}

pub async fn current_ride(State(state): State<AppState>) -> AppResult<Json<RideResponse>> {
    Ok(Json(RideResponse::new(state.session.ride_state().await, None)))
}

/// Start the ride once the passenger's code matches
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<RideResponse>> {
    let _guard = state.session.lock_rides().await;
    let current = state.session.ride_state().await;

    let next = current.verify_otp(&payload.otp).inspect_err(|e| {
        tracing::info!(error = %e, "Ride OTP rejected");
    })?;
    state.session.set_ride_state(&next).await?;

    Ok(Json(RideResponse::new(
        next,
        Some("OTP verified. Ride started".to_string()),
    )))
}

pub async fn complete_ride(State(state): State<AppState>) -> AppResult<Json<RideResponse>> {
    let _guard = state.session.lock_rides().await;
    let next = state.session.ride_state().await.complete()?;
    state.session.set_ride_state(&next).await?;

    tracing::info!("Ride completed");
    Ok(Json(RideResponse::new(
        next,
        Some("Ride completed. Thanks for riding with RideLink".to_string()),
    )))
}

pub async fn cancel_ride(State(state): State<AppState>) -> AppResult<Json<RideResponse>> {
    let _guard = state.session.lock_rides().await;
    let next = state.session.ride_state().await.cancel()?;
    state.session.set_ride_state(&next).await?;

    tracing::info!("Ride canceled");
    Ok(Json(RideResponse::new(next, Some("Ride canceled".to_string()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults() {
        assert_eq!(place_or(None, DEFAULT_FROM), "Current location");
        assert_eq!(place_or(Some("  ".to_string()), DEFAULT_TO), "Destination");
        assert_eq!(place_or(Some(" C-Scheme ".to_string()), DEFAULT_TO), "C-Scheme");
    }

    #[test]
    fn test_seats_fall_back_to_one() {
        assert_eq!(seats_or_one(None), 1);
        assert_eq!(seats_or_one(Some("abc")), 1);
        assert_eq!(seats_or_one(Some("3")), 3);
        assert_eq!(seats_or_one(Some("0")), 1);
        assert_eq!(seats_or_one(Some("9")), MAX_SEATS);
    }

    #[test]
    fn test_unknown_sort_uses_price() {
        assert_eq!(criterion_or_default(Some("nearest")), SortCriterion::Price);
        assert_eq!(criterion_or_default(Some("rating")), SortCriterion::Rating);
    }
}
