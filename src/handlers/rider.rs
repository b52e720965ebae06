use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::offer::{RideOffer, Vehicle};
use crate::error::{AppError, AppResult};
use crate::handlers::passenger::MAX_SEATS;
use crate::utils::pricing::{suggested_price_per_seat, total_payout, MIN_DISTANCE_KM};
use crate::{now_ms, AppState};

/// Format produced by a `datetime-local` input
const DEPARTURE_FORMAT: &str = "%Y-%m-%dT%H:%M";

fn validate_departure(time: &str) -> Result<(), ValidationError> {
    NaiveDateTime::parse_from_str(time, DEPARTURE_FORMAT)
        .map(|_| ())
        .map_err(|_| ValidationError::new("time").with_message("Select date & time".into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostRideRequest {
    #[validate(length(min = 2, message = "Enter pickup location"))]
    pub from: String,
    #[validate(length(min = 2, message = "Enter drop location"))]
    pub to: String,
    #[validate(custom(function = "validate_departure"))]
    pub time: String,
    #[validate(range(min = 1, max = 4, message = "Choose between 1 and 4 seats"))]
    pub seats: u32,
    #[serde(default)]
    pub vehicle: Vehicle,
    #[validate(range(min = 0.5, message = "Distance must be >= 0.5 km"))]
    pub distance_km: f64,
    #[validate(range(min = 1, message = "Price must be >= 1"))]
    pub price_per_seat: u32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 10.0, message = "Detour must be between 0 and 10 km"))]
    pub detour_km: f64,
}

#[derive(Debug, Serialize)]
pub struct PostRideResponse {
    pub offer: RideOffer,
    /// Search page for the posted route
    pub redirect: String,
}

#[derive(Serialize)]
struct SearchLink<'a> {
    from: &'a str,
    to: &'a str,
    seats: u32,
}

/// Publish a ride offer
pub async fn post_ride(
    State(state): State<AppState>,
    Json(payload): Json<PostRideRequest>,
) -> AppResult<Json<PostRideResponse>> {
    let payload = PostRideRequest {
        from: payload.from.trim().to_string(),
        to: payload.to.trim().to_string(),
        ..payload
    };
    payload.validate()?;

    let offer = RideOffer {
        id: Uuid::new_v4(),
        from: payload.from,
        to: payload.to,
        time: payload.time,
        seats: payload.seats,
        vehicle: payload.vehicle,
        distance_km: payload.distance_km,
        price_per_seat: payload.price_per_seat,
        detour_km: payload.detour_km,
        created_at: now_ms(),
    };
    state.session.post_offer(offer.clone()).await?;

    tracing::info!(offer = %offer.id, seats = offer.seats, "Ride posted");

    let link = SearchLink {
        from: &offer.from,
        to: &offer.to,
        seats: offer.seats,
    };
    let redirect = serde_urlencoded::to_string(link)
        .map(|query| format!("/search?{}", query))
        .unwrap_or_else(|_| "/search".to_string());

    Ok(Json(PostRideResponse { offer, redirect }))
}

/// Posted offers, newest first
pub async fn list_offers(State(state): State<AppState>) -> Json<Vec<RideOffer>> {
    Json(state.session.offers().await)
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub vehicle: Option<Vehicle>,
    pub distance_km: Option<f64>,
    pub seats: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub vehicle: Vehicle,
    pub distance_km: f64,
    pub seats: u32,
    pub suggested_price_per_seat: u32,
    pub total_payout: u32,
}

/// Suggested per-seat price for an offer being drafted
pub async fn quote(Query(query): Query<QuoteQuery>) -> AppResult<Json<QuoteResponse>> {
    let vehicle = query.vehicle.unwrap_or_default();
    let distance_km = query.distance_km.unwrap_or(10.0);
    if !distance_km.is_finite() || distance_km < MIN_DISTANCE_KM {
        return Err(AppError::BadRequest(format!(
            "Distance must be >= {} km",
            MIN_DISTANCE_KM
        )));
    }
    let seats = query.seats.unwrap_or(2).clamp(1, MAX_SEATS);
    let price = suggested_price_per_seat(vehicle, distance_km, seats);

    Ok(Json(QuoteResponse {
        vehicle,
        distance_km,
        seats,
        suggested_price_per_seat: price,
        total_payout: total_payout(price, seats),
    }))
}
