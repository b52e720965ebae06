use crate::entities::offer::Vehicle;

/// Floor for a suggested per-seat price, in rupees
pub const MIN_SEAT_PRICE: u32 = 5;

/// Shortest trip that can be offered or quoted
pub const MIN_DISTANCE_KM: f64 = 0.5;

/// Base running cost in rupees per km
pub fn vehicle_base(vehicle: Vehicle) -> f64 {
    match vehicle {
        Vehicle::Bike => 3.0,
        Vehicle::Auto => 5.0,
        Vehicle::Car => 6.5,
    }
}

/// Trip cost split across the offered seats, rounded to whole rupees
pub fn suggested_price_per_seat(vehicle: Vehicle, distance_km: f64, seats: u32) -> u32 {
    let seats = seats.max(1) as f64;
    let per_seat = (vehicle_base(vehicle) * distance_km.max(0.0) / seats).round();
    (per_seat as u32).max(MIN_SEAT_PRICE)
}

/// Saturates instead of wrapping for absurd prices
pub fn total_payout(price_per_seat: u32, seats: u32) -> u32 {
    price_per_seat.saturating_mul(seats.max(1))
}
