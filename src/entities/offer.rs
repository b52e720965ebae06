use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    #[default]
    Car,
    Bike,
    Auto,
}

/// A ride posted by a rider, kept in `ridelink:rides` newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOffer {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    /// Departure as entered, `YYYY-MM-DDTHH:MM`
    pub time: String,
    pub seats: u32,
    pub vehicle: Vehicle,
    pub distance_km: f64,
    pub price_per_seat: u32,
    pub detour_km: f64,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_round_trip() {
        let offer = RideOffer {
            id: Uuid::new_v4(),
            from: "Vaishali Nagar".to_string(),
            to: "Sitapura".to_string(),
            time: "2026-10-17T08:30".to_string(),
            seats: 2,
            vehicle: Vehicle::Bike,
            distance_km: 18.5,
            price_per_seat: 28,
            detour_km: 1.5,
            created_at: 1_760_000_000_000,
        };

        let raw = serde_json::to_string(&offer).unwrap();
        assert!(raw.contains(r#""vehicle":"bike""#));
        assert!(raw.contains(r#""pricePerSeat":28"#));
        assert_eq!(serde_json::from_str::<RideOffer>(&raw).unwrap(), offer);
    }
}
