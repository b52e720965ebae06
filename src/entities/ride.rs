use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::auth::AuthRecord;
use super::rider::Rider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Allocated,
    Ongoing,
    Completed,
}

/// The single active ride, stored under `ridelink:currentRide`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: String,
    pub rider: Rider,
    pub from: String,
    pub to: String,
    pub seats: u32,
    pub otp: String,
    pub status: RideStatus,
    /// Unix epoch milliseconds
    pub created_at: i64,
}

/// Where the passenger wants to go
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub from: String,
    pub to: String,
    pub seats: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RideError {
    #[error("Please login to request a ride")]
    Unauthenticated,
    #[error("A ride is already in progress")]
    AlreadyActive,
    #[error("No active ride")]
    NoActiveRide,
    #[error("Incorrect OTP")]
    IncorrectOtp,
    #[error("Cannot {action} a ride that is {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

/// Lifecycle of the active ride.
///
/// `Completed` and canceled rides are never kept: both collapse to `Idle`,
/// which is stored as an absent `currentRide` key.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RideState {
    #[default]
    Idle,
    Allocated(Ride),
    Ongoing(Ride),
}

impl RideState {
    pub fn from_stored(ride: Option<Ride>) -> Self {
        match ride {
            Some(r) if r.status == RideStatus::Allocated => RideState::Allocated(r),
            Some(r) if r.status == RideStatus::Ongoing => RideState::Ongoing(r),
            _ => RideState::Idle,
        }
    }

    pub fn ride(&self) -> Option<&Ride> {
        match self {
            RideState::Idle => None,
            RideState::Allocated(r) | RideState::Ongoing(r) => Some(r),
        }
    }

    pub fn into_ride(self) -> Option<Ride> {
        match self {
            RideState::Idle => None,
            RideState::Allocated(r) | RideState::Ongoing(r) => Some(r),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RideState::Idle => "idle",
            RideState::Allocated(_) => "allocated",
            RideState::Ongoing(_) => "ongoing",
        }
    }

    /// Idle -> Allocated. Needs a signed-in session and no ride in flight.
    pub fn allocate(
        &self,
        auth: Option<&AuthRecord>,
        rider: Rider,
        trip: TripRequest,
        otp: String,
        now_ms: i64,
    ) -> Result<RideState, RideError> {
        if auth.is_none() {
            return Err(RideError::Unauthenticated);
        }
        if !matches!(self, RideState::Idle) {
            return Err(RideError::AlreadyActive);
        }

        Ok(RideState::Allocated(Ride {
            id: format!("ride_{}", now_ms),
            rider,
            from: trip.from,
            to: trip.to,
            seats: trip.seats,
            otp,
            status: RideStatus::Allocated,
            created_at: now_ms,
        }))
    }

    /// Allocated -> Ongoing, only on an exact match with the issued code.
    /// Retries are unlimited.
    pub fn verify_otp(&self, submitted: &str) -> Result<RideState, RideError> {
        match self {
            RideState::Allocated(ride) => {
                if submitted != ride.otp {
                    return Err(RideError::IncorrectOtp);
                }
                let mut started = ride.clone();
                started.status = RideStatus::Ongoing;
                Ok(RideState::Ongoing(started))
            }
            RideState::Ongoing(_) => Err(RideError::InvalidTransition {
                state: self.name(),
                action: "verify",
            }),
            RideState::Idle => Err(RideError::NoActiveRide),
        }
    }

    pub fn cancel(&self) -> Result<RideState, RideError> {
        match self {
            RideState::Allocated(_) | RideState::Ongoing(_) => Ok(RideState::Idle),
            RideState::Idle => Err(RideError::NoActiveRide),
        }
    }

    pub fn complete(&self) -> Result<RideState, RideError> {
        match self {
            RideState::Ongoing(_) => Ok(RideState::Idle),
            RideState::Allocated(_) => Err(RideError::InvalidTransition {
                state: self.name(),
                action: "complete",
            }),
            RideState::Idle => Err(RideError::NoActiveRide),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::auth::Role;
    use crate::entities::rider;

    fn auth() -> AuthRecord {
        AuthRecord {
            role: Role::Passenger,
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            email: "asha@gmail.com".to_string(),
            docs: None,
        }
    }

    fn trip() -> TripRequest {
        TripRequest {
            from: "Malviya Nagar".to_string(),
            to: "MI Road".to_string(),
            seats: 1,
        }
    }

    fn allocated(otp: &str) -> RideState {
        let rider = rider::find("r1").unwrap();
        RideState::Idle
            .allocate(Some(&auth()), rider, trip(), otp.to_string(), 1_700_000_000_000)
            .unwrap()
    }

    #[test]
    fn test_allocate_builds_ride() {
        let state = allocated("4821");
        let ride = state.ride().unwrap();

        assert_eq!(state.name(), "allocated");
        assert_eq!(ride.id, "ride_1700000000000");
        assert_eq!(ride.rider.id, "r1");
        assert_eq!(ride.otp, "4821");
        assert_eq!(ride.status, RideStatus::Allocated);
        assert_eq!(ride.from, "Malviya Nagar");
    }

    #[test]
    fn test_allocate_without_session_fails() {
        let rider = rider::find("r1").unwrap();
        let result = RideState::Idle.allocate(None, rider, trip(), "1234".to_string(), 0);
        assert_eq!(result, Err(RideError::Unauthenticated));
    }

    #[test]
    fn test_allocate_twice_fails() {
        let state = allocated("4821");
        let rider = rider::find("r2").unwrap();
        let result = state.allocate(Some(&auth()), rider, trip(), "1111".to_string(), 1);
        assert_eq!(result, Err(RideError::AlreadyActive));
    }

    #[test]
    fn test_matching_otp_starts_ride() {
        let state = allocated("4821").verify_otp("4821").unwrap();
        assert_eq!(state.name(), "ongoing");
        assert_eq!(state.ride().unwrap().status, RideStatus::Ongoing);
    }

    #[test]
    fn test_wrong_otp_keeps_allocated() {
        let state = allocated("4821");
        assert_eq!(state.verify_otp("0000"), Err(RideError::IncorrectOtp));
        // exact-length compare, no trimming or prefix match
        assert_eq!(state.verify_otp("4821 "), Err(RideError::IncorrectOtp));
        assert_eq!(state.verify_otp("482"), Err(RideError::IncorrectOtp));
        assert_eq!(state.name(), "allocated");
    }

    #[test]
    fn test_cancel_from_any_active_state() {
        assert_eq!(allocated("4821").cancel(), Ok(RideState::Idle));
        let ongoing = allocated("4821").verify_otp("4821").unwrap();
        assert_eq!(ongoing.cancel(), Ok(RideState::Idle));
        assert_eq!(RideState::Idle.cancel(), Err(RideError::NoActiveRide));
    }

    #[test]
    fn test_complete_only_when_ongoing() {
        let ongoing = allocated("4821").verify_otp("4821").unwrap();
        assert_eq!(ongoing.complete(), Ok(RideState::Idle));
        assert!(matches!(
            allocated("4821").complete(),
            Err(RideError::InvalidTransition { .. })
        ));
        assert_eq!(RideState::Idle.complete(), Err(RideError::NoActiveRide));
    }

    #[test]
    fn test_completed_record_loads_as_idle() {
        let mut ride = allocated("4821").into_ride().unwrap();
        ride.status = RideStatus::Completed;
        assert_eq!(RideState::from_stored(Some(ride)), RideState::Idle);
        assert_eq!(RideState::from_stored(None), RideState::Idle);
    }

    #[test]
    fn test_ride_round_trip() {
        let ride = allocated("4821").into_ride().unwrap();
        let raw = serde_json::to_string(&ride).unwrap();
        assert!(raw.contains(r#""createdAt":1700000000000"#));
        assert!(raw.contains(r#""status":"allocated""#));

        let back: Ride = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, ride);
    }
}
