use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use super::LocalStore;
use crate::entities::auth::AuthRecord;
use crate::entities::offer::RideOffer;
use crate::entities::registration::Registration;
use crate::entities::ride::RideState;
use crate::error::AppResult;

pub mod keys {
    pub const AUTH: &str = "ridelink:auth";
    pub const REGISTRATION: &str = "ridelink:registration";
    pub const CURRENT_RIDE: &str = "ridelink:currentRide";
    pub const RIDES: &str = "ridelink:rides";
}

/// Typed view over the store. Every component reads and writes session
/// state through this one object.
#[derive(Clone)]
pub struct Session {
    store: LocalStore,
    ride_lock: Arc<Mutex<()>>,
    login_lock: Arc<Mutex<()>>,
    offers_lock: Arc<Mutex<()>>,
}

impl Session {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            ride_lock: Arc::new(Mutex::new(())),
            login_lock: Arc::new(Mutex::new(())),
            offers_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Unparseable values read as absent
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get_item(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable stored value");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: Option<&T>) -> AppResult<()> {
        match value {
            Some(v) => self.store.set_item(key, serde_json::to_string(v)?).await,
            None => self.store.remove_item(key).await,
        }
    }

    pub async fn auth(&self) -> Option<AuthRecord> {
        self.read(keys::AUTH).await
    }

    pub async fn set_auth(&self, auth: Option<&AuthRecord>) -> AppResult<()> {
        self.write(keys::AUTH, auth).await
    }

    pub async fn registration(&self) -> Option<Registration> {
        self.read(keys::REGISTRATION).await
    }

    pub async fn set_registration(&self, draft: Option<&Registration>) -> AppResult<()> {
        self.write(keys::REGISTRATION, draft).await
    }

    pub async fn ride_state(&self) -> RideState {
        RideState::from_stored(self.read(keys::CURRENT_RIDE).await)
    }

    pub async fn set_ride_state(&self, state: &RideState) -> AppResult<()> {
        self.write(keys::CURRENT_RIDE, state.ride()).await
    }

    /// Held across read-transition-write of the current ride
    pub async fn lock_rides(&self) -> MutexGuard<'_, ()> {
        self.ride_lock.lock().await
    }

    /// Held across read-transition-write of the registration draft
    pub async fn lock_login(&self) -> MutexGuard<'_, ()> {
        self.login_lock.lock().await
    }

    /// Posted offers, newest first
    pub async fn offers(&self) -> Vec<RideOffer> {
        self.read(keys::RIDES).await.unwrap_or_default()
    }

    pub async fn post_offer(&self, offer: RideOffer) -> AppResult<()> {
        let _guard = self.offers_lock.lock().await;
        let mut offers = self.offers().await;
        offers.insert(0, offer);
        self.write(keys::RIDES, Some(&offers)).await
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.set_auth(None).await?;
        self.write::<()>(keys::CURRENT_RIDE, None).await
    }

    /// Sign out and drop any half-finished registration
    pub async fn clear_account(&self) -> AppResult<()> {
        self.sign_out().await?;
        self.set_registration(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::auth::Role;
    use crate::entities::offer::Vehicle;
    use crate::entities::rider;
    use crate::entities::ride::TripRequest;
    use uuid::Uuid;

    fn session() -> Session {
        Session::new(LocalStore::in_memory())
    }

    fn auth() -> AuthRecord {
        AuthRecord {
            role: Role::Passenger,
            name: "Dev".to_string(),
            phone: "9123456780".to_string(),
            email: "dev@gmail.com".to_string(),
            docs: None,
        }
    }

    fn offer(from: &str) -> RideOffer {
        RideOffer {
            id: Uuid::new_v4(),
            from: from.to_string(),
            to: "Airport".to_string(),
            time: "2026-10-17T09:00".to_string(),
            seats: 2,
            vehicle: Vehicle::Car,
            distance_km: 12.0,
            price_per_seat: 39,
            detour_km: 2.0,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_auth_round_trip() {
        let session = session();
        assert!(session.auth().await.is_none());

        session.set_auth(Some(&auth())).await.unwrap();
        assert_eq!(session.auth().await, Some(auth()));
    }

    #[tokio::test]
    async fn test_corrupt_values_read_as_absent() {
        let session = session();
        for key in [keys::AUTH, keys::CURRENT_RIDE, keys::RIDES] {
            session.store().set_item(key, "{oops".to_string()).await.unwrap();
        }

        assert!(session.auth().await.is_none());
        assert_eq!(session.ride_state().await, RideState::Idle);
        assert!(session.offers().await.is_empty());
    }

    #[tokio::test]
    async fn test_ride_state_persists_and_clears() {
        let session = session();
        let allocated = RideState::Idle
            .allocate(
                Some(&auth()),
                rider::find("r2").unwrap(),
                TripRequest { from: "A".to_string(), to: "B".to_string(), seats: 2 },
                "4821".to_string(),
                42,
            )
            .unwrap();

        session.set_ride_state(&allocated).await.unwrap();
        assert_eq!(session.ride_state().await, allocated);

        session.set_ride_state(&RideState::Idle).await.unwrap();
        assert_eq!(session.store().get_item(keys::CURRENT_RIDE).await, None);
    }

    #[tokio::test]
    async fn test_offers_newest_first() {
        let session = session();
        session.post_offer(offer("First")).await.unwrap();
        session.post_offer(offer("Second")).await.unwrap();

        let froms: Vec<_> = session.offers().await.into_iter().map(|o| o.from).collect();
        assert_eq!(froms, vec!["Second", "First"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_posts_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("store.json")).await.unwrap();
        let session = Session::new(store);

        let posts: Vec<_> = (0..20)
            .map(|i| {
                let session = session.clone();
                tokio::spawn(async move { session.post_offer(offer(&format!("Stop {}", i))).await })
            })
            .collect();
        for post in posts {
            post.await.unwrap().unwrap();
        }

        assert_eq!(session.offers().await.len(), 20);
        let reopened = LocalStore::open(dir.path().join("store.json")).await.unwrap();
        assert_eq!(Session::new(reopened).offers().await.len(), 20);
    }

    #[tokio::test]
    async fn test_sign_out_keeps_offers() {
        let session = session();
        session.set_auth(Some(&auth())).await.unwrap();
        session.store().set_item(keys::CURRENT_RIDE, "{}".to_string()).await.unwrap();
        session.post_offer(offer("Kept")).await.unwrap();

        session.sign_out().await.unwrap();

        assert!(session.auth().await.is_none());
        assert_eq!(session.store().get_item(keys::CURRENT_RIDE).await, None);
        assert_eq!(session.offers().await.len(), 1);
    }
}
