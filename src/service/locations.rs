//! Location tracking: validated coordinate updates and friend visibility

use std::sync::Arc;

use uuid::Uuid;

use crate::service::{ServiceError, ServiceResult};
use crate::store::{LocationRecord, LocationWrite, Store};

/// A coordinate update as received from a device
#[derive(Clone, Debug)]
pub struct LocationUpdate {
    /// Latitude in degrees, must be in [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, must be in [-180, 180]
    pub longitude: f64,
    /// Altitude in meters, if the device reported one
    pub altitude: Option<f64>,
    /// Reported accuracy in meters
    pub accuracy: Option<f64>,
    /// An explicit visibility change to apply with this update
    pub visible_to_friends: Option<bool>,
}

/// Maintains the single current location per user and answers
/// friend-location queries under the visibility flag.
pub struct LocationTracker<S> {
    store: Arc<S>,
}

impl<S: Store> LocationTracker<S> {
    /// Create the tracker on top of a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Write the user's current position.
    ///
    /// Creates the location on first update, visibility defaults to `true`
    /// unless the update says otherwise. Later updates rewrite the existing
    /// record and keep its visibility unless an explicit change is included.
    /// Out-of-range coordinates are rejected, never clamped.
    pub async fn update(&self, user: Uuid, update: LocationUpdate) -> ServiceResult<LocationRecord> {
        if !(-90.0..=90.0).contains(&update.latitude)
            || !(-180.0..=180.0).contains(&update.longitude)
        {
            return Err(ServiceError::InvalidCoordinate);
        }

        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        let existing = self.store.latest_location(user).await?;
        let visible_to_friends = update
            .visible_to_friends
            .or(existing.map(|location| location.visible_to_friends))
            .unwrap_or(true);

        Ok(self
            .store
            .upsert_location(LocationWrite {
                user,
                latitude: update.latitude,
                longitude: update.longitude,
                altitude: update.altitude,
                accuracy: update.accuracy,
                visible_to_friends,
            })
            .await?)
    }

    /// Toggle whether the user's location is visible to friends.
    ///
    /// Requires the user to have stored a location before, which is a
    /// different failure than the user not existing at all.
    pub async fn set_visibility(&self, user: Uuid, visible: bool) -> ServiceResult<LocationRecord> {
        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        self.store
            .set_location_visibility(user, visible)
            .await?
            .ok_or(ServiceError::NoLocationData)
    }

    /// Retrieve the locations of the user's friends that are visible.
    ///
    /// Hidden locations are left out silently.
    pub async fn friends_locations(&self, user: Uuid) -> ServiceResult<Vec<LocationRecord>> {
        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        let friends: Vec<Uuid> = self
            .store
            .friends_of(user)
            .await?
            .into_iter()
            .map(|friend| friend.uuid)
            .collect();

        Ok(self.store.visible_locations_of(&friends).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::service::{LocationTracker, LocationUpdate, ServiceError};
    use crate::store::memory::MemStore;

    fn update(latitude: f64, longitude: f64) -> LocationUpdate {
        LocationUpdate {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            visible_to_friends: None,
        }
    }

    #[tokio::test]
    async fn first_update_defaults_to_visible() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let tracker = LocationTracker::new(store);

        let location = tracker.update(a, update(48.1, 11.5)).await.unwrap();

        assert!(location.visible_to_friends);
        assert_eq!(location.latitude, 48.1);
    }

    #[tokio::test]
    async fn updates_keep_visibility_unless_changed() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let tracker = LocationTracker::new(store);

        tracker.update(a, update(48.1, 11.5)).await.unwrap();
        tracker.set_visibility(a, false).await.unwrap();

        let location = tracker.update(a, update(48.2, 11.6)).await.unwrap();
        assert!(!location.visible_to_friends);

        let location = tracker
            .update(
                a,
                LocationUpdate {
                    visible_to_friends: Some(true),
                    ..update(48.3, 11.7)
                },
            )
            .await
            .unwrap();
        assert!(location.visible_to_friends);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let tracker = LocationTracker::new(store);

        assert!(matches!(
            tracker.update(a, update(91.0, 0.0)).await,
            Err(ServiceError::InvalidCoordinate)
        ));
        assert!(matches!(
            tracker.update(a, update(0.0, -180.5)).await,
            Err(ServiceError::InvalidCoordinate)
        ));

        // Boundary values are valid
        tracker.update(a, update(90.0, 180.0)).await.unwrap();
        tracker.update(a, update(-90.0, -180.0)).await.unwrap();
    }

    #[tokio::test]
    async fn visibility_without_location_is_a_distinct_error() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let tracker = LocationTracker::new(store);

        assert!(matches!(
            tracker.set_visibility(a, false).await,
            Err(ServiceError::NoLocationData)
        ));
        assert!(matches!(
            tracker.set_visibility(uuid::Uuid::new_v4(), false).await,
            Err(ServiceError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn hidden_friends_are_excluded_until_visible_again() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        store.link(a, b);
        let tracker = LocationTracker::new(store);

        tracker.update(b, update(48.1, 11.5)).await.unwrap();
        assert_eq!(tracker.friends_locations(a).await.unwrap().len(), 1);

        tracker.set_visibility(b, false).await.unwrap();
        assert!(tracker.friends_locations(a).await.unwrap().is_empty());

        // Toggling back does not require a coordinate update
        tracker.set_visibility(b, true).await.unwrap();
        let locations = tracker.friends_locations(a).await.unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].user, b);
    }

    #[tokio::test]
    async fn non_friends_are_never_listed() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let tracker = LocationTracker::new(store);

        tracker.update(b, update(48.1, 11.5)).await.unwrap();

        assert!(tracker.friends_locations(a).await.unwrap().is_empty());
    }
}
