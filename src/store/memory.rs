//! An in-memory implementation of the storage contract for service tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{RequestStatus, UserPair};
use crate::store::{
    FriendRequestRecord, FriendRequestStore, FriendshipStore, LocationRecord, LocationStore,
    LocationWrite, StoreError, UserProfile, UserStore,
};

#[derive(Default)]
struct MemInner {
    users: HashMap<Uuid, UserProfile>,
    meta: HashMap<Uuid, HashMap<String, String>>,
    requests: HashMap<String, FriendRequestRecord>,
    friendships: HashMap<String, (Uuid, Uuid)>,
    locations: HashMap<Uuid, LocationRecord>,
}

/// In-memory store used by the service tests.
///
/// `fail_mutual_friends` makes [FriendshipStore::mutual_friends] fail, to
/// exercise the degraded discovery path.
#[derive(Default)]
pub(crate) struct MemStore {
    inner: Mutex<MemInner>,
    pub(crate) fail_mutual_friends: Mutex<bool>,
}

impl MemStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a user and return its id
    pub(crate) fn add_user(&self, username: &str) -> Uuid {
        let uuid = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(
            uuid,
            UserProfile {
                uuid,
                username: username.to_string(),
                email: format!("{username}@example.com"),
                first_name: username.to_string(),
                last_name: "Tester".to_string(),
            },
        );
        uuid
    }

    pub(crate) fn set_meta(&self, user: Uuid, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .meta
            .entry(user)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// Insert a friendship edge directly, bypassing the request workflow
    pub(crate) fn link(&self, a: Uuid, b: Uuid) {
        let pair = UserPair::new(a, b).unwrap();
        let mut inner = self.inner.lock().unwrap();
        inner
            .friendships
            .insert(pair.key(), (pair.low(), pair.high()));
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn user_exists(&self, user: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().users.contains_key(&user))
    }

    async fn user_by_id(&self, user: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.inner.lock().unwrap().users.get(&user).cloned())
    }

    async fn all_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self.inner.lock().unwrap().users.values().cloned().collect())
    }

    async fn metadata_of(&self, user: Uuid) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .meta
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn merge_metadata(
        &self,
        user: Uuid,
        entries: HashMap<String, String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.meta.entry(user).or_default().extend(entries);
        Ok(())
    }
}

#[async_trait]
impl FriendRequestStore for MemStore {
    async fn request_between(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().requests.get(&pair.key()).cloned())
    }

    async fn request_exists_between(&self, pair: &UserPair) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().requests.contains_key(&pair.key()))
    }

    async fn create_request(
        &self,
        requester: Uuid,
        requested: Uuid,
    ) -> Result<FriendRequestRecord, StoreError> {
        let pair = UserPair::new(requester, requested).ok_or_else(|| {
            StoreError::Unavailable("refusing to create a self request".to_string())
        })?;

        let mut inner = self.inner.lock().unwrap();
        if inner.requests.contains_key(&pair.key()) {
            // The database's unique constraint, emulated
            return Err(StoreError::Unavailable(
                "unique constraint violated".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let record = FriendRequestRecord {
            uuid: Uuid::new_v4(),
            requester,
            requested,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.requests.insert(pair.key(), record.clone());

        Ok(record)
    }

    async fn accept_and_link(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let Some(record) = inner.requests.get_mut(&pair.key()) else {
            return Ok(None);
        };
        if record.status != RequestStatus::Pending {
            return Ok(None);
        }
        record.status = RequestStatus::Accepted;
        record.updated_at = Utc::now().naive_utc();
        let record = record.clone();

        inner
            .friendships
            .insert(pair.key(), (pair.low(), pair.high()));

        Ok(Some(record))
    }

    async fn mark_rejected(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let Some(record) = inner.requests.get_mut(&pair.key()) else {
            return Ok(None);
        };
        if record.status != RequestStatus::Pending {
            return Ok(None);
        }
        record.status = RequestStatus::Rejected;
        record.updated_at = Utc::now().naive_utc();

        Ok(Some(record.clone()))
    }
}

#[async_trait]
impl FriendshipStore for MemStore {
    async fn friendship_exists_between(&self, pair: &UserPair) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .friendships
            .contains_key(&pair.key()))
    }

    async fn friends_of(&self, user: Uuid) -> Result<Vec<UserProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();

        let friends = inner
            .friendships
            .values()
            .filter_map(|&(low, high)| {
                if low == user {
                    Some(high)
                } else if high == user {
                    Some(low)
                } else {
                    None
                }
            })
            .filter_map(|other| inner.users.get(&other).cloned())
            .collect();

        Ok(friends)
    }

    async fn mutual_friends(&self, pair: &UserPair) -> Result<Vec<UserProfile>, StoreError> {
        if *self.fail_mutual_friends.lock().unwrap() {
            return Err(StoreError::Unavailable(
                "mutual friend computation failed".to_string(),
            ));
        }

        let of_low = self.friends_of(pair.low()).await?;
        let of_high: Vec<Uuid> = self
            .friends_of(pair.high())
            .await?
            .into_iter()
            .map(|friend| friend.uuid)
            .collect();

        Ok(of_low
            .into_iter()
            .filter(|friend| of_high.contains(&friend.uuid))
            .collect())
    }

    async fn delete_friendship_and_request(&self, pair: &UserPair) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.friendships.remove(&pair.key()).is_none() {
            return Ok(false);
        }
        inner.requests.remove(&pair.key());

        Ok(true)
    }
}

#[async_trait]
impl LocationStore for MemStore {
    async fn latest_location(&self, user: Uuid) -> Result<Option<LocationRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().locations.get(&user).cloned())
    }

    async fn upsert_location(&self, write: LocationWrite) -> Result<LocationRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let uuid = inner
            .locations
            .get(&write.user)
            .map(|existing| existing.uuid)
            .unwrap_or_else(Uuid::new_v4);

        let record = LocationRecord {
            uuid,
            user: write.user,
            latitude: write.latitude,
            longitude: write.longitude,
            altitude: write.altitude,
            accuracy: write.accuracy,
            visible_to_friends: write.visible_to_friends,
            updated_at: Utc::now().naive_utc(),
        };
        inner.locations.insert(write.user, record.clone());

        Ok(record)
    }

    async fn set_location_visibility(
        &self,
        user: Uuid,
        visible: bool,
    ) -> Result<Option<LocationRecord>, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let Some(record) = inner.locations.get_mut(&user) else {
            return Ok(None);
        };
        record.visible_to_friends = visible;
        record.updated_at = Utc::now().naive_utc();

        Ok(Some(record.clone()))
    }

    async fn visible_locations_of(&self, users: &[Uuid]) -> Result<Vec<LocationRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();

        Ok(users
            .iter()
            .filter_map(|user| inner.locations.get(user))
            .filter(|location| location.visible_to_friends)
            .cloned()
            .collect())
    }
}
