//! The rorm backed implementation of the storage contract

use std::collections::HashMap;

use async_trait::async_trait;
use rorm::fields::types::ForeignModelByField;
use rorm::{and, insert, or, query, update, Database, FieldAccess, Model};
use uuid::Uuid;

use crate::models::{
    FriendRequest, FriendRequestInsert, Friendship, FriendshipInsert, RequestStatus, User,
    UserLocation, UserLocationInsert, UserMetaEntry, UserMetaEntryInsert, UserPair,
};
use crate::store::{
    FriendRequestRecord, FriendRequestStore, FriendshipStore, LocationRecord, LocationStore,
    LocationWrite, StoreError, UserProfile, UserStore,
};

/// The production store, backed by the postgres database
#[derive(Clone)]
pub struct DbStore {
    db: Database,
}

impl DbStore {
    /// Wrap a connected [Database]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn to_profile(user: User) -> UserProfile {
    UserProfile {
        uuid: user.uuid,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }
}

fn to_request_record(request: FriendRequest) -> FriendRequestRecord {
    FriendRequestRecord {
        uuid: request.uuid,
        requester: *request.requester.key(),
        requested: *request.requested.key(),
        status: request.status,
        created_at: request.created_at,
        updated_at: request.updated_at,
    }
}

fn to_location_record(location: UserLocation) -> LocationRecord {
    LocationRecord {
        uuid: location.uuid,
        user: *location.user.key(),
        latitude: location.latitude,
        longitude: location.longitude,
        altitude: location.altitude,
        accuracy: location.accuracy,
        visible_to_friends: location.visible_to_friends,
        updated_at: location.updated_at,
    }
}

#[async_trait]
impl UserStore for DbStore {
    async fn user_exists(&self, user: Uuid) -> Result<bool, StoreError> {
        Ok(query!(&self.db, (User::F.uuid,))
            .condition(User::F.uuid.equals(user))
            .optional()
            .await?
            .is_some())
    }

    async fn user_by_id(&self, user: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(query!(&self.db, User)
            .condition(User::F.uuid.equals(user))
            .optional()
            .await?
            .map(to_profile))
    }

    async fn all_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(query!(&self.db, User)
            .all()
            .await?
            .into_iter()
            .map(to_profile)
            .collect())
    }

    async fn metadata_of(&self, user: Uuid) -> Result<HashMap<String, String>, StoreError> {
        let entries = query!(&self.db, UserMetaEntry)
            .condition(UserMetaEntry::F.user.equals(user.as_ref()))
            .all()
            .await?;

        Ok(entries.into_iter().map(|e| (e.key, e.value)).collect())
    }

    async fn merge_metadata(
        &self,
        user: Uuid,
        entries: HashMap<String, String>,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.start_transaction().await?;

        for (key, value) in entries {
            let updated = update!(&mut tx, UserMetaEntry)
                .condition(and!(
                    UserMetaEntry::F.user.equals(user.as_ref()),
                    UserMetaEntry::F.key.equals(&key)
                ))
                .set(UserMetaEntry::F.value, value.clone())
                .exec()
                .await?;

            if updated == 0 {
                insert!(&mut tx, UserMetaEntryInsert)
                    .single(&UserMetaEntryInsert {
                        user: ForeignModelByField::Key(user),
                        key,
                        value,
                    })
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl FriendRequestStore for DbStore {
    async fn request_between(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError> {
        Ok(query!(&self.db, FriendRequest)
            .condition(FriendRequest::F.pair_key.equals(&pair.key()))
            .optional()
            .await?
            .map(to_request_record))
    }

    async fn request_exists_between(&self, pair: &UserPair) -> Result<bool, StoreError> {
        Ok(query!(&self.db, (FriendRequest::F.uuid,))
            .condition(FriendRequest::F.pair_key.equals(&pair.key()))
            .optional()
            .await?
            .is_some())
    }

    async fn create_request(
        &self,
        requester: Uuid,
        requested: Uuid,
    ) -> Result<FriendRequestRecord, StoreError> {
        let pair = UserPair::new(requester, requested).ok_or_else(|| {
            StoreError::Unavailable("refusing to create a self request".to_string())
        })?;

        let mut tx = self.db.start_transaction().await?;

        let uuid = Uuid::new_v4();
        insert!(&mut tx, FriendRequestInsert)
            .single(&FriendRequestInsert {
                uuid,
                requester: ForeignModelByField::Key(requester),
                requested: ForeignModelByField::Key(requested),
                status: RequestStatus::Pending,
                pair_key: pair.key(),
            })
            .await?;

        let request = query!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.uuid.equals(uuid))
            .one()
            .await?;

        tx.commit().await?;

        Ok(to_request_record(request))
    }

    async fn accept_and_link(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError> {
        let mut tx = self.db.start_transaction().await?;

        let Some(request) = query!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.pair_key.equals(&pair.key()))
            .optional()
            .await?
        else {
            return Ok(None);
        };

        // Accepted and Rejected are terminal, a concurrently answered
        // request must not be transitioned again
        if request.status != RequestStatus::Pending {
            return Ok(None);
        }

        update!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.uuid.equals(request.uuid))
            .set(FriendRequest::F.status, RequestStatus::Accepted)
            .exec()
            .await?;

        insert!(&mut tx, FriendshipInsert)
            .single(&FriendshipInsert {
                uuid: Uuid::new_v4(),
                user_low: ForeignModelByField::Key(pair.low()),
                user_high: ForeignModelByField::Key(pair.high()),
                pair_key: pair.key(),
            })
            .await?;

        let request = query!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.uuid.equals(request.uuid))
            .one()
            .await?;

        tx.commit().await?;

        Ok(Some(to_request_record(request)))
    }

    async fn mark_rejected(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError> {
        let mut tx = self.db.start_transaction().await?;

        let Some(request) = query!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.pair_key.equals(&pair.key()))
            .optional()
            .await?
        else {
            return Ok(None);
        };

        if request.status != RequestStatus::Pending {
            return Ok(None);
        }

        update!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.uuid.equals(request.uuid))
            .set(FriendRequest::F.status, RequestStatus::Rejected)
            .exec()
            .await?;

        let request = query!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.uuid.equals(request.uuid))
            .one()
            .await?;

        tx.commit().await?;

        Ok(Some(to_request_record(request)))
    }

}

#[async_trait]
impl FriendshipStore for DbStore {
    async fn friendship_exists_between(&self, pair: &UserPair) -> Result<bool, StoreError> {
        Ok(query!(&self.db, (Friendship::F.uuid,))
            .condition(Friendship::F.pair_key.equals(&pair.key()))
            .optional()
            .await?
            .is_some())
    }

    async fn friends_of(&self, user: Uuid) -> Result<Vec<UserProfile>, StoreError> {
        let edges = query!(&self.db, Friendship)
            .condition(or!(
                Friendship::F.user_low.equals(user.as_ref()),
                Friendship::F.user_high.equals(user.as_ref())
            ))
            .all()
            .await?;

        let mut friends = Vec::with_capacity(edges.len());
        for edge in edges {
            let other = if *edge.user_low.key() == user {
                *edge.user_high.key()
            } else {
                *edge.user_low.key()
            };

            let friend = query!(&self.db, User)
                .condition(User::F.uuid.equals(other))
                .one()
                .await?;
            friends.push(to_profile(friend));
        }

        Ok(friends)
    }

    async fn mutual_friends(&self, pair: &UserPair) -> Result<Vec<UserProfile>, StoreError> {
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
        let mut tx = self.db.start_transaction().await?;

        let deleted = rorm::delete!(&mut tx, Friendship)
            .condition(Friendship::F.pair_key.equals(&pair.key()))
            .await?;

        if deleted == 0 {
            return Ok(false);
        }

        rorm::delete!(&mut tx, FriendRequest)
            .condition(FriendRequest::F.pair_key.equals(&pair.key()))
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}

#[async_trait]
impl LocationStore for DbStore {
    async fn latest_location(&self, user: Uuid) -> Result<Option<LocationRecord>, StoreError> {
        Ok(query!(&self.db, UserLocation)
            .condition(UserLocation::F.user.equals(user.as_ref()))
            .optional()
            .await?
            .map(to_location_record))
    }

    async fn upsert_location(&self, write: LocationWrite) -> Result<LocationRecord, StoreError> {
        let mut tx = self.db.start_transaction().await?;

        let existing = query!(&mut tx, (UserLocation::F.uuid,))
            .condition(UserLocation::F.user.equals(write.user.as_ref()))
            .optional()
            .await?;

        let uuid = match existing {
            Some((uuid,)) => {
                update!(&mut tx, UserLocation)
                    .condition(UserLocation::F.uuid.equals(uuid))
                    .set(UserLocation::F.latitude, write.latitude)
                    .set(UserLocation::F.longitude, write.longitude)
                    .set(UserLocation::F.altitude, write.altitude)
                    .set(UserLocation::F.accuracy, write.accuracy)
                    .set(UserLocation::F.visible_to_friends, write.visible_to_friends)
                    .exec()
                    .await?;
                uuid
            }
            None => {
                let uuid = Uuid::new_v4();
                insert!(&mut tx, UserLocationInsert)
                    .single(&UserLocationInsert {
                        uuid,
                        user: ForeignModelByField::Key(write.user),
                        latitude: write.latitude,
                        longitude: write.longitude,
                        altitude: write.altitude,
                        accuracy: write.accuracy,
                        visible_to_friends: write.visible_to_friends,
                    })
                    .await?;
                uuid
            }
        };

        let location = query!(&mut tx, UserLocation)
            .condition(UserLocation::F.uuid.equals(uuid))
            .one()
            .await?;

        tx.commit().await?;

        Ok(to_location_record(location))
    }

    async fn set_location_visibility(
        &self,
        user: Uuid,
        visible: bool,
    ) -> Result<Option<LocationRecord>, StoreError> {
        let mut tx = self.db.start_transaction().await?;

        let Some((uuid,)) = query!(&mut tx, (UserLocation::F.uuid,))
            .condition(UserLocation::F.user.equals(user.as_ref()))
            .optional()
            .await?
        else {
            return Ok(None);
        };

        update!(&mut tx, UserLocation)
            .condition(UserLocation::F.uuid.equals(uuid))
            .set(UserLocation::F.visible_to_friends, visible)
            .exec()
            .await?;

        let location = query!(&mut tx, UserLocation)
            .condition(UserLocation::F.uuid.equals(uuid))
            .one()
            .await?;

        tx.commit().await?;

        Ok(Some(to_location_record(location)))
    }

    async fn visible_locations_of(&self, users: &[Uuid]) -> Result<Vec<LocationRecord>, StoreError> {
        let mut locations = Vec::new();

        for user in users {
            let location = query!(&self.db, UserLocation)
                .condition(and!(
                    UserLocation::F.user.equals(user.as_ref()),
                    UserLocation::F.visible_to_friends.equals(true)
                ))
                .optional()
                .await?;

            if let Some(location) = location {
                locations.push(to_location_record(location));
            }
        }

        Ok(locations)
    }
}
