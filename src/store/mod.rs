//! The storage contract the core operates against.
//!
//! The services in [crate::service] never talk to the database directly. They
//! go through the traits in here, which are implemented by [DbStore] on top of
//! rorm and by an in-memory store for tests.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::models::{RequestStatus, UserPair};

pub use database::DbStore;

mod database;
#[cfg(test)]
pub(crate) mod memory;

/// Errors produced by the storage layer
#[derive(Debug)]
pub enum StoreError {
    /// All errors that are thrown by the database
    Database(rorm::Error),
    /// The storage backend could not be reached or answered out of contract
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {err}"),
            StoreError::Unavailable(msg) => write!(f, "Storage unavailable: {msg}"),
        }
    }
}

impl From<rorm::Error> for StoreError {
    fn from(value: rorm::Error) -> Self {
        Self::Database(value)
    }
}

/// The public profile of a user as the core hands it around
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserProfile {
    /// The primary key of the user
    pub uuid: Uuid,
    /// The username of the user
    pub username: String,
    /// The email address of the user
    pub email: String,
    /// The first name of the user
    pub first_name: String,
    /// The last name of the user
    pub last_name: String,
}

/// A friend request as the core hands it around
#[derive(Clone, Debug, PartialEq)]
pub struct FriendRequestRecord {
    /// The primary key of the request
    pub uuid: Uuid,
    /// The user who sent the request
    pub requester: Uuid,
    /// The user the request was sent to
    pub requested: Uuid,
    /// The current state of the request
    pub status: RequestStatus,
    /// The point in time the request was sent
    pub created_at: NaiveDateTime,
    /// The last time the status changed
    pub updated_at: NaiveDateTime,
}

/// The current location of a user as the core hands it around
#[derive(Clone, Debug, PartialEq)]
pub struct LocationRecord {
    /// The primary key of the location
    pub uuid: Uuid,
    /// The user this location belongs to
    pub user: Uuid,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters, if reported
    pub altitude: Option<f64>,
    /// Reported accuracy in meters
    pub accuracy: Option<f64>,
    /// Whether friends may see this location
    pub visible_to_friends: bool,
    /// The last time coordinates or visibility changed
    pub updated_at: NaiveDateTime,
}

/// The coordinate and visibility state written by a location update
#[derive(Clone, Debug)]
pub struct LocationWrite {
    /// The user the location belongs to
    pub user: Uuid,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters, if reported
    pub altitude: Option<f64>,
    /// Reported accuracy in meters
    pub accuracy: Option<f64>,
    /// The visibility the row should have after the write
    pub visible_to_friends: bool,
}

/// Access to user records and their metadata mapping
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check whether a user with the given id exists
    async fn user_exists(&self, user: Uuid) -> Result<bool, StoreError>;

    /// Look up a single user
    async fn user_by_id(&self, user: Uuid) -> Result<Option<UserProfile>, StoreError>;

    /// Retrieve all registered users
    async fn all_users(&self) -> Result<Vec<UserProfile>, StoreError>;

    /// Retrieve the metadata mapping of a user
    async fn metadata_of(&self, user: Uuid) -> Result<HashMap<String, String>, StoreError>;

    /// Merge the given entries into the user's metadata mapping.
    ///
    /// Existing keys are overwritten, last writer wins.
    async fn merge_metadata(
        &self,
        user: Uuid,
        entries: HashMap<String, String>,
    ) -> Result<(), StoreError>;
}

/// Access to friend request rows.
///
/// All lookups are keyed by the canonical [UserPair], so they are
/// direction-independent.
#[async_trait]
pub trait FriendRequestStore: Send + Sync {
    /// Find the request between the pair, whatever its direction and status
    async fn request_between(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError>;

    /// Check whether any request row exists between the pair
    async fn request_exists_between(&self, pair: &UserPair) -> Result<bool, StoreError>;

    /// Insert a new pending request.
    ///
    /// The storage layer's unique pair constraint is the authoritative
    /// duplicate guard, the caller's existence check is only an optimization.
    async fn create_request(
        &self,
        requester: Uuid,
        requested: Uuid,
    ) -> Result<FriendRequestRecord, StoreError>;

    /// Transition the pair's request to accepted and insert the friendship
    /// edge in a single transaction.
    ///
    /// Returns [None] if no pending request exists between the pair. The
    /// pending check runs inside the transaction, so a request answered by a
    /// concurrent call is never transitioned a second time. A crash can never
    /// leave an accepted request without its friendship.
    async fn accept_and_link(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError>;

    /// Transition the pair's request to rejected.
    ///
    /// Returns [None] if no pending request exists between the pair, with the
    /// same in-transaction pending check as
    /// [accept_and_link](Self::accept_and_link).
    async fn mark_rejected(
        &self,
        pair: &UserPair,
    ) -> Result<Option<FriendRequestRecord>, StoreError>;
}

/// Access to the friendship edge set
#[async_trait]
pub trait FriendshipStore: Send + Sync {
    /// Check whether a friendship edge exists between the pair
    async fn friendship_exists_between(&self, pair: &UserPair) -> Result<bool, StoreError>;

    /// Retrieve all users sharing a friendship edge with the given user
    async fn friends_of(&self, user: Uuid) -> Result<Vec<UserProfile>, StoreError>;

    /// Retrieve the users befriended with both members of the pair
    async fn mutual_friends(&self, pair: &UserPair) -> Result<Vec<UserProfile>, StoreError>;

    /// Delete the friendship edge and the answered request row between the
    /// pair in a single transaction.
    ///
    /// Returns whether an edge existed. Without an edge nothing is deleted,
    /// a pending request between the pair stays untouched.
    async fn delete_friendship_and_request(&self, pair: &UserPair) -> Result<bool, StoreError>;
}

/// Access to the per-user current location rows
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Retrieve the current location of a user
    async fn latest_location(&self, user: Uuid) -> Result<Option<LocationRecord>, StoreError>;

    /// Write the user's current location.
    ///
    /// Updates the existing row in place or creates the first one.
    async fn upsert_location(&self, write: LocationWrite) -> Result<LocationRecord, StoreError>;

    /// Change the visibility flag of the user's current location.
    ///
    /// Returns [None] if the user has no stored location.
    async fn set_location_visibility(
        &self,
        user: Uuid,
        visible: bool,
    ) -> Result<Option<LocationRecord>, StoreError>;

    /// Retrieve the locations of the given users that are visible to friends.
    ///
    /// Users without a location or with a hidden one are left out silently.
    async fn visible_locations_of(&self, users: &[Uuid]) -> Result<Vec<LocationRecord>, StoreError>;
}

/// Everything the core needs from storage, in one bound
pub trait Store: UserStore + FriendRequestStore + FriendshipStore + LocationStore {}

impl<T: UserStore + FriendRequestStore + FriendshipStore + LocationStore> Store for T {}
