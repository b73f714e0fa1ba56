//! The core of safenet: friend requests, the friendship graph, discovery,
//! location tracking and the emergency fan-out.
//!
//! Every service is generic over the storage contract in [crate::store] and
//! owns no state besides its store handle.

use std::fmt::{Display, Formatter};

use crate::store::StoreError;

pub use directory::UserDirectory;
pub use discovery::{DiscoverableUser, DiscoveryListing, DiscoveryResolver, RelationStatus};
pub use emergency::{DispatchReport, EmergencyDispatcher, PUSH_TOKEN_KEY};
pub use friend_requests::FriendRequestEngine;
pub use friendships::FriendshipGraph;
pub use locations::{LocationTracker, LocationUpdate};

mod directory;
mod discovery;
mod emergency;
mod friend_requests;
mod friendships;
mod locations;

/// The result type used throughout the core services
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Business rule violations and storage failures of the core.
///
/// Everything except [ServiceError::Store] is a synchronous rule violation
/// which is propagated to the caller unmodified and never retried.
#[derive(Debug)]
pub enum ServiceError {
    /// A referenced user does not exist
    UserNotFound,
    /// No friend request exists between the pair
    RequestNotFound,
    /// No friendship exists between the pair
    FriendshipNotFound,
    /// The user exists but has never stored a location
    NoLocationData,
    /// A friend request already exists between the pair, in either direction
    DuplicateRequest,
    /// The pair already shares a friendship
    AlreadyFriends,
    /// Both sides of the operation are the same user
    SelfRequest,
    /// The request is not pending anymore
    RequestNotPending,
    /// The acting user is not the recipient of the request
    NotRequestRecipient,
    /// Latitude or longitude is outside its valid range
    InvalidCoordinate,
    /// A required field is missing or empty
    MissingField(&'static str),
    /// The storage layer failed
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::UserNotFound => write!(f, "User not found"),
            ServiceError::RequestNotFound => write!(f, "Friend request not found"),
            ServiceError::FriendshipNotFound => write!(f, "Friendship not found"),
            ServiceError::NoLocationData => write!(f, "User has no location data"),
            ServiceError::DuplicateRequest => write!(f, "Friend request already exists"),
            ServiceError::AlreadyFriends => write!(f, "Users are already friends"),
            ServiceError::SelfRequest => write!(f, "Operation requires two distinct users"),
            ServiceError::RequestNotPending => write!(f, "Friend request is not pending"),
            ServiceError::NotRequestRecipient => {
                write!(f, "Only the recipient may answer a friend request")
            }
            ServiceError::InvalidCoordinate => write!(f, "Coordinates are out of range"),
            ServiceError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ServiceError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
