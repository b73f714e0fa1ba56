use rorm::fields::types::ForeignModel;
use rorm::{DbEnum, Model, Patch};
use uuid::Uuid;

use crate::models::User;

/// The lifecycle states of a friend request.
///
/// `Pending` may transition to `Accepted` or `Rejected`, both of which are
/// terminal.
#[derive(DbEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RequestStatus {
    /// The request was sent and has not been answered yet
    Pending,
    /// The recipient accepted the request, a friendship was created
    Accepted,
    /// The recipient rejected the request
    Rejected,
}

/// A friend request between two users.
///
/// At most one row may exist per unordered pair of users, regardless of
/// direction and status. The unique constraint on `pair_key` enforces this at
/// the database even when two requests race past the application check.
#[derive(Model)]
pub struct FriendRequest {
    /// The primary key of a friend request
    #[rorm(primary_key)]
    pub uuid: Uuid,

    /// The user who sent the request
    #[rorm(on_delete = "Cascade", on_update = "Cascade")]
    pub requester: ForeignModel<User>,

    /// The user the request was sent to
    #[rorm(on_delete = "Cascade", on_update = "Cascade")]
    pub requested: ForeignModel<User>,

    /// The current state of this request
    pub status: RequestStatus,

    /// Canonical key of the unordered user pair, see
    /// [UserPair](crate::models::UserPair)
    #[rorm(max_length = 73, unique)]
    pub pair_key: String,

    /// The point in time the request was sent
    #[rorm(auto_create_time)]
    pub created_at: chrono::NaiveDateTime,

    /// The last time the status changed
    #[rorm(auto_create_time, auto_update_time)]
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Patch)]
#[rorm(model = "FriendRequest")]
pub(crate) struct FriendRequestInsert {
    pub(crate) uuid: Uuid,
    pub(crate) requester: ForeignModel<User>,
    pub(crate) requested: ForeignModel<User>,
    pub(crate) status: RequestStatus,
    pub(crate) pair_key: String,
}

/// A confirmed friendship between two users.
///
/// The relation is undirected. The pair is stored in canonical order with the
/// smaller uuid first, so a single row represents the edge in both directions
/// and the unique `pair_key` deduplicates it at the storage layer.
#[derive(Model)]
pub struct Friendship {
    /// The primary key of a friendship
    #[rorm(primary_key)]
    pub uuid: Uuid,

    /// The user of the pair with the smaller uuid
    #[rorm(on_delete = "Cascade", on_update = "Cascade")]
    pub user_low: ForeignModel<User>,

    /// The user of the pair with the larger uuid
    #[rorm(on_delete = "Cascade", on_update = "Cascade")]
    pub user_high: ForeignModel<User>,

    /// Canonical key of the unordered user pair
    #[rorm(max_length = 73, unique)]
    pub pair_key: String,

    /// The point in time the request was accepted
    #[rorm(auto_create_time)]
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Patch)]
#[rorm(model = "Friendship")]
pub(crate) struct FriendshipInsert {
    pub(crate) uuid: Uuid,
    pub(crate) user_low: ForeignModel<User>,
    pub(crate) user_high: ForeignModel<User>,
    pub(crate) pair_key: String,
}
