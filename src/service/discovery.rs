//! Per-user discoverability: relation status and mutual friend counts

use std::sync::Arc;

use itertools::Itertools;
use log::warn;
use uuid::Uuid;

use crate::models::{RequestStatus, UserPair};
use crate::service::ServiceResult;
use crate::store::Store;

/// The relation of a discoverable user to the current user
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RelationStatus {
    /// No friendship and no pending request
    None,
    /// The current user sent a pending request to this user
    Sent,
    /// This user sent a pending request to the current user
    Received,
    /// The users share a friendship
    Friends,
}

impl RelationStatus {
    /// The wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationStatus::None => "none",
            RelationStatus::Sent => "sent",
            RelationStatus::Received => "received",
            RelationStatus::Friends => "friends",
        }
    }
}

/// A user as seen through discovery, computed on read and never persisted
#[derive(Clone, Debug)]
pub struct DiscoverableUser {
    /// The user's id
    pub uuid: Uuid,
    /// The user's username
    pub username: String,
    /// The user's email address
    pub email: String,
    /// Number of friends shared with the current user
    pub mutual_friends: usize,
    /// Relation of this user to the current user
    pub status: RelationStatus,
}

/// The discovery result: the listing plus any non-fatal degradations that
/// occurred while computing it
#[derive(Debug, Default)]
pub struct DiscoveryListing {
    /// All discoverable users
    pub users: Vec<DiscoverableUser>,
    /// One entry per candidate whose mutual friend count was degraded to 0
    pub warnings: Vec<String>,
}

/// Composes the user directory, the friendship graph and the request engine
/// into the discovery listing.
pub struct DiscoveryResolver<S> {
    store: Arc<S>,
}

impl<S: Store> DiscoveryResolver<S> {
    /// Create the resolver on top of a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// List every user except the current one, annotated with relation status
    /// and mutual friend count.
    ///
    /// This is a best-effort read path: a failing mutual friend computation
    /// degrades that single candidate's count to 0 and records a warning, the
    /// candidate stays in the listing.
    pub async fn discoverable_users(&self, current: Uuid) -> ServiceResult<DiscoveryListing> {
        let candidates = self
            .store
            .all_users()
            .await?
            .into_iter()
            .filter(|user| user.uuid != current)
            .sorted_by(|a, b| a.username.cmp(&b.username));

        let mut listing = DiscoveryListing::default();

        for candidate in candidates {
            let Some(pair) = UserPair::new(current, candidate.uuid) else {
                continue;
            };

            let status = if self.store.friendship_exists_between(&pair).await? {
                RelationStatus::Friends
            } else {
                match self.store.request_between(&pair).await? {
                    Some(request) if request.status == RequestStatus::Pending => {
                        if request.requester == current {
                            RelationStatus::Sent
                        } else {
                            RelationStatus::Received
                        }
                    }
                    _ => RelationStatus::None,
                }
            };

            let mutual_friends = match self.store.mutual_friends(&pair).await {
                Ok(mutual) => mutual.len(),
                Err(err) => {
                    warn!(
                        "Could not compute mutual friends of {current} and {}: {err}",
                        candidate.uuid
                    );
                    listing
                        .warnings
                        .push(format!("mutual friends unavailable for {}", candidate.uuid));
                    0
                }
            };

            listing.users.push(DiscoverableUser {
                uuid: candidate.uuid,
                username: candidate.username,
                email: candidate.email,
                mutual_friends,
                status,
            });
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::service::{DiscoveryResolver, FriendRequestEngine, RelationStatus};
    use crate::store::memory::MemStore;

    fn status_of(listing: &crate::service::DiscoveryListing, user: Uuid) -> RelationStatus {
        listing
            .users
            .iter()
            .find(|u| u.uuid == user)
            .expect("user missing from listing")
            .status
    }

    #[tokio::test]
    async fn listing_excludes_the_current_user() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        store.add_user("bob");
        let resolver = DiscoveryResolver::new(store);

        let listing = resolver.discoverable_users(a).await.unwrap();

        assert_eq!(listing.users.len(), 1);
        assert!(listing.users.iter().all(|u| u.uuid != a));
    }

    #[tokio::test]
    async fn relation_status_follows_the_request_direction() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let resolver = DiscoveryResolver::new(store);

        engine.send(a, b).await.unwrap();

        let of_a = resolver.discoverable_users(a).await.unwrap();
        let of_b = resolver.discoverable_users(b).await.unwrap();

        assert_eq!(status_of(&of_a, b), RelationStatus::Sent);
        assert_eq!(status_of(&of_b, a), RelationStatus::Received);
    }

    #[tokio::test]
    async fn friends_outrank_any_request_state() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let resolver = DiscoveryResolver::new(store);

        engine.send(a, b).await.unwrap();
        engine.accept(a, b).await.unwrap();

        let listing = resolver.discoverable_users(a).await.unwrap();
        assert_eq!(status_of(&listing, b), RelationStatus::Friends);
    }

    #[tokio::test]
    async fn mutual_friends_are_counted() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let c = store.add_user("charlie");
        store.link(a, b);
        store.link(a, c);
        let resolver = DiscoveryResolver::new(store);

        let listing = resolver.discoverable_users(b).await.unwrap();

        let charlie = listing.users.iter().find(|u| u.uuid == c).unwrap();
        assert_eq!(charlie.status, RelationStatus::None);
        assert_eq!(charlie.mutual_friends, 1);
        assert!(listing.warnings.is_empty());
    }

    #[tokio::test]
    async fn failing_mutual_computation_degrades_instead_of_aborting() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        store.link(a, b);
        *store.fail_mutual_friends.lock().unwrap() = true;
        let resolver = DiscoveryResolver::new(store);

        let listing = resolver.discoverable_users(a).await.unwrap();

        let bob = listing.users.iter().find(|u| u.uuid == b).unwrap();
        assert_eq!(bob.mutual_friends, 0);
        assert_eq!(bob.status, RelationStatus::Friends);
        assert_eq!(listing.warnings.len(), 1);
    }
}
