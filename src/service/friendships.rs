//! The friendship graph: undirected, deduplicated edges between users

use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::models::UserPair;
use crate::service::{ServiceError, ServiceResult};
use crate::store::{Store, UserProfile};

/// Read and mutate the set of friendship edges.
///
/// All pair-wise operations are direction-independent, the canonical
/// [UserPair] handles normalization.
pub struct FriendshipGraph<S> {
    store: Arc<S>,
}

impl<S: Store> FriendshipGraph<S> {
    /// Create the graph view on top of a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check whether two users share a friendship edge.
    ///
    /// A user is never their own friend, the self pair yields `false` without
    /// an error.
    pub async fn are_friends(&self, a: Uuid, b: Uuid) -> ServiceResult<bool> {
        let Some(pair) = UserPair::new(a, b) else {
            return Ok(false);
        };

        Ok(self.store.friendship_exists_between(&pair).await?)
    }

    /// Retrieve all friends of a user, in no significant order
    pub async fn friends_of(&self, user: Uuid) -> ServiceResult<Vec<UserProfile>> {
        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        Ok(self.store.friends_of(user).await?)
    }

    /// Retrieve the users befriended with both `a` and `b`.
    ///
    /// Symmetric in its arguments.
    pub async fn mutual_friends(&self, a: Uuid, b: Uuid) -> ServiceResult<Vec<UserProfile>> {
        let pair = UserPair::new(a, b).ok_or(ServiceError::SelfRequest)?;

        if !self.store.user_exists(a).await? || !self.store.user_exists(b).await? {
            return Err(ServiceError::UserNotFound);
        }

        Ok(self.store.mutual_friends(&pair).await?)
    }

    /// Remove the friendship between two users.
    ///
    /// The edge and the answered request row between the pair are deleted in
    /// one storage transaction, a half-removed pair can never be left behind.
    /// This frees the pair for a fresh request.
    pub async fn remove(&self, a: Uuid, b: Uuid) -> ServiceResult<()> {
        let pair = UserPair::new(a, b).ok_or(ServiceError::SelfRequest)?;

        if !self.store.user_exists(a).await? || !self.store.user_exists(b).await? {
            return Err(ServiceError::UserNotFound);
        }

        if !self.store.delete_friendship_and_request(&pair).await? {
            return Err(ServiceError::FriendshipNotFound);
        }

        info!("Friendship between {a} and {b} removed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::models::{RequestStatus, UserPair};
    use crate::service::{FriendRequestEngine, FriendshipGraph, ServiceError};
    use crate::store::memory::MemStore;
    use crate::store::FriendRequestStore;

    #[tokio::test]
    async fn self_pair_is_never_friends() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let graph = FriendshipGraph::new(store);

        assert!(!graph.are_friends(a, a).await.unwrap());
    }

    #[tokio::test]
    async fn friends_of_unknown_user_fails() {
        let store = Arc::new(MemStore::new());
        let graph = FriendshipGraph::new(store);

        assert!(matches!(
            graph.friends_of(uuid::Uuid::new_v4()).await,
            Err(ServiceError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn mutual_friends_are_symmetric() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let c = store.add_user("charlie");
        store.link(a, b);
        store.link(a, c);
        let graph = FriendshipGraph::new(store);

        let bc = graph.mutual_friends(b, c).await.unwrap();
        let cb = graph.mutual_friends(c, b).await.unwrap();

        assert_eq!(bc.len(), 1);
        assert_eq!(bc[0].uuid, a);
        assert_eq!(bc, cb);
    }

    #[tokio::test]
    async fn mutual_friends_of_self_pair_fails() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let graph = FriendshipGraph::new(store);

        assert!(matches!(
            graph.mutual_friends(a, a).await,
            Err(ServiceError::SelfRequest)
        ));
    }

    #[tokio::test]
    async fn remove_deletes_the_edge() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        store.link(a, b);
        let graph = FriendshipGraph::new(store);

        graph.remove(a, b).await.unwrap();

        assert!(!graph.are_friends(a, b).await.unwrap());
        assert!(matches!(
            graph.remove(a, b).await,
            Err(ServiceError::FriendshipNotFound)
        ));
    }

    #[tokio::test]
    async fn remove_frees_the_pair_for_a_new_request() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let graph = FriendshipGraph::new(store);

        engine.send(a, b).await.unwrap();
        engine.accept(a, b).await.unwrap();
        graph.remove(a, b).await.unwrap();

        // The accepted request row was cleaned up alongside the edge
        engine.send(b, a).await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_edge_and_request_in_one_operation() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let graph = FriendshipGraph::new(store.clone());

        engine.send(a, b).await.unwrap();
        engine.accept(a, b).await.unwrap();
        graph.remove(a, b).await.unwrap();

        let pair = UserPair::new(a, b).unwrap();
        assert!(store.request_between(&pair).await.unwrap().is_none());
        assert!(!graph.are_friends(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn failed_remove_leaves_a_pending_request_untouched() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let graph = FriendshipGraph::new(store.clone());

        engine.send(a, b).await.unwrap();

        assert!(matches!(
            graph.remove(a, b).await,
            Err(ServiceError::FriendshipNotFound)
        ));

        let pair = UserPair::new(a, b).unwrap();
        assert_eq!(
            store.request_between(&pair).await.unwrap().unwrap().status,
            RequestStatus::Pending
        );
    }
}
