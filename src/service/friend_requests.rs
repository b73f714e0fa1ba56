//! The friend request state machine

use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::models::{RequestStatus, UserPair};
use crate::service::{ServiceError, ServiceResult};
use crate::store::{FriendRequestRecord, Store};

/// Governs the lifecycle of friend requests: send, accept, reject.
///
/// A pending request may be accepted or rejected by its recipient, there are
/// no other transitions. Accepting atomically creates the friendship edge.
pub struct FriendRequestEngine<S> {
    store: Arc<S>,
}

impl<S: Store> FriendRequestEngine<S> {
    /// Create the engine on top of a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Send a friend request from `requester` to `requested`.
    ///
    /// Fails if either user is unknown, the users are the same, they already
    /// share a friendship, or any request row exists between them. A rejected
    /// request keeps blocking new ones until the pair is unfriended.
    pub async fn send(
        &self,
        requester: Uuid,
        requested: Uuid,
    ) -> ServiceResult<FriendRequestRecord> {
        if !self.store.user_exists(requester).await? {
            return Err(ServiceError::UserNotFound);
        }
        if !self.store.user_exists(requested).await? {
            return Err(ServiceError::UserNotFound);
        }

        let pair = UserPair::new(requester, requested).ok_or(ServiceError::SelfRequest)?;

        if self.store.friendship_exists_between(&pair).await? {
            return Err(ServiceError::AlreadyFriends);
        }
        if self.store.request_exists_between(&pair).await? {
            return Err(ServiceError::DuplicateRequest);
        }

        // The unique pair constraint catches the race where two sends pass
        // the check above concurrently.
        let request = self.store.create_request(requester, requested).await?;

        info!("Friend request {} sent from {requester} to {requested}", request.uuid);

        Ok(request)
    }

    /// Accept the pending request sent by `requester` to `acting`.
    ///
    /// The status transition and the friendship creation happen in one
    /// storage transaction. The store re-checks the pending status inside
    /// that transaction, so a request answered between the check here and
    /// the transition stays in its terminal state.
    pub async fn accept(&self, requester: Uuid, acting: Uuid) -> ServiceResult<FriendRequestRecord> {
        let pair = self.answerable_request(requester, acting).await?;

        let request = self
            .store
            .accept_and_link(&pair)
            .await?
            .ok_or(ServiceError::RequestNotPending)?;

        info!("Friend request {} accepted, friendship created", request.uuid);

        Ok(request)
    }

    /// Reject the pending request sent by `requester` to `acting`
    pub async fn reject(&self, requester: Uuid, acting: Uuid) -> ServiceResult<FriendRequestRecord> {
        let pair = self.answerable_request(requester, acting).await?;

        let request = self
            .store
            .mark_rejected(&pair)
            .await?
            .ok_or(ServiceError::RequestNotPending)?;

        info!("Friend request {} rejected", request.uuid);

        Ok(request)
    }

    /// Look up the request between the pair and check that `acting` is its
    /// recipient and that it is still pending
    async fn answerable_request(&self, requester: Uuid, acting: Uuid) -> ServiceResult<UserPair> {
        let pair = UserPair::new(requester, acting).ok_or(ServiceError::SelfRequest)?;

        let request = self
            .store
            .request_between(&pair)
            .await?
            .ok_or(ServiceError::RequestNotFound)?;

        if request.requested != acting {
            return Err(ServiceError::NotRequestRecipient);
        }
        if request.status != RequestStatus::Pending {
            return Err(ServiceError::RequestNotPending);
        }

        Ok(pair)
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
    async fn send_creates_pending_request() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store);

        let request = engine.send(a, b).await.unwrap();

        assert_eq!(request.requester, a);
        assert_eq!(request.requested, b);
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn duplicate_send_fails_in_both_directions() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store);

        engine.send(a, b).await.unwrap();

        assert!(matches!(
            engine.send(a, b).await,
            Err(ServiceError::DuplicateRequest)
        ));
        assert!(matches!(
            engine.send(b, a).await,
            Err(ServiceError::DuplicateRequest)
        ));
    }

    #[tokio::test]
    async fn self_request_fails() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let engine = FriendRequestEngine::new(store);

        assert!(matches!(
            engine.send(a, a).await,
            Err(ServiceError::SelfRequest)
        ));
    }

    #[tokio::test]
    async fn send_to_unknown_user_fails() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let ghost = uuid::Uuid::new_v4();
        let engine = FriendRequestEngine::new(store);

        assert!(matches!(
            engine.send(a, ghost).await,
            Err(ServiceError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn send_between_friends_fails() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        store.link(a, b);
        let engine = FriendRequestEngine::new(store);

        assert!(matches!(
            engine.send(a, b).await,
            Err(ServiceError::AlreadyFriends)
        ));
    }

    #[tokio::test]
    async fn accept_creates_friendship_both_ways() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let graph = FriendshipGraph::new(store);

        engine.send(a, b).await.unwrap();
        let request = engine.accept(a, b).await.unwrap();

        assert_eq!(request.status, RequestStatus::Accepted);
        assert!(graph.are_friends(a, b).await.unwrap());
        assert!(graph.are_friends(b, a).await.unwrap());
    }

    #[tokio::test]
    async fn only_the_recipient_may_answer() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store);

        engine.send(a, b).await.unwrap();

        // The requester tries to accept their own request
        assert!(matches!(
            engine.accept(b, a).await,
            Err(ServiceError::NotRequestRecipient)
        ));
    }

    #[tokio::test]
    async fn answered_requests_are_terminal() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store);

        engine.send(a, b).await.unwrap();
        engine.reject(a, b).await.unwrap();

        assert!(matches!(
            engine.accept(a, b).await,
            Err(ServiceError::RequestNotPending)
        ));
        assert!(matches!(
            engine.reject(a, b).await,
            Err(ServiceError::RequestNotPending)
        ));
    }

    #[tokio::test]
    async fn store_refuses_to_transition_an_answered_request() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let graph = FriendshipGraph::new(store.clone());

        engine.send(a, b).await.unwrap();
        engine.reject(a, b).await.unwrap();

        // An accept validated before the reject committed hits the store
        // last, the terminal status must hold
        let pair = UserPair::new(a, b).unwrap();
        assert!(store.accept_and_link(&pair).await.unwrap().is_none());

        assert!(!graph.are_friends(a, b).await.unwrap());
        assert_eq!(
            store.request_between(&pair).await.unwrap().unwrap().status,
            RequestStatus::Rejected
        );
    }

    #[tokio::test]
    async fn store_keeps_the_friendship_when_a_raced_reject_arrives() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store.clone());
        let graph = FriendshipGraph::new(store.clone());

        engine.send(a, b).await.unwrap();
        engine.accept(a, b).await.unwrap();

        let pair = UserPair::new(a, b).unwrap();
        assert!(store.mark_rejected(&pair).await.unwrap().is_none());

        assert!(graph.are_friends(a, b).await.unwrap());
        assert_eq!(
            store.request_between(&pair).await.unwrap().unwrap().status,
            RequestStatus::Accepted
        );
    }

    #[tokio::test]
    async fn rejected_request_blocks_resending() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store);

        engine.send(a, b).await.unwrap();
        engine.reject(a, b).await.unwrap();

        assert!(matches!(
            engine.send(a, b).await,
            Err(ServiceError::DuplicateRequest)
        ));
    }

    #[tokio::test]
    async fn accept_without_request_fails() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let engine = FriendRequestEngine::new(store);

        assert!(matches!(
            engine.accept(a, b).await,
            Err(ServiceError::RequestNotFound)
        ));
    }
}
