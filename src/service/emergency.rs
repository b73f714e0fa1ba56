//! Emergency alert fan-out to a user's friend set

use std::sync::Arc;

use log::{error, info, warn};
use uuid::Uuid;

use crate::chan::{PushManagerChan, PushManagerMessage};
use crate::service::{ServiceError, ServiceResult};
use crate::store::Store;

/// The metadata key holding a user's device push token
pub const PUSH_TOKEN_KEY: &str = "expoPushToken";

/// The outcome of an emergency fan-out.
///
/// The trigger succeeds once the friend set could be resolved, partial
/// delivery is preferable to a caller-visible failure. This report makes the
/// degradation explicit instead of swallowing it.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Friends an alert was handed to the push manager for
    pub notified: Vec<Uuid>,
    /// Friends skipped because they have no push token registered
    pub skipped: Vec<Uuid>,
}

/// Broadcasts an emergency alert to every friend of a user
pub struct EmergencyDispatcher<S> {
    store: Arc<S>,
    push_manager_chan: PushManagerChan,
}

impl<S: Store> EmergencyDispatcher<S> {
    /// Create the dispatcher on top of a store and the push manager channel
    pub fn new(store: Arc<S>, push_manager_chan: PushManagerChan) -> Self {
        Self {
            store,
            push_manager_chan,
        }
    }

    /// Trigger an emergency call: alert every friend with a registered push
    /// token.
    ///
    /// Per-friend problems are logged and never halt the fan-out. Delivery
    /// itself is fire-and-forget inside the push manager.
    pub async fn trigger(&self, user: Uuid) -> ServiceResult<DispatchReport> {
        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        let friends = self.store.friends_of(user).await?;

        let mut report = DispatchReport::default();

        for friend in friends {
            let meta = match self.store.metadata_of(friend.uuid).await {
                Ok(meta) => meta,
                Err(err) => {
                    error!("Could not load metadata of {}: {err}", friend.uuid);
                    report.skipped.push(friend.uuid);
                    continue;
                }
            };

            let Some(token) = meta.get(PUSH_TOKEN_KEY).filter(|t| !t.trim().is_empty()) else {
                warn!("Friend {} has no push token registered", friend.uuid);
                report.skipped.push(friend.uuid);
                continue;
            };

            if let Err(err) = self
                .push_manager_chan
                .send(PushManagerMessage::EmergencyAlert {
                    push_token: token.clone(),
                    caller: user,
                })
                .await
            {
                error!("Could not send to push manager chan: {err}");
                continue;
            }

            report.notified.push(friend.uuid);
        }

        info!(
            "Emergency call of {user}: {} friends alerted, {} skipped",
            report.notified.len(),
            report.skipped.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use crate::chan::PushManagerMessage;
    use crate::service::emergency::PUSH_TOKEN_KEY;
    use crate::service::{EmergencyDispatcher, ServiceError};
    use crate::store::memory::MemStore;

    #[tokio::test]
    async fn alerts_every_friend_with_a_token() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let c = store.add_user("charlie");
        store.link(a, b);
        store.link(a, c);
        store.set_meta(b, PUSH_TOKEN_KEY, "ExponentPushToken[bob]");
        store.set_meta(c, PUSH_TOKEN_KEY, "ExponentPushToken[charlie]");

        let (tx, mut rx) = mpsc::channel(16);
        let dispatcher = EmergencyDispatcher::new(store, tx);

        let report = dispatcher.trigger(a).await.unwrap();

        assert_eq!(report.notified.len(), 2);
        assert!(report.skipped.is_empty());

        let mut tokens = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let PushManagerMessage::EmergencyAlert { push_token, caller } = msg;
            assert_eq!(caller, a);
            tokens.push(push_token);
        }
        tokens.sort();
        assert_eq!(
            tokens,
            vec!["ExponentPushToken[bob]", "ExponentPushToken[charlie]"]
        );
    }

    #[tokio::test]
    async fn friends_without_token_are_skipped_not_fatal() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        let c = store.add_user("charlie");
        store.link(a, b);
        store.link(a, c);
        store.set_meta(c, PUSH_TOKEN_KEY, "ExponentPushToken[charlie]");

        let (tx, _rx) = mpsc::channel(16);
        let dispatcher = EmergencyDispatcher::new(store, tx);

        let report = dispatcher.trigger(a).await.unwrap();

        assert_eq!(report.notified, vec![c]);
        assert_eq!(report.skipped, vec![b]);
    }

    #[tokio::test]
    async fn a_dead_push_manager_does_not_fail_the_trigger() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let b = store.add_user("bob");
        store.link(a, b);
        store.set_meta(b, PUSH_TOKEN_KEY, "ExponentPushToken[bob]");

        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let dispatcher = EmergencyDispatcher::new(store, tx);

        let report = dispatcher.trigger(a).await.unwrap();

        assert!(report.notified.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_fails_before_any_fanout() {
        let store = Arc::new(MemStore::new());
        let (tx, _rx) = mpsc::channel(16);
        let dispatcher = EmergencyDispatcher::new(store, tx);

        assert!(matches!(
            dispatcher.trigger(uuid::Uuid::new_v4()).await,
            Err(ServiceError::UserNotFound)
        ));
    }
}
