//! Profile and metadata access on the user directory

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use crate::service::{ServiceError, ServiceResult};
use crate::store::{Store, UserProfile};

/// Read access to user records plus the metadata merge operations.
///
/// Metadata writes are last-writer-wins per key, there is no read-modify-write
/// protection beyond the storage layer's row locking.
pub struct UserDirectory<S> {
    store: Arc<S>,
}

impl<S: Store> UserDirectory<S> {
    /// Create the directory view on top of a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Look up a user's profile
    pub async fn profile(&self, user: Uuid) -> ServiceResult<UserProfile> {
        self.store
            .user_by_id(user)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    /// Retrieve a user's full metadata mapping
    pub async fn metadata(&self, user: Uuid) -> ServiceResult<HashMap<String, String>> {
        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        Ok(self.store.metadata_of(user).await?)
    }

    /// Merge entries into a user's metadata mapping, overwriting existing keys
    pub async fn merge_metadata(
        &self,
        user: Uuid,
        entries: HashMap<String, String>,
    ) -> ServiceResult<HashMap<String, String>> {
        if !self.store.user_exists(user).await? {
            return Err(ServiceError::UserNotFound);
        }

        debug!("Merging {} metadata entries for {user}", entries.len());

        self.store.merge_metadata(user, entries).await?;

        Ok(self.store.metadata_of(user).await?)
    }

    /// Set a single metadata attribute
    pub async fn set_attribute(
        &self,
        user: Uuid,
        key: &str,
        value: String,
    ) -> ServiceResult<HashMap<String, String>> {
        self.merge_metadata(user, HashMap::from([(key.to_string(), value)]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::service::{ServiceError, UserDirectory};
    use crate::store::memory::MemStore;

    #[tokio::test]
    async fn metadata_merge_is_last_writer_wins() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let directory = UserDirectory::new(store);

        directory
            .merge_metadata(a, HashMap::from([("bloodType".to_string(), "A+".to_string())]))
            .await
            .unwrap();
        let meta = directory
            .merge_metadata(a, HashMap::from([("bloodType".to_string(), "0-".to_string())]))
            .await
            .unwrap();

        assert_eq!(meta.get("bloodType").map(String::as_str), Some("0-"));
        assert_eq!(meta.len(), 1);
    }

    #[tokio::test]
    async fn merging_keeps_unrelated_keys() {
        let store = Arc::new(MemStore::new());
        let a = store.add_user("alice");
        let directory = UserDirectory::new(store);

        directory
            .set_attribute(a, "job", "paramedic".to_string())
            .await
            .unwrap();
        let meta = directory
            .set_attribute(a, "allergies", "pollen".to_string())
            .await
            .unwrap();

        assert_eq!(meta.get("job").map(String::as_str), Some("paramedic"));
        assert_eq!(meta.get("allergies").map(String::as_str), Some("pollen"));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let store = Arc::new(MemStore::new());
        let directory = UserDirectory::new(store);

        assert!(matches!(
            directory.metadata(uuid::Uuid::new_v4()).await,
            Err(ServiceError::UserNotFound)
        ));
    }
}
