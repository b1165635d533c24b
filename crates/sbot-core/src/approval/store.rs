use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    approval::model::{ApprovalUpdate, UserApproval},
    domain::UserId,
    Result,
};

/// Persistence port for approval records.
///
/// Implementations key records by `user_id` and must never create duplicates.
/// There is no versioning: the last writer wins.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Point lookup. `Ok(None)` means the user was never acted upon.
    async fn get(&self, user_id: UserId) -> Result<Option<UserApproval>>;

    /// Set the update's fields, creating the record if it does not exist.
    async fn upsert(&self, user_id: UserId, update: ApprovalUpdate) -> Result<()>;
}

/// Process-local store, used by tests and for running without a database.
#[derive(Default)]
pub struct InMemoryApprovalStore {
    records: Mutex<HashMap<UserId, UserApproval>>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: UserApproval) {
        self.records.lock().await.insert(record.user_id, record);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn get(&self, user_id: UserId) -> Result<Option<UserApproval>> {
        Ok(self.records.lock().await.get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: UserId, update: ApprovalUpdate) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(user_id, update.to_record(user_id));
        Ok(())
    }
}
