//! MongoDB adapter for the approval store.
//!
//! One document per user in a single collection, keyed by `user_id`. Documents
//! written by older deployments may carry extra fields or Int32 numbers; both are
//! accepted on read and left alone on write.

use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    options::{IndexOptions, UpdateOptions},
    Client, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};

use sbot_core::{
    approval::{ApprovalStore, ApprovalUpdate, UserApproval},
    domain::UserId,
    errors::Error,
    Result,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserDocument {
    user_id: i64,
    #[serde(default)]
    plan: i64,
    #[serde(default)]
    valid_until: Option<String>,
    #[serde(default)]
    access_count: i64,
}

impl From<UserDocument> for UserApproval {
    fn from(d: UserDocument) -> Self {
        Self {
            user_id: UserId(d.user_id),
            plan: d.plan,
            valid_until: d.valid_until.filter(|s| !s.is_empty()),
            access_count: d.access_count,
        }
    }
}

/// `$set` body for an update. Only these fields are touched.
fn set_document(update: &ApprovalUpdate) -> Document {
    doc! {
        "$set": {
            "plan": update.plan,
            "valid_until": update.valid_until_str(),
            "access_count": update.access_count,
        }
    }
}

fn map_err(e: mongodb::error::Error) -> Error {
    Error::Store(format!("mongodb error: {e}"))
}

#[derive(Clone, Debug)]
pub struct MongoApprovalStore {
    collection: Collection<UserDocument>,
}

impl MongoApprovalStore {
    /// Connect, select `database.collection`, and ensure the collection's indexes.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        tracing::debug!("setting up mongo client");
        let client = Client::with_uri_str(uri).await.map_err(map_err)?;
        let store = Self::new(&client.database(database), collection);

        tracing::debug!(collection, "setting up approval collection");
        store.setup_collection().await?;
        Ok(store)
    }

    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }

    /// Unique index on `user_id`, so concurrent upserts cannot create duplicates.
    pub async fn setup_collection(&self) -> Result<()> {
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(Some(IndexOptions::builder().unique(true).build()))
                    .build(),
                None,
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[async_trait]
impl ApprovalStore for MongoApprovalStore {
    async fn get(&self, user_id: UserId) -> Result<Option<UserApproval>> {
        let found = self
            .collection
            .find_one(doc! { "user_id": user_id.0 }, None)
            .await
            .map_err(map_err)?;
        Ok(found.map(UserApproval::from))
    }

    async fn upsert(&self, user_id: UserId, update: ApprovalUpdate) -> Result<()> {
        self.collection
            .update_one(
                doc! { "user_id": user_id.0 },
                set_document(&update),
                UpdateOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mongodb::bson::{self, oid::ObjectId};

    #[test]
    fn reads_legacy_int32_documents() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "user_id": 123_i32,
            "plan": 2_i32,
            "valid_until": "2026-11-18",
            "access_count": 5_i32,
            "username": "ignored",
        };
        let d: UserDocument = bson::from_document(raw).unwrap();
        assert_eq!(
            UserApproval::from(d),
            UserApproval {
                user_id: UserId(123),
                plan: 2,
                valid_until: Some("2026-11-18".to_string()),
                access_count: 5,
            }
        );
    }

    #[test]
    fn missing_and_empty_fields_default() {
        let d: UserDocument = bson::from_document(doc! { "user_id": 9_i64 }).unwrap();
        let rec = UserApproval::from(d);
        assert_eq!(rec.plan, 0);
        assert_eq!(rec.valid_until, None);
        assert!(!rec.is_approved());

        let d: UserDocument =
            bson::from_document(doc! { "user_id": 9_i64, "plan": 0, "valid_until": "" }).unwrap();
        assert_eq!(UserApproval::from(d).valid_until, None);

        let d: UserDocument =
            bson::from_document(doc! { "user_id": 9_i64, "valid_until": bson::Bson::Null })
                .unwrap();
        assert_eq!(UserApproval::from(d).valid_until, None);
    }

    #[test]
    fn set_document_covers_exactly_the_update_fields() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            set_document(&ApprovalUpdate::approve(3, d)),
            doc! { "$set": { "plan": 3_i64, "valid_until": "2026-10-19", "access_count": 0_i64 } }
        );
        assert_eq!(
            set_document(&ApprovalUpdate::disapprove()),
            doc! { "$set": { "plan": 0_i64, "valid_until": "", "access_count": 0_i64 } }
        );
    }
}
