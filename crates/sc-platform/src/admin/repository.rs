//! Admin Repository

use mongodb::{bson::doc, Collection, Database};

use super::entity::Admin;
use crate::shared::error::{PlatformError, Result};
use crate::shared::indexes::is_duplicate_key;

pub struct AdminRepository {
    collection: Collection<Admin>,
}

impl AdminRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("admins"),
        }
    }

    pub async fn insert(&self, admin: &Admin) -> Result<()> {
        match self.collection.insert_one(admin).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(PlatformError::duplicate("Admin", "username", &admin.username)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Admin>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    /// Returns false when no admin has this id.
    pub async fn set_custom_message(&self, id: &str, message: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "customMessage": message } })
            .await?;
        Ok(result.matched_count > 0)
    }
}
