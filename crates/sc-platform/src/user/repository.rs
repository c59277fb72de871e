//! User Repository

use futures::TryStreamExt;
use mongodb::{bson::doc, Collection, Database};

use super::entity::User;
use crate::shared::error::{PlatformError, Result};
use crate::shared::indexes::is_duplicate_key;

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Fails with `Duplicate` when the username is already taken.
    pub async fn insert(&self, user: &User) -> Result<()> {
        match self.collection.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(PlatformError::duplicate("User", "username", &user.username)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn set_selected_emoji(&self, id: &str, emoji: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "selectedEmoji": emoji } })
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }
}
