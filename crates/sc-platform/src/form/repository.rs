//! Form Repository

use futures::TryStreamExt;
use mongodb::{bson::doc, Collection, Database};

use super::entity::Form;
use crate::shared::error::Result;

pub struct FormRepository {
    collection: Collection<Form>,
}

impl FormRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("forms"),
        }
    }

    pub async fn insert(&self, form: &Form) -> Result<()> {
        self.collection.insert_one(form).await?;
        Ok(())
    }

    pub async fn find_all(&self) -> Result<Vec<Form>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }
}
