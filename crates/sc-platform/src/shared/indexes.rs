//! MongoDB Index Initialization
//!
//! Creates the indexes the account collections rely on. Run once at startup.

use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{bson::doc, bson::Document, options::IndexOptions, Database, IndexModel};
use tracing::info;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    for collection in ["admins", "users"] {
        db.collection::<Document>(collection)
            .create_index(unique_username_index())
            .await?;
    }

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

/// Usernames are unique per account collection.
pub fn unique_username_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "username": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

/// Whether an insert failed on a unique index.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_index_is_unique() {
        let index = unique_username_index();
        assert_eq!(index.keys, doc! { "username": 1 });
        assert_eq!(index.options.and_then(|o| o.unique), Some(true));
    }

    #[test]
    fn test_other_errors_are_not_duplicates() {
        let err = mongodb::error::Error::from(std::io::Error::other("connection reset"));
        assert!(!is_duplicate_key(&err));
    }
}
