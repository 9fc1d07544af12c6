use async_trait::async_trait;

use crate::db::models::User;
use crate::error::AppError;

/// Repository trait for user accounts.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `UserAlreadyExists` if the email is taken.
    async fn create(&self, user: User) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Users whose linked Discord id is in `discord_ids`.
    async fn find_by_discord_ids(&self, discord_ids: &[String]) -> Result<Vec<User>, AppError>;

    /// Set or clear the linked Discord id. Returns `false` if the user doesn't exist.
    async fn set_discord_id(&self, id: &str, discord_id: Option<&str>) -> Result<bool, AppError>;
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Create the unique index on `email`. Should be called once on startup.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: User) -> Result<(), AppError> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::UserAlreadyExists("User already exists".into()))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_discord_ids(&self, discord_ids: &[String]) -> Result<Vec<User>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;

        let cursor = self
            .collection
            .find(doc! { "discordId": { "$in": discord_ids } })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn set_discord_id(&self, id: &str, discord_id: Option<&str>) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
        let update = match discord_id {
            Some(discord_id) => doc! {
                "$set": { "discordId": discord_id, "updatedAt": now.as_str() }
            },
            None => doc! {
                "$unset": { "discordId": "" },
                "$set": { "updatedAt": now.as_str() }
            },
        };

        let result = self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }
}
