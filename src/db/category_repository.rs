use async_trait::async_trait;

use crate::db::models::{Category, CategoryInput};
use crate::error::AppError;

/// Repository trait for question categories.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: Category) -> Result<(), AppError>;

    /// All categories sorted by name.
    async fn list_all(&self) -> Result<Vec<Category>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, AppError>;

    async fn update(&self, id: &str, input: CategoryInput) -> Result<Option<Category>, AppError>;

    async fn delete(&self, id: &str) -> Result<Option<Category>, AppError>;
}

/// MongoDB implementation of the CategoryRepository.
pub struct MongoCategoryRepository {
    collection: mongodb::Collection<Category>,
}

impl MongoCategoryRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("categories"),
        }
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    async fn create(&self, category: Category) -> Result<(), AppError> {
        self.collection.insert_one(&category).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn update(&self, id: &str, input: CategoryInput) -> Result<Option<Category>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let now = mongodb::bson::to_bson(&chrono::Utc::now())
            .map_err(|e| AppError::Internal(format!("BSON encoding failed: {e}")))?;
        let update = doc! {
            "$set": {
                "name": input.name.as_str(),
                "description": input.description.as_deref(),
                "updatedAt": now,
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, update)
            .with_options(options)
            .await?)
    }

    async fn delete(&self, id: &str) -> Result<Option<Category>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one_and_delete(doc! { "_id": id }).await?)
    }
}
