use async_trait::async_trait;

use crate::db::models::{Answer, ConsensusResult, Question, QuestionInput};
use crate::error::AppError;

/// Repository trait for questions and their embedded answers.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: Question) -> Result<(), AppError>;

    /// Every question in the collection, oldest first.
    async fn list_all(&self) -> Result<Vec<Question>, AppError>;

    async fn list_by_creator(&self, user_id: &str) -> Result<Vec<Question>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Question>, AppError>;

    /// Overwrite the editable fields. Returns the updated question, if it exists.
    async fn update(&self, id: &str, input: QuestionInput) -> Result<Option<Question>, AppError>;

    /// Delete a question. Returns the deleted question, if it existed.
    async fn delete(&self, id: &str) -> Result<Option<Question>, AppError>;

    /// Append an answer with a single atomic push. Returns `false` if the
    /// question doesn't exist.
    async fn push_answer(&self, question_id: &str, answer: &Answer) -> Result<bool, AppError>;

    /// Overwrite the `concense` field. Returns `false` if the question doesn't exist.
    async fn set_consensus(&self, id: &str, consensus: &ConsensusResult) -> Result<bool, AppError>;
}

/// MongoDB implementation of the QuestionRepository.
pub struct MongoQuestionRepository {
    collection: mongodb::Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("questions"),
        }
    }

    async fn find_many(
        &self,
        filter: mongodb::bson::Document,
    ) -> Result<Vec<Question>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();

        let cursor = self.collection.find(filter).with_options(options).await?;

        Ok(cursor.try_collect().await?)
    }
}

fn to_bson<T: serde::Serialize>(value: &T) -> Result<mongodb::bson::Bson, AppError> {
    mongodb::bson::to_bson(value).map_err(|e| AppError::Internal(format!("BSON encoding failed: {e}")))
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create(&self, question: Question) -> Result<(), AppError> {
        self.collection.insert_one(&question).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Question>, AppError> {
        use mongodb::bson::doc;

        self.find_many(doc! {}).await
    }

    async fn list_by_creator(&self, user_id: &str) -> Result<Vec<Question>, AppError> {
        use mongodb::bson::doc;

        self.find_many(doc! { "createdBy": user_id }).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn update(&self, id: &str, input: QuestionInput) -> Result<Option<Question>, AppError> {
        use mongodb::bson::{doc, Bson};
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let mut fields = match to_bson(&input)? {
            Bson::Document(fields) => fields,
            other => {
                return Err(AppError::Internal(format!(
                    "Question input encoded as {other:?}"
                )))
            }
        };
        fields.insert("updatedAt", to_bson(&chrono::Utc::now())?);

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .with_options(options)
            .await?)
    }

    async fn delete(&self, id: &str) -> Result<Option<Question>, AppError> {
        use mongodb::bson::doc;

        Ok(self.collection.find_one_and_delete(doc! { "_id": id }).await?)
    }

    async fn push_answer(&self, question_id: &str, answer: &Answer) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(
                doc! { "_id": question_id },
                doc! { "$push": { "answers": to_bson(answer)? } },
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn set_consensus(&self, id: &str, consensus: &ConsensusResult) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "concense": to_bson(consensus)?,
                    "updatedAt": to_bson(&chrono::Utc::now())?,
                } },
            )
            .await?;

        Ok(result.matched_count > 0)
    }
}
