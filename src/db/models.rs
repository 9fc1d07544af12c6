use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::{AuthenticatedUser, UserRole};

/// A registered account, stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC hash. Never leaves the server.
    pub password: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_authenticated(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            discord_id: self.discord_id.clone(),
        }
    }
}

/// Public view of a user, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub discord_id: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            discord_id: user.discord_id,
            category: user.category,
            created_at: user.created_at,
        }
    }
}

/// Who wrote an answer. A platform user or an unlinked Discord member, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerAuthor {
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    #[serde(rename_all = "camelCase")]
    Discord { discord_user_id: String },
}

/// An answer embedded in its parent question's `answers` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub answer: String,
    #[serde(flatten)]
    pub author: AnswerAuthor,
    pub question_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(question_id: &str, text: String, author: AnswerAuthor) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            answer: text,
            author,
            question_id: question_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_by_user(&self, user_id: &str) -> bool {
        matches!(&self.author, AnswerAuthor::User { user_id: id } if id == user_id)
    }
}

/// How an answer is shown to API clients. Author fields are dropped for
/// anonymous questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub id: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_user_id: Option<String>,
    pub question_id: String,
    pub created_at: DateTime<Utc>,
}

impl AnswerView {
    pub fn from_answer(answer: &Answer, anonymous: bool) -> Self {
        let (user_id, discord_user_id) = match (&answer.author, anonymous) {
            (_, true) => (None, None),
            (AnswerAuthor::User { user_id }, false) => (Some(user_id.clone()), None),
            (AnswerAuthor::Discord { discord_user_id }, false) => {
                (None, Some(discord_user_id.clone()))
            }
        };
        Self {
            id: answer.id.clone(),
            answer: answer.answer.clone(),
            user_id,
            discord_user_id,
            question_id: answer.question_id.clone(),
            created_at: answer.created_at,
        }
    }
}

/// LLM-generated summary of a question's answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub manager_question: String,
    pub summary_of_feedback: String,
    pub approve_percentage: f64,
    pub points_of_agreement: Vec<String>,
    pub points_of_disagreement: Vec<String>,
    pub consensus_summary: String,
    pub recommendations: Vec<String>,
}

/// A question stored in the `questions` collection, answers embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub anonymous: bool,
    pub deadline: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub user_access: Vec<String>,
    #[serde(default)]
    pub role_access: Vec<UserRole>,
    #[serde(default)]
    pub discord_user_access: Vec<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub concense: Option<ConsensusResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Build a new question from its editable fields.
    pub fn new(input: QuestionInput, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            category: input.category,
            anonymous: input.anonymous,
            deadline: input.deadline,
            created_by: created_by.to_string(),
            user_access: input.user_access,
            role_access: input.role_access,
            discord_user_access: input.discord_user_access,
            answers: vec![],
            concense: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the question is open to everyone (no allow-list set).
    pub fn is_site_wide(&self) -> bool {
        self.user_access.is_empty()
            && self.role_access.is_empty()
            && self.discord_user_access.is_empty()
    }

    pub fn is_visible_to(&self, user: &AuthenticatedUser) -> bool {
        user.is_admin()
            || self.created_by == user.id
            || self.user_access.iter().any(|id| *id == user.id)
            || self.role_access.contains(&user.role)
            || self.is_site_wide()
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    pub fn into_view(self) -> QuestionView {
        QuestionView::from(self)
    }
}

/// How a question is shown to API clients. Embedded answers go through
/// [`AnswerView`] so anonymous questions never reveal their authors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub anonymous: bool,
    pub deadline: DateTime<Utc>,
    pub created_by: String,
    pub user_access: Vec<String>,
    pub role_access: Vec<UserRole>,
    pub discord_user_access: Vec<String>,
    pub answers: Vec<AnswerView>,
    pub concense: Option<ConsensusResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        let answers = q
            .answers
            .iter()
            .map(|a| AnswerView::from_answer(a, q.anonymous))
            .collect();
        Self {
            id: q.id,
            title: q.title,
            description: q.description,
            category: q.category,
            anonymous: q.anonymous,
            deadline: q.deadline,
            created_by: q.created_by,
            user_access: q.user_access,
            role_access: q.role_access,
            discord_user_access: q.discord_user_access,
            answers,
            concense: q.concense,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

/// Editable fields of a question, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub anonymous: bool,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub user_access: Vec<String>,
    #[serde(default)]
    pub role_access: Vec<UserRole>,
    #[serde(default)]
    pub discord_user_access: Vec<String>,
}

/// A question category, stored in the `categories` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
