//! In-memory repository mocks shared by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::auth::token::TokenService;
use crate::db::category_repository::CategoryRepository;
use crate::db::models::{Answer, Category, CategoryInput, ConsensusResult, Question, QuestionInput, User};
use crate::db::question_repository::QuestionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::llm::client::LlmClient;
use crate::state::AppState;

pub struct MockUserRepo {
    pub users: Mutex<Vec<User>>,
}

impl MockUserRepo {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepo {
    async fn create(&self, user: User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::UserAlreadyExists("User already exists".into()));
        }
        users.push(user);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_discord_ids(&self, discord_ids: &[String]) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| {
                u.discord_id
                    .as_ref()
                    .is_some_and(|d| discord_ids.contains(d))
            })
            .cloned()
            .collect())
    }

    async fn set_discord_id(&self, id: &str, discord_id: Option<&str>) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.discord_id = discord_id.map(str::to_string);
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct MockQuestionRepo {
    pub questions: Mutex<Vec<Question>>,
}

impl MockQuestionRepo {
    pub fn new() -> Self {
        Self {
            questions: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl QuestionRepository for MockQuestionRepo {
    async fn create(&self, question: Question) -> Result<(), AppError> {
        self.questions.lock().unwrap().push(question);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Question>, AppError> {
        Ok(self.questions.lock().unwrap().clone())
    }

    async fn list_by_creator(&self, user_id: &str) -> Result<Vec<Question>, AppError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == id)
            .cloned())
    }

    async fn update(&self, id: &str, input: QuestionInput) -> Result<Option<Question>, AppError> {
        let mut questions = self.questions.lock().unwrap();
        Ok(questions.iter_mut().find(|q| q.id == id).map(|q| {
            q.title = input.title;
            q.description = input.description;
            q.category = input.category;
            q.anonymous = input.anonymous;
            q.deadline = input.deadline;
            q.user_access = input.user_access;
            q.role_access = input.role_access;
            q.discord_user_access = input.discord_user_access;
            q.updated_at = Utc::now();
            q.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Question>, AppError> {
        let mut questions = self.questions.lock().unwrap();
        let position = questions.iter().position(|q| q.id == id);
        Ok(position.map(|i| questions.remove(i)))
    }

    async fn push_answer(&self, question_id: &str, answer: &Answer) -> Result<bool, AppError> {
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == question_id) {
            Some(question) => {
                question.answers.push(answer.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_consensus(&self, id: &str, consensus: &ConsensusResult) -> Result<bool, AppError> {
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.concense = Some(consensus.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct MockCategoryRepo {
    pub categories: Mutex<Vec<Category>>,
}

impl MockCategoryRepo {
    pub fn new() -> Self {
        Self {
            categories: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl CategoryRepository for MockCategoryRepo {
    async fn create(&self, category: Category) -> Result<(), AppError> {
        self.categories.lock().unwrap().push(category);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        let mut categories = self.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, AppError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn update(&self, id: &str, input: CategoryInput) -> Result<Option<Category>, AppError> {
        let mut categories = self.categories.lock().unwrap();
        Ok(categories.iter_mut().find(|c| c.id == id).map(|c| {
            c.name = input.name;
            c.description = input.description;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Category>, AppError> {
        let mut categories = self.categories.lock().unwrap();
        let position = categories.iter().position(|c| c.id == id);
        Ok(position.map(|i| categories.remove(i)))
    }
}

/// LLM stand-in that always replies with the same text.
pub struct StaticLlm(pub String);

#[async_trait]
impl LlmClient for StaticLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
        Ok(self.0.clone())
    }
}

/// Application state backed entirely by in-memory mocks.
pub fn mock_state() -> AppState {
    AppState {
        user_repo: Arc::new(MockUserRepo::new()),
        question_repo: Arc::new(MockQuestionRepo::new()),
        category_repo: Arc::new(MockCategoryRepo::new()),
        llm: Arc::new(StaticLlm(String::new())),
        tokens: TokenService::new("access-secret", "refresh-secret"),
        admin_secret: "admin-secret".to_string(),
        discord_secret: "discord-secret".to_string(),
        expose_error_details: false,
    }
}
