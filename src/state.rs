use std::sync::Arc;

use crate::auth::token::TokenService;
use crate::db::category_repository::CategoryRepository;
use crate::db::question_repository::QuestionRepository;
use crate::db::user_repository::UserRepository;
use crate::llm::client::LlmClient;

/// Shared, immutable application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub question_repo: Arc<dyn QuestionRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub llm: Arc<dyn LlmClient>,
    pub tokens: TokenService,
    /// Signup secret that grants the admin role.
    pub admin_secret: String,
    /// Shared secret the Discord bot sends in the `discord_secret` header.
    pub discord_secret: String,
    /// Include underlying error text in 5xx replies.
    pub expose_error_details: bool,
}
