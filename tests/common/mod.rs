#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use concord::app::build_router;
use concord::auth::token::TokenService;
use concord::db::category_repository::{CategoryRepository, MongoCategoryRepository};
use concord::db::question_repository::{MongoQuestionRepository, QuestionRepository};
use concord::db::user_repository::{MongoUserRepository, UserRepository};
use concord::error::AppError;
use concord::llm::client::LlmClient;
use concord::state::AppState;

pub const ADMIN_SECRET: &str = "test-admin-secret";
pub const DISCORD_SECRET: &str = "test-discord-secret";
pub const PASSWORD: &str = "password123";

pub const CONSENSUS_JSON: &str = r#"```json
{
    "manager_question": "Should we adopt four-day weeks?",
    "summary_of_feedback": "Broad support with scheduling concerns.",
    "approve_percentage": 80,
    "points_of_agreement": ["Better focus"],
    "points_of_disagreement": ["Customer coverage"],
    "consensus_summary": "Pilot it.",
    "recommendations": ["Run a one-month pilot"]
}
```"#;

/// LLM stand-in that returns a fixed reply and counts calls.
pub struct ScriptedLlm {
    pub reply: Mutex<String>,
    pub calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Mutex::new(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.lock().unwrap().clone())
    }
}

/// Holds the running MongoDB container and the router wired to it.
///
/// The container lives as long as this struct.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub router: Router,
    pub users: Arc<dyn UserRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub llm: Arc<ScriptedLlm>,
    pub tokens: TokenService,
}

impl TestEnv {
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("concord_test");

        let user_repo = MongoUserRepository::new(&mongo_db);
        user_repo
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

        let users: Arc<dyn UserRepository> = Arc::new(user_repo);
        let questions: Arc<dyn QuestionRepository> =
            Arc::new(MongoQuestionRepository::new(&mongo_db));
        let categories: Arc<dyn CategoryRepository> =
            Arc::new(MongoCategoryRepository::new(&mongo_db));
        let llm = Arc::new(ScriptedLlm::new(CONSENSUS_JSON));
        let tokens = TokenService::new("test-jwt-secret", "test-refresh-secret");

        let state = AppState {
            user_repo: users.clone(),
            question_repo: questions.clone(),
            category_repo: categories.clone(),
            llm: llm.clone(),
            tokens: tokens.clone(),
            admin_secret: ADMIN_SECRET.to_string(),
            discord_secret: DISCORD_SECRET.to_string(),
            expose_error_details: false,
        };

        Self {
            _mongo: mongo_container,
            router: build_router(state),
            users,
            questions,
            categories,
            llm,
            tokens,
        }
    }

    /// A `TestServer` that does not assert on status codes.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Register an account and return its access token.
    pub async fn signup(&self, server: &axum_test::TestServer, email: &str, admin: bool) -> String {
        let mut body = serde_json::json!({
            "email": email,
            "password": PASSWORD,
            "name": email.split('@').next().unwrap_or("user"),
        });
        if admin {
            body["secret"] = serde_json::Value::String(ADMIN_SECRET.to_string());
        }
        server
            .post("/auth/v1/register")
            .json(&body)
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        self.login(server, email).await
    }

    pub async fn login(&self, server: &axum_test::TestServer, email: &str) -> String {
        let response = server
            .post("/auth/v1/login")
            .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["data"]["accessToken"]
            .as_str()
            .expect("login returns an access token")
            .to_string()
    }

    /// Id of the user behind an access token.
    pub fn user_id(&self, token: &str) -> String {
        self.tokens
            .verify_access(token, false)
            .expect("valid test token")
            .id
    }

    /// Create a question as `admin_token`, returning its id.
    pub async fn create_question(
        &self,
        server: &axum_test::TestServer,
        admin_token: &str,
        body: serde_json::Value,
    ) -> String {
        let response = server
            .post("/questions/v1")
            .add_header(header::AUTHORIZATION, bearer(admin_token))
            .json(&body)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["data"]["_id"]
            .as_str()
            .expect("created question has an id")
            .to_string()
    }
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value")
}

pub fn discord_secret_header() -> HeaderName {
    HeaderName::from_static("discord_secret")
}

/// A question body with a deadline one day out.
pub fn question_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": format!("Description of {title}"),
        "category": "team",
        "anonymous": false,
        "deadline": (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339(),
    })
}
