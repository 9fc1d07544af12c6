use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::api::response::{created, ok, ApiSuccess};
use crate::auth::middleware::{AuthUser, RefreshUser};
use crate::auth::models::{AuthenticatedUser, UserRole};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenService;
use crate::db::models::User;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDiscordRequest {
    #[serde(default)]
    pub discord_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `local@domain.tld`, no whitespace.
pub fn is_email_valid(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Emails are stored and looked up trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_password_valid(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Validate and store a new account.
pub async fn process_register(
    users: &dyn UserRepository,
    admin_secret: &str,
    request: RegisterRequest,
) -> Result<(), AppError> {
    let email = normalize_email(&request.email);
    if !is_email_valid(&email) || !is_password_valid(&request.password) {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::UserAlreadyExists("User already exists".into()));
    }

    let role = UserRole::for_signup(request.secret.as_deref(), admin_secret);
    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: request.name,
        email,
        password: hash_password(&request.password)?,
        role,
        discord_id: None,
        category: request.category,
        created_at: now,
        updated_at: now,
    };

    tracing::info!(user_id = %user.id, %role, "Registering user");
    users.create(user).await
}

pub async fn process_login(
    users: &dyn UserRepository,
    tokens: &TokenService,
    request: LoginRequest,
) -> Result<LoginResponse, AppError> {
    let user = users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .filter(|u| verify_password(&request.password, &u.password))
        .ok_or_else(|| AppError::InvalidCredentials("Invalid credentials".into()))?;

    Ok(LoginResponse {
        access_token: tokens.access_token(&user.id, &user.name, &user.email, user.role)?,
        refresh_token: tokens.refresh_token(&user.id, request.remember_me)?,
    })
}

/// Exchange a refresh token for a fresh access token.
pub fn process_refresh(
    tokens: &TokenService,
    user: &AuthenticatedUser,
    request: RefreshRequest,
) -> Result<TokenResponse, AppError> {
    let claims = tokens
        .verify_refresh(&request.refresh_token)
        .map_err(|_| AppError::InvalidCredentials("Invalid token".into()))?;
    if claims.id != user.id {
        return Err(AppError::InvalidCredentials("Invalid token".into()));
    }

    let token = tokens.access_token(&user.id, &user.name, &user.email, user.role)?;
    Ok(TokenResponse { token })
}

/// Link a Discord id and hand back a long-lived token for the bot.
pub async fn process_link_discord(
    users: &dyn UserRepository,
    tokens: &TokenService,
    user: &AuthenticatedUser,
    request: LinkDiscordRequest,
) -> Result<TokenResponse, AppError> {
    let discord_id = request.discord_id.trim();
    if discord_id.is_empty() {
        return Err(AppError::BadRequest("Discord ID is required".into()));
    }

    if !users.set_discord_id(&user.id, Some(discord_id)).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    let token = tokens.discord_access_token(&user.id, &user.name, &user.email, user.role)?;
    Ok(TokenResponse { token })
}

pub async fn process_unlink_discord(
    users: &dyn UserRepository,
    user: &AuthenticatedUser,
) -> Result<(), AppError> {
    if !users.set_discord_id(&user.id, None).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(())
}

/// `POST /auth/v1/register`
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<ApiSuccess<&'static str>, AppError> {
    process_register(state.user_repo.as_ref(), &state.admin_secret, request).await?;
    Ok(created("User created successfully"))
}

/// `POST /auth/v1/login`
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiSuccess<LoginResponse>, AppError> {
    let response = process_login(state.user_repo.as_ref(), &state.tokens, request).await?;
    Ok(ok(response))
}

/// `POST /auth/v1/refresh-token`
pub async fn refresh_handler(
    State(state): State<AppState>,
    RefreshUser(user): RefreshUser,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<ApiSuccess<TokenResponse>, AppError> {
    Ok(ok(process_refresh(&state.tokens, &user, request)?))
}

/// `POST /auth/v1/link-discord-account`
pub async fn link_discord_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<LinkDiscordRequest>,
) -> Result<ApiSuccess<TokenResponse>, AppError> {
    let response =
        process_link_discord(state.user_repo.as_ref(), &state.tokens, &user, request).await?;
    Ok(ok(response))
}

/// `POST /auth/v1/unlink-discord-account`
pub async fn unlink_discord_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiSuccess<&'static str>, AppError> {
    process_unlink_discord(state.user_repo.as_ref(), &user).await?;
    Ok(ok("Discord account unlinked successfully"))
}
