use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::models::AuthenticatedUser;
use crate::auth::token::TokenService;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Which checks the guard applies on top of token verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthOptions {
    /// Accept an expired access token (used by the refresh endpoint).
    pub refresh: bool,
    /// Reject callers that are not admins.
    pub admin_only: bool,
}

/// Resolve the caller from an `Authorization` header value.
///
/// Each step fails early: missing header, wrong scheme, empty token, bad
/// signature or expiry, deleted user, then the admin check.
pub async fn authenticate(
    users: &dyn UserRepository,
    tokens: &TokenService,
    header: Option<&str>,
    options: AuthOptions,
) -> Result<AuthenticatedUser, AppError> {
    let header = header.ok_or_else(|| AppError::Auth("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Authorization header must use the Bearer scheme".into()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Auth("Missing bearer token".into()));
    }

    let claims = tokens.verify_access(token, options.refresh)?;

    let user = users
        .find_by_id(&claims.id)
        .await?
        .ok_or_else(|| AppError::Auth("User no longer exists".into()))?
        .to_authenticated();

    if options.admin_only && !user.is_admin() {
        tracing::warn!(user_id = %user.id, "Non-admin attempted an admin operation");
        return Err(AppError::Forbidden("Admin access required".into()));
    }

    Ok(user)
}

fn authorization_header(parts: &Parts) -> Result<Option<&str>, AppError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::Auth("Malformed authorization header".into()))
        })
        .transpose()
}

async fn guard(
    parts: &Parts,
    state: &AppState,
    options: AuthOptions,
) -> Result<AuthenticatedUser, AppError> {
    let header = authorization_header(parts)?;
    authenticate(state.user_repo.as_ref(), &state.tokens, header, options).await
}

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

/// A signed-in admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

/// A user whose access token may have expired.
#[derive(Debug, Clone)]
pub struct RefreshUser(pub AuthenticatedUser);

/// The caller if an `Authorization` header is present, otherwise anonymous.
/// A header that is present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        guard(parts, state, AuthOptions::default()).await.map(AuthUser)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let options = AuthOptions {
            admin_only: true,
            ..AuthOptions::default()
        };
        guard(parts, state, options).await.map(AdminUser)
    }
}

impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let options = AuthOptions {
            refresh: true,
            ..AuthOptions::default()
        };
        guard(parts, state, options).await.map(RefreshUser)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeUser(None));
        }
        guard(parts, state, AuthOptions::default())
            .await
            .map(|user| MaybeUser(Some(user)))
    }
}
