use serde::{Deserialize, Serialize};
use std::fmt;

/// The two roles a Concord user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can create, edit and delete questions and categories, and trigger consensus.
    Admin,
    /// Can answer questions visible to them.
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl UserRole {
    /// Role granted at signup: admin only when the supplied secret matches.
    pub fn for_signup(secret: Option<&str>, admin_secret: &str) -> Self {
        match secret {
            Some(s) if s == admin_secret => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

/// The caller of a request, resolved from a verified bearer token and
/// reloaded from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub discord_id: Option<String>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}
