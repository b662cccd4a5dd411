use serde::{Deserialize, Serialize};

/// Login / registration credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of a successful login or refresh: the short-lived bearer token. The
/// long-lived refresh credential travels separately, as an HTTP-only cookie.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// The logged-in user, from `/user/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
}

/// A freshly registered account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    pub user_id: String,
    pub email: String,
}
