use serde::Deserialize;

use crate::models::users::Role;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub aid: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub aid: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SearchUserQuery {
    /// Matched against username and name.
    pub keyword: Option<String>,
    pub role: Option<Role>,
    pub banned: Option<bool>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct BanUserRequest {
    pub username: String,
    pub banned: bool,
}
