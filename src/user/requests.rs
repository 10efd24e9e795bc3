use serde::Deserialize;

use crate::models::users::Role;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub telephone: String,
    /// Defaults to `[client]`.
    pub roles: Option<Vec<Role>>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ModifyInfoRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Deserialize)]
pub struct ModifyPasswordRequest {
    pub password_old: String,
    pub password_new: String,
}

#[derive(Deserialize)]
pub struct ModifyRolesRequest {
    pub roles: Vec<Role>,
}
