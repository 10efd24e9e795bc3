use serde::Serialize;

use crate::{
    models::users::{Role, UserData},
    utils::format_datetime_str,
};

#[derive(Default, Serialize)]
pub struct UserItem {
    pub username: String,
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub roles: Vec<Role>,
    pub is_banned: bool,
    pub created_at: String,
}

impl From<UserData> for UserItem {
    fn from(data: UserData) -> Self {
        Self {
            roles: data.roles().to_list(),
            created_at: format_datetime_str(&data.created_at),
            username: data.username,
            name: data.name,
            email: data.email,
            telephone: data.telephone,
            is_banned: data.is_banned,
        }
    }
}

#[derive(Default, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub login_token: String,
    pub user: Option<UserItem>,
}

#[derive(Default, Serialize)]
pub struct ViewInfoResponse {
    pub success: bool,
    pub message: String,
    pub user: Option<UserItem>,
}

crate::impl_err_response! {
    LoginResponse,
    ViewInfoResponse,
}
