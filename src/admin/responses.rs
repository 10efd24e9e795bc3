use serde::Serialize;

use crate::user::UserItem;

#[derive(Default, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub login_token: String,
}

#[derive(Default, Serialize)]
pub struct SearchUserResponse {
    pub success: bool,
    pub message: String,
    pub users: Vec<UserItem>,
}

crate::impl_err_response! {
    LoginResponse,
    SearchUserResponse,
}
