mod requests;
mod responses;

use crate::{
    auth::{AuthUser, BearerToken},
    database::get_db_conn,
    error::{ApiError, ApiResult},
    models::{
        user_logins::UserLoginData,
        users::{Role, Roles, UpdateUser, UserData},
    },
    protocol::SimpleResponse,
    utils::{generate_login_token, hash_password, non_empty, now},
    DbPool,
};
use actix_web::web;
use diesel::prelude::*;

use self::{requests::*, responses::*};

pub use self::responses::UserItem;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(view_info)
        .service(modify_info)
        .service(modify_password)
        .service(modify_roles);
}

crate::api_funcs! {
    (register, post, "/register", [info: web::Json<RegisterRequest>], SimpleResponse),
    (login, post, "/login", [info: web::Json<LoginRequest>], LoginResponse),
    (logout, post, "/logout", [token: BearerToken], SimpleResponse),
    (view_info, get, "/me", [user: AuthUser], ViewInfoResponse),
    (modify_info, put, "/me", [user: AuthUser, info: web::Json<ModifyInfoRequest>], ViewInfoResponse),
    (modify_password, put, "/password", [user: AuthUser, info: web::Json<ModifyPasswordRequest>], SimpleResponse),
    (modify_roles, put, "/roles", [user: AuthUser, info: web::Json<ModifyRolesRequest>], ViewInfoResponse),
}

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_USERNAME_LEN: usize = 32;

/// Account ids: 1 to 32 ASCII letters, digits or underscores.
pub fn check_account_id(id: &str) -> ApiResult<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_USERNAME_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ApiError::bad_request(
            "Username must be 1-32 letters, digits or underscores",
        ));
    }
    Ok(())
}

pub fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> ApiResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::bad_request("Invalid email address")),
    }
}

fn check_roles(roles: &[Role]) -> ApiResult<Roles> {
    let roles = Roles::from_list(roles);
    if roles.is_empty() {
        return Err(ApiError::bad_request("At least one role is required"));
    }
    Ok(roles)
}

async fn register_impl(
    pool: web::Data<DbPool>,
    info: web::Json<RegisterRequest>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::users;

    let info = info.into_inner();
    let username = info.username.trim().to_string();
    check_account_id(&username)?;
    check_password(&info.password)?;
    let email = info.email.trim().to_string();
    check_email(&email)?;
    let name = non_empty(Some(info.name)).ok_or_else(|| ApiError::bad_request("Name is required"))?;
    let roles = check_roles(info.roles.as_deref().unwrap_or(&[Role::Client]))?;

    let data = UserData {
        username,
        password: hash_password(&info.password),
        name,
        email,
        telephone: info.telephone.trim().to_string(),
        is_client: roles.client,
        is_agent: roles.agent,
        is_seller: roles.seller,
        is_banned: false,
        created_at: now(),
    };

    let mut conn = get_db_conn(&pool)?;
    let username = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let res = users::table
                .filter(users::username.eq(&data.username))
                .count()
                .get_result::<i64>(conn)?;
            if res > 0 {
                return Err(ApiError::bad_request("Username is already taken"));
            }

            diesel::insert_into(users::table).values(&data).execute(conn)?;
            Ok(data.username)
        })
    })
    .await??;

    tracing::info!(%username, "user registered");
    Ok(SimpleResponse::ok_with("Registered"))
}

async fn login_impl(
    pool: web::Data<DbPool>,
    info: web::Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    use crate::schema::{user_logins, users};

    let info = info.into_inner();
    let mut conn = get_db_conn(&pool)?;
    let (user, login_token) = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let user = users::table
                .find(info.username.trim())
                .filter(users::password.eq(hash_password(&info.password)))
                .first::<UserData>(conn)
                .optional()?
                .ok_or_else(|| ApiError::unauthorized("Wrong username or password"))?;
            if user.is_banned {
                return Err(ApiError::forbidden("This account has been banned"));
            }

            let login_token = generate_login_token(&user.username, "user");
            let token_data = UserLoginData {
                token: login_token.clone(),
                username: user.username.clone(),
                login_time: now(),
            };
            diesel::insert_into(user_logins::table)
                .values(token_data)
                .execute(conn)?;

            Ok((user, login_token))
        })
    })
    .await??;

    tracing::debug!(username = %user.username, "user logged in");
    Ok(LoginResponse {
        success: true,
        message: "".to_string(),
        login_token,
        user: Some(user.into()),
    })
}

async fn logout_impl(pool: web::Data<DbPool>, token: BearerToken) -> ApiResult<SimpleResponse> {
    use crate::schema::user_logins;

    let mut conn = get_db_conn(&pool)?;
    let removed = web::block(move || {
        diesel::delete(user_logins::table.find(token.0)).execute(&mut conn)
    })
    .await??;

    if removed == 0 {
        return Err(ApiError::unauthorized("You are not logged in"));
    }
    Ok(SimpleResponse::ok())
}

async fn view_info_impl(_pool: web::Data<DbPool>, user: AuthUser) -> ApiResult<ViewInfoResponse> {
    Ok(ViewInfoResponse {
        success: true,
        message: "".to_string(),
        user: Some(user.into_inner().into()),
    })
}

async fn modify_info_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    info: web::Json<ModifyInfoRequest>,
) -> ApiResult<ViewInfoResponse> {
    use crate::schema::users;

    let info = info.into_inner();
    let data = UpdateUser {
        name: non_empty(info.name),
        email: non_empty(info.email),
        telephone: info.telephone.map(|t| t.trim().to_string()),
    };
    if let Some(email) = &data.email {
        check_email(email)?;
    }
    if data.name.is_none() && data.email.is_none() && data.telephone.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let username = user.into_inner().username;
    let mut conn = get_db_conn(&pool)?;
    let user = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            diesel::update(users::table.find(&username))
                .set(&data)
                .execute(conn)?;
            Ok(users::table.find(&username).first::<UserData>(conn)?)
        })
    })
    .await??;

    Ok(ViewInfoResponse {
        success: true,
        message: "Profile updated".to_string(),
        user: Some(user.into()),
    })
}

async fn modify_password_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    info: web::Json<ModifyPasswordRequest>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::{user_logins, users};

    let info = info.into_inner();
    check_password(&info.password_new)?;

    let user = user.into_inner();
    if user.password != hash_password(&info.password_old) {
        return Err(ApiError::bad_request("Wrong password"));
    }

    let mut conn = get_db_conn(&pool)?;
    let hashed_password_new = hash_password(&info.password_new);
    web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            diesel::update(users::table.find(&user.username))
                .set(users::password.eq(&hashed_password_new))
                .execute(conn)?;
            // Other sessions have to log in again.
            diesel::delete(user_logins::table.filter(user_logins::username.eq(&user.username)))
                .execute(conn)?;
            Ok(())
        })
    })
    .await??;

    Ok(SimpleResponse::ok_with("Password changed, please log in again"))
}

async fn modify_roles_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    info: web::Json<ModifyRolesRequest>,
) -> ApiResult<ViewInfoResponse> {
    use crate::schema::users;

    let roles = check_roles(&info.into_inner().roles)?;
    let username = user.into_inner().username;

    let mut conn = get_db_conn(&pool)?;
    let user = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            diesel::update(users::table.find(&username))
                .set(&roles)
                .execute(conn)?;
            Ok(users::table.find(&username).first::<UserData>(conn)?)
        })
    })
    .await??;

    tracing::info!(username = %user.username, roles = ?user.roles().to_list(), "roles changed");
    Ok(ViewInfoResponse {
        success: true,
        message: "Roles updated".to_string(),
        user: Some(user.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_ids() {
        assert!(check_account_id("alice_01").is_ok());
        assert!(check_account_id("").is_err());
        assert!(check_account_id("has space").is_err());
        assert!(check_account_id("dash-name").is_err());
        assert!(check_account_id(&"a".repeat(33)).is_err());
        assert!(check_account_id(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn passwords_and_emails() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
        assert!(check_email("a@b.com").is_ok());
        assert!(check_email("@b.com").is_err());
        assert!(check_email("ab.com").is_err());
        assert!(check_email("a@").is_err());
    }

    #[test]
    fn at_least_one_role() {
        assert!(matches!(check_roles(&[]), Err(ApiError::BadRequest(_))));
        let roles = check_roles(&[Role::Agent]).unwrap();
        assert!(roles.agent && !roles.client);
    }

    #[test]
    fn user_item_lists_roles() {
        let data = UserData {
            username: "sam".to_string(),
            password: hash_password("secret"),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            telephone: "".to_string(),
            is_client: true,
            is_agent: false,
            is_seller: true,
            is_banned: false,
            created_at: now(),
        };
        let item = UserItem::from(data);
        assert_eq!(item.roles, vec![Role::Client, Role::Seller]);
        assert_eq!(item.username, "sam");
    }
}
