mod requests;
mod responses;

use crate::{
    auth::{AuthAdmin, BearerToken},
    database::{assert, get_db_conn},
    error::{ApiError, ApiResult},
    models::{admin_logins::AdminLoginData, administrators::AdminData, users::{Role, UserData}},
    protocol::SimpleResponse,
    user::{check_account_id, check_password, UserItem},
    utils::{generate_login_token, get_str_pattern, hash_password, non_empty, now, page},
    DbPool,
};
use actix_web::web;
use diesel::mysql::Mysql;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::query_dsl::LoadQuery;
use diesel::MysqlConnection;

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(search_user)
        .service(ban_user);
}

crate::api_funcs! {
    (register, post, "/register", [admin: Option<AuthAdmin>, info: web::Json<RegisterRequest>], SimpleResponse),
    (login, post, "/login", [info: web::Json<LoginRequest>], LoginResponse),
    (logout, post, "/logout", [token: BearerToken], SimpleResponse),
    (search_user, get, "/users", [admin: AuthAdmin, query: web::Query<SearchUserQuery>], SearchUserResponse),
    (ban_user, put, "/ban", [admin: AuthAdmin, info: web::Json<BanUserRequest>], SimpleResponse),
}

/// All admin ids, read `FOR UPDATE`. On an empty table this takes the
/// insert gap lock, so two first registrations cannot both pass.
fn locked_admin_ids(
) -> impl RunQueryDsl<MysqlConnection> + LoadQuery<'static, MysqlConnection, String> + QueryFragment<Mysql> {
    use crate::schema::administrators;

    administrators::table
        .select(administrators::aid)
        .for_update()
}

/// The first administrator may register freely; after that only an
/// administrator can add another.
async fn register_impl(
    pool: web::Data<DbPool>,
    admin: Option<AuthAdmin>,
    info: web::Json<RegisterRequest>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::administrators;

    let info = info.into_inner();
    let aid = info.aid.trim().to_string();
    check_account_id(&aid)?;
    check_password(&info.password)?;

    let authorized = admin.is_some();
    if !authorized && assert::count_admins(&pool).await? > 0 {
        return Err(ApiError::forbidden("Only an administrator can add administrators"));
    }

    let data = AdminData {
        aid,
        password: hash_password(&info.password),
    };
    let mut conn = get_db_conn(&pool)?;
    let aid = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let existing = locked_admin_ids().load::<String>(&mut **conn)?;
            if !existing.is_empty() && !authorized {
                return Err(ApiError::forbidden("Only an administrator can add administrators"));
            }
            let res = administrators::table
                .filter(administrators::aid.eq(&data.aid))
                .count()
                .get_result::<i64>(conn)?;
            if res > 0 {
                return Err(ApiError::bad_request("Administrator id is already taken"));
            }

            diesel::insert_into(administrators::table)
                .values(&data)
                .execute(conn)?;
            Ok(data.aid)
        })
    })
    .await??;

    tracing::info!(%aid, by = ?admin.map(|a| a.0), "administrator registered");
    Ok(SimpleResponse::ok_with("Registered"))
}

async fn login_impl(
    pool: web::Data<DbPool>,
    info: web::Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    use crate::schema::{admin_logins, administrators};

    let info = info.into_inner();
    let mut conn = get_db_conn(&pool)?;
    let login_token = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let res = administrators::table
                .filter(administrators::aid.eq(info.aid.trim()))
                .filter(administrators::password.eq(hash_password(&info.password)))
                .count()
                .get_result::<i64>(conn)?;
            if res != 1 {
                return Err(ApiError::unauthorized("Wrong id or password"));
            }

            let aid = info.aid.trim().to_string();
            let login_token = generate_login_token(&aid, "admin");
            let token_data = AdminLoginData {
                token: login_token.clone(),
                aid,
                login_time: now(),
            };
            diesel::insert_into(admin_logins::table)
                .values(token_data)
                .execute(conn)?;

            Ok(login_token)
        })
    })
    .await??;

    Ok(LoginResponse {
        success: true,
        message: "".to_string(),
        login_token,
    })
}

async fn logout_impl(pool: web::Data<DbPool>, token: BearerToken) -> ApiResult<SimpleResponse> {
    use crate::schema::admin_logins;

    let mut conn = get_db_conn(&pool)?;
    let removed = web::block(move || {
        diesel::delete(admin_logins::table.find(token.0)).execute(&mut conn)
    })
    .await??;

    if removed == 0 {
        return Err(ApiError::unauthorized("You are not logged in"));
    }
    Ok(SimpleResponse::ok())
}

async fn search_user_impl(
    pool: web::Data<DbPool>,
    _admin: AuthAdmin,
    query: web::Query<SearchUserQuery>,
) -> ApiResult<SearchUserResponse> {
    use crate::schema::users;

    let query = query.into_inner();
    let (first_index, limit) = page(query.first_index, query.limit);

    let mut conn = get_db_conn(&pool)?;
    let usrs = web::block(move || {
        let mut q = users::table.into_boxed();
        if let Some(keyword) = non_empty(query.keyword) {
            let pattern = get_str_pattern(keyword);
            q = q.filter(users::username.like(pattern.clone()).or(users::name.like(pattern)));
        }
        q = match query.role {
            Some(Role::Client) => q.filter(users::is_client.eq(true)),
            Some(Role::Agent) => q.filter(users::is_agent.eq(true)),
            Some(Role::Seller) => q.filter(users::is_seller.eq(true)),
            None => q,
        };
        if let Some(banned) = query.banned {
            q = q.filter(users::is_banned.eq(banned));
        }
        q.order(users::username.asc())
            .offset(first_index)
            .limit(limit)
            .load::<UserData>(&mut conn)
    })
    .await??;

    Ok(SearchUserResponse {
        success: true,
        message: "".to_string(),
        users: usrs.into_iter().map(UserItem::from).collect(),
    })
}

async fn ban_user_impl(
    pool: web::Data<DbPool>,
    admin: AuthAdmin,
    info: web::Json<BanUserRequest>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::{user_logins, users};

    let info = info.into_inner();
    let (username, banned) = (info.username, info.banned);

    let mut conn = get_db_conn(&pool)?;
    let username = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let data = assert::find_user_in(conn, &username)?;
            if data.is_banned && banned {
                return Err(ApiError::bad_request("User is already banned"));
            }
            if !data.is_banned && !banned {
                return Err(ApiError::bad_request("User is not banned"));
            }

            diesel::update(users::table.find(&username))
                .set(users::is_banned.eq(banned))
                .execute(conn)?;
            if banned {
                diesel::delete(user_logins::table.filter(user_logins::username.eq(&username)))
                    .execute(conn)?;
            }

            Ok(username)
        })
    })
    .await??;

    tracing::info!(%username, banned, by = %admin.0, "ban status changed");
    Ok(SimpleResponse::ok_with(if banned { "User banned" } else { "User unbanned" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_check_locks_the_admin_table() {
        let sql = diesel::debug_query::<Mysql, _>(&locked_admin_ids()).to_string();
        assert!(sql.contains("FROM `administrators`"));
        assert!(sql.contains("FOR UPDATE"));
    }
}
