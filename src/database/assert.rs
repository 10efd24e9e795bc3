//! Existence checks shared by the route modules.
//!
//! The `*_in` variants run on a connection that is already inside a
//! transaction; the async variants grab their own pooled connection.

use actix_web::web;
use diesel::prelude::*;
use diesel::MysqlConnection;

use crate::{
    database::get_db_conn,
    error::{ApiError, ApiResult},
    models::{properties::PropertyData, users::UserData},
    DbPool,
};

pub fn find_user_in(conn: &mut MysqlConnection, username: &str) -> ApiResult<UserData> {
    use crate::schema::users;

    users::table
        .find(username)
        .first::<UserData>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("No such user '{}'", username)))
}

pub fn find_property_in(conn: &mut MysqlConnection, pid: u64) -> ApiResult<PropertyData> {
    use crate::schema::properties;

    properties::table
        .find(pid)
        .first::<PropertyData>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("No such property"))
}

pub async fn assert_property(pool: &web::Data<DbPool>, pid: u64) -> ApiResult<()> {
    use crate::schema::properties;

    let mut conn = get_db_conn(pool)?;
    let res = web::block(move || {
        properties::table
            .filter(properties::pid.eq(pid))
            .count()
            .get_result::<i64>(&mut conn)
    })
    .await??;

    if res == 0 {
        return Err(ApiError::not_found("No such property"));
    }

    Ok(())
}

pub async fn count_admins(pool: &web::Data<DbPool>) -> ApiResult<i64> {
    use crate::schema::administrators;

    let mut conn = get_db_conn(pool)?;
    let res = web::block(move || {
        administrators::table
            .count()
            .get_result::<i64>(&mut conn)
    })
    .await??;

    Ok(res)
}
