pub mod assert;

use crate::{error::ApiResult, DbPool};
use actix_web::web;
use diesel::{r2d2::ConnectionManager, MysqlConnection};
use r2d2::PooledConnection;

pub type DbConn = PooledConnection<ConnectionManager<MysqlConnection>>;

pub fn get_db_conn(pool: &web::Data<DbPool>) -> ApiResult<DbConn> {
    Ok(pool.get()?)
}

diesel::define_sql_function! {
    /// Id generated by the last `INSERT` on this connection.
    fn last_insert_id() -> diesel::sql_types::Unsigned<diesel::sql_types::BigInt>;
}
