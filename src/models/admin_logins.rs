use crate::schema::admin_logins;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Insertable)]
#[diesel(table_name = admin_logins)]
pub struct AdminLoginData {
    pub token: String,
    pub aid: String,
    pub login_time: NaiveDateTime,
}
