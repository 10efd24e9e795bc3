use crate::schema::administrators;
use diesel::prelude::*;

#[derive(Queryable, Insertable)]
#[diesel(table_name = administrators)]
pub struct AdminData {
    pub aid: String,
    pub password: String,
}
