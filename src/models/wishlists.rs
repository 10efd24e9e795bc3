use crate::schema::wishlists;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Insertable)]
#[diesel(table_name = wishlists)]
pub struct WishlistEntry {
    pub username: String,
    pub pid: u64,
    pub created_at: NaiveDateTime,
}
