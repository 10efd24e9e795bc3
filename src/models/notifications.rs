use crate::schema::notifications;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Clone, Debug)]
pub struct Notification {
    pub nid: u64,
    pub recipient_kind: String,
    pub recipient: String,
    pub kind: String,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Clone, Debug, PartialEq, Eq)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub recipient_kind: String,
    pub recipient: String,
    pub kind: String,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Users and administrators live in separate tables, so a recipient is
/// addressed by kind plus id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecipientKind {
    User,
    Admin,
}

impl RecipientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipientKind::User => "user",
            RecipientKind::Admin => "admin",
        }
    }
}
