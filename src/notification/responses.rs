use serde::Serialize;

use crate::{models::notifications::Notification, utils::format_datetime_str};

#[derive(Default, Serialize)]
pub struct NotificationItem {
    pub nid: u64,
    pub kind: String,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationItem {
    fn from(data: Notification) -> Self {
        Self {
            created_at: format_datetime_str(&data.created_at),
            nid: data.nid,
            kind: data.kind,
            message: data.message,
            link: data.link,
            read: data.is_read,
        }
    }
}

#[derive(Default, Serialize)]
pub struct ListNotificationResponse {
    pub success: bool,
    pub message: String,
    pub notifications: Vec<NotificationItem>,
    /// Cursor for the next page, absent on the last one.
    pub next_before: Option<u64>,
}

#[derive(Default, Serialize)]
pub struct CountResponse {
    pub success: bool,
    pub message: String,
    pub count: i64,
}

crate::impl_err_response! {
    ListNotificationResponse,
    CountResponse,
}
