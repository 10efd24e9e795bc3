use serde::Deserialize;

#[derive(Deserialize)]
pub struct ListNotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    /// Only notifications with a smaller id; pass the last `nid` of a page.
    pub before: Option<u64>,
    pub limit: Option<i64>,
}
