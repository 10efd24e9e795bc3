//! The caller's own notification feed. Users and administrators each read
//! only the rows addressed to them.

mod requests;
mod responses;

use crate::{
    auth::Actor,
    database::get_db_conn,
    error::{ApiError, ApiResult},
    models::notifications::Notification,
    protocol::SimpleResponse,
    utils::page,
    DbPool,
};
use actix_web::web;
use diesel::prelude::*;

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(list_notifications)
        .service(unread_count)
        .service(read_all)
        .service(mark_read);
}

crate::api_funcs! {
    (list_notifications, get, "", [actor: Actor, query: web::Query<ListNotificationQuery>], ListNotificationResponse),
    (unread_count, get, "/unread-count", [actor: Actor], CountResponse),
    (read_all, put, "/read-all", [actor: Actor], CountResponse),
    (mark_read, put, "/{nid}/read", [actor: Actor, nid: web::Path<u64>], SimpleResponse),
}

/// `Some(last nid)` when the page came back full.
fn next_cursor(items: &[NotificationItem], limit: i64) -> Option<u64> {
    if limit > 0 && items.len() as i64 == limit {
        items.last().map(|item| item.nid)
    } else {
        None
    }
}

async fn list_notifications_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    query: web::Query<ListNotificationQuery>,
) -> ApiResult<ListNotificationResponse> {
    use crate::schema::notifications;

    let query = query.into_inner();
    let (_, limit) = page(None, query.limit);
    let (kind, recipient) = actor.recipient();
    let (kind, recipient) = (kind.as_str(), recipient.to_string());

    let mut conn = get_db_conn(&pool)?;
    let rows = web::block(move || {
        let mut q = notifications::table
            .filter(notifications::recipient_kind.eq(kind))
            .filter(notifications::recipient.eq(recipient))
            .into_boxed();
        if query.unread_only {
            q = q.filter(notifications::is_read.eq(false));
        }
        if let Some(before) = query.before {
            q = q.filter(notifications::nid.lt(before));
        }
        q.order(notifications::nid.desc())
            .limit(limit)
            .load::<Notification>(&mut conn)
    })
    .await??;

    let notifications: Vec<NotificationItem> = rows.into_iter().map(NotificationItem::from).collect();
    Ok(ListNotificationResponse {
        success: true,
        message: "".to_string(),
        next_before: next_cursor(&notifications, limit),
        notifications,
    })
}

async fn unread_count_impl(pool: web::Data<DbPool>, actor: Actor) -> ApiResult<CountResponse> {
    use crate::schema::notifications;

    let (kind, recipient) = actor.recipient();
    let (kind, recipient) = (kind.as_str(), recipient.to_string());
    let mut conn = get_db_conn(&pool)?;
    let count = web::block(move || {
        notifications::table
            .filter(notifications::recipient_kind.eq(kind))
            .filter(notifications::recipient.eq(recipient))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result::<i64>(&mut conn)
    })
    .await??;

    Ok(CountResponse {
        success: true,
        message: "".to_string(),
        count,
    })
}

async fn read_all_impl(pool: web::Data<DbPool>, actor: Actor) -> ApiResult<CountResponse> {
    use crate::schema::notifications;

    let (kind, recipient) = actor.recipient();
    let (kind, recipient) = (kind.as_str(), recipient.to_string());
    let mut conn = get_db_conn(&pool)?;
    let updated = web::block(move || {
        diesel::update(
            notifications::table
                .filter(notifications::recipient_kind.eq(kind))
                .filter(notifications::recipient.eq(recipient))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
    })
    .await??;

    Ok(CountResponse {
        success: true,
        message: format!("Marked {} notification(s) as read", updated),
        count: updated as i64,
    })
}

async fn mark_read_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    nid: web::Path<u64>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::notifications;

    let nid = nid.into_inner();
    let (kind, recipient) = actor.recipient();
    let (kind, recipient) = (kind.as_str(), recipient.to_string());
    let mut conn = get_db_conn(&pool)?;
    let found = web::block(move || {
        // Someone else's notification reads as missing.
        let owned = notifications::table
            .find(nid)
            .filter(notifications::recipient_kind.eq(kind))
            .filter(notifications::recipient.eq(recipient));
        let found = diesel::select(diesel::dsl::exists(owned)).get_result::<bool>(&mut conn)?;
        if found {
            diesel::update(notifications::table.find(nid))
                .set(notifications::is_read.eq(true))
                .execute(&mut conn)?;
        }
        Ok::<_, ApiError>(found)
    })
    .await??;

    if !found {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(SimpleResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(nid: u64) -> NotificationItem {
        NotificationItem {
            nid,
            ..Default::default()
        }
    }

    #[test]
    fn cursor_only_on_full_pages() {
        let full = vec![item(9), item(7), item(4)];
        assert_eq!(next_cursor(&full, 3), Some(4));
        assert_eq!(next_cursor(&full, 5), None);
        assert_eq!(next_cursor(&[], 0), None);
    }
}
