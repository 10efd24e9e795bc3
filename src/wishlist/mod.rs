mod responses;

use crate::{
    auth::AuthUser,
    database::{assert, get_db_conn},
    error::{ApiError, ApiResult},
    models::{properties::PropertyData, wishlists::WishlistEntry},
    protocol::SimpleResponse,
    utils::{format_datetime_str, now},
    DbPool,
};
use actix_web::web;
use diesel::prelude::*;

use self::responses::*;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(view_wishlist)
        .service(add_wishlist)
        .service(remove_wishlist);
}

crate::api_funcs! {
    (view_wishlist, get, "", [user: AuthUser], WishlistResponse),
    (add_wishlist, post, "/{pid}", [user: AuthUser, pid: web::Path<u64>], SimpleResponse),
    (remove_wishlist, delete, "/{pid}", [user: AuthUser, pid: web::Path<u64>], SimpleResponse),
}

async fn view_wishlist_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
) -> ApiResult<WishlistResponse> {
    use crate::schema::{properties, wishlists};

    let username = user.into_inner().username;
    let mut conn = get_db_conn(&pool)?;
    let entries = web::block(move || {
        wishlists::table
            .inner_join(properties::table)
            .filter(wishlists::username.eq(username))
            .order(wishlists::created_at.desc())
            .load::<(WishlistEntry, PropertyData)>(&mut conn)
    })
    .await??;

    Ok(WishlistResponse {
        success: true,
        message: "".to_string(),
        items: entries
            .into_iter()
            .map(|(entry, property)| WishlistItem {
                added_at: format_datetime_str(&entry.created_at),
                property: property.into(),
            })
            .collect(),
    })
}

async fn add_wishlist_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    pid: web::Path<u64>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::wishlists;

    let pid = pid.into_inner();
    let username = user.into_inner().username;
    assert::assert_property(&pool, pid).await?;

    let mut conn = get_db_conn(&pool)?;
    let inserted = web::block(move || {
        let data = WishlistEntry {
            username,
            pid,
            created_at: now(),
        };
        diesel::insert_or_ignore_into(wishlists::table)
            .values(data)
            .execute(&mut conn)
    })
    .await??;

    if inserted == 0 {
        return Ok(SimpleResponse::ok_with("Already in wishlist"));
    }
    Ok(SimpleResponse::ok_with("Added to wishlist"))
}

async fn remove_wishlist_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    pid: web::Path<u64>,
) -> ApiResult<SimpleResponse> {
    use crate::schema::wishlists;

    let pid = pid.into_inner();
    let username = user.into_inner().username;
    let mut conn = get_db_conn(&pool)?;
    let removed = web::block(move || {
        diesel::delete(
            wishlists::table
                .filter(wishlists::username.eq(username))
                .filter(wishlists::pid.eq(pid)),
        )
        .execute(&mut conn)
    })
    .await??;

    if removed == 0 {
        return Err(ApiError::not_found("Property is not in your wishlist"));
    }
    Ok(SimpleResponse::ok_with("Removed from wishlist"))
}
