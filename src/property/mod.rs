mod recommend;
mod requests;
mod responses;

use crate::{
    auth::Actor,
    database::{assert, get_db_conn, last_insert_id},
    error::{ApiError, ApiResult},
    models::{
        properties::{NewProperty, PropertyData, UpdateProperty},
        users::Role,
    },
    utils::{get_str_pattern, non_empty, now, page},
    DbPool,
};
use actix_web::web;
use diesel::prelude::*;
use diesel::MysqlConnection;

use self::{recommend::Preferences, requests::*, responses::*};

pub use self::responses::PropertyItem;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(add_property)
        .service(search_property)
        .service(recommend_property)
        .service(view_property)
        .service(modify_property)
        .service(delete_property);
}

crate::api_funcs! {
    (add_property, post, "", [actor: Actor, info: web::Json<AddPropertyRequest>], PropertyResponse),
    (search_property, get, "", [query: web::Query<SearchPropertyQuery>], SearchPropertyResponse),
    (recommend_property, post, "/recommend", [info: web::Json<RecommendRequest>], RecommendResponse),
    (view_property, get, "/{pid}", [pid: web::Path<u64>], PropertyResponse),
    (modify_property, put, "/{pid}", [actor: Actor, pid: web::Path<u64>, info: web::Json<ModifyPropertyRequest>], PropertyResponse),
    (delete_property, delete, "/{pid}", [actor: Actor, pid: web::Path<u64>], PropertyResponse),
}

fn check_listing_numbers(price: i64, area_sqft: i32, bedrooms: i32, bathrooms: i32) -> ApiResult<()> {
    if price <= 0 {
        return Err(ApiError::bad_request("Price must be positive"));
    }
    if area_sqft <= 0 {
        return Err(ApiError::bad_request("Area must be positive"));
    }
    if bedrooms < 0 || bathrooms < 0 {
        return Err(ApiError::bad_request("Room counts cannot be negative"));
    }
    Ok(())
}

/// Ensures `username` exists and holds `role`.
fn check_role(conn: &mut MysqlConnection, username: &str, role: Role) -> ApiResult<()> {
    let user = assert::find_user_in(conn, username)?;
    if !user.roles().has(role) {
        return Err(ApiError::bad_request(format!(
            "User '{}' does not have the {:?} role",
            username, role
        )));
    }
    Ok(())
}

/// Admins manage every listing; users only the ones they sell or represent.
fn can_manage(actor: &Actor, property: &PropertyData) -> bool {
    match actor.username() {
        None => true,
        Some(username) => {
            property.seller.as_deref() == Some(username) || property.agent.as_deref() == Some(username)
        }
    }
}

/// Only the seller or an admin takes a listing off the market or back on.
fn can_withdraw(actor: &Actor, property: &PropertyData) -> bool {
    actor.is_admin() || property.seller.as_deref() == actor.username()
}

fn check_modify(actor: &Actor, current: &PropertyData, info: &ModifyPropertyRequest) -> ApiResult<()> {
    if !can_manage(actor, current) {
        return Err(ApiError::forbidden("Not allowed to modify this property"));
    }
    if info.is_available.is_some() && !can_withdraw(actor, current) {
        return Err(ApiError::forbidden(
            "Only the seller or an admin may change a listing's availability",
        ));
    }
    Ok(())
}

/// Resolves who sells and who represents a new listing.
fn listing_parties(
    actor: &Actor,
    seller: Option<String>,
    agent: Option<String>,
) -> ApiResult<(Option<String>, Option<String>)> {
    let (username, roles) = match actor {
        Actor::Admin { .. } if seller.is_none() => {
            return Err(ApiError::bad_request("A seller is required"))
        }
        Actor::Admin { .. } => return Ok((seller, agent)),
        Actor::User { username, roles } => (username, roles),
    };
    if !roles.manages_listings() {
        return Err(ApiError::forbidden("Only agents and sellers may list properties"));
    }

    let seller = seller.or_else(|| Some(username.clone()).filter(|_| roles.seller));
    let agent = agent.or_else(|| Some(username.clone()).filter(|_| roles.agent));
    if seller.as_ref() != Some(username) && agent.as_ref() != Some(username) {
        return Err(ApiError::forbidden("You must be the listing's agent or seller"));
    }
    Ok((seller, agent))
}

async fn add_property_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    info: web::Json<AddPropertyRequest>,
) -> ApiResult<PropertyResponse> {
    use crate::schema::properties;

    let info = info.into_inner();
    let title = non_empty(Some(info.title)).ok_or_else(|| ApiError::bad_request("Title is required"))?;
    let city = non_empty(Some(info.city)).ok_or_else(|| ApiError::bad_request("City is required"))?;
    check_listing_numbers(info.price, info.area_sqft, info.bedrooms, info.bathrooms)?;
    let (seller, agent) = listing_parties(&actor, non_empty(info.seller), non_empty(info.agent))?;

    let data = NewProperty {
        title,
        description: info.description,
        kind: info.kind.as_str().to_string(),
        purpose: info.purpose.as_str().to_string(),
        price: info.price,
        area_sqft: info.area_sqft,
        bedrooms: info.bedrooms,
        bathrooms: info.bathrooms,
        city,
        address: info.address.trim().to_string(),
        seller,
        agent,
        is_available: true,
        created_at: now(),
    };

    let mut conn = get_db_conn(&pool)?;
    let property = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            if let Some(seller) = &data.seller {
                check_role(conn, seller, Role::Seller)?;
            }
            if let Some(agent) = &data.agent {
                check_role(conn, agent, Role::Agent)?;
            }
            diesel::insert_into(properties::table)
                .values(&data)
                .execute(conn)?;
            let pid = diesel::select(last_insert_id()).get_result::<u64>(conn)?;
            Ok(properties::table.find(pid).first::<PropertyData>(conn)?)
        })
    })
    .await??;

    tracing::info!(property = property.pid, city = %property.city, "property listed");
    Ok(PropertyResponse {
        success: true,
        message: "Property listed".to_string(),
        property: Some(property.into()),
    })
}

async fn search_property_impl(
    pool: web::Data<DbPool>,
    query: web::Query<SearchPropertyQuery>,
) -> ApiResult<SearchPropertyResponse> {
    use crate::schema::properties;

    let query = query.into_inner();
    let (first_index, limit) = page(query.first_index, query.limit);

    let mut conn = get_db_conn(&pool)?;
    let props = web::block(move || {
        let mut q = properties::table
            .filter(properties::is_available.eq(true))
            .into_boxed();
        if let Some(city) = non_empty(query.city) {
            q = q.filter(properties::city.like(get_str_pattern(city)));
        }
        if let Some(kind) = query.kind {
            q = q.filter(properties::kind.eq(kind.as_str()));
        }
        if let Some(purpose) = query.purpose {
            q = q.filter(properties::purpose.eq(purpose.as_str()));
        }
        if let Some(min_price) = query.min_price {
            q = q.filter(properties::price.ge(min_price));
        }
        if let Some(max_price) = query.max_price {
            q = q.filter(properties::price.le(max_price));
        }
        if let Some(min_bedrooms) = query.min_bedrooms {
            q = q.filter(properties::bedrooms.ge(min_bedrooms));
        }
        q.order(properties::created_at.desc())
            .offset(first_index)
            .limit(limit)
            .load::<PropertyData>(&mut conn)
    })
    .await??;

    Ok(SearchPropertyResponse {
        success: true,
        message: "".to_string(),
        properties: props.into_iter().map(PropertyItem::from).collect(),
    })
}

async fn view_property_impl(
    pool: web::Data<DbPool>,
    pid: web::Path<u64>,
) -> ApiResult<PropertyResponse> {
    let pid = pid.into_inner();
    let mut conn = get_db_conn(&pool)?;
    let property = web::block(move || assert::find_property_in(&mut conn, pid)).await??;

    Ok(PropertyResponse {
        success: true,
        message: "".to_string(),
        property: Some(property.into()),
    })
}

async fn modify_property_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    pid: web::Path<u64>,
    info: web::Json<ModifyPropertyRequest>,
) -> ApiResult<PropertyResponse> {
    use crate::schema::properties;

    let pid = pid.into_inner();
    let info = info.into_inner();

    let mut conn = get_db_conn(&pool)?;
    let property = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let current = assert::find_property_in(conn, pid)?;
            check_modify(&actor, &current, &info)?;
            check_listing_numbers(
                info.price.unwrap_or(current.price),
                info.area_sqft.unwrap_or(current.area_sqft),
                info.bedrooms.unwrap_or(current.bedrooms),
                info.bathrooms.unwrap_or(current.bathrooms),
            )?;

            let agent = match info.agent {
                Some(agent) => match non_empty(Some(agent)) {
                    Some(agent) => {
                        check_role(conn, &agent, Role::Agent)?;
                        Some(Some(agent))
                    }
                    None => Some(None),
                },
                None => None,
            };
            let data = UpdateProperty {
                title: non_empty(info.title),
                description: info.description,
                kind: info.kind.map(|kind| kind.as_str().to_string()),
                purpose: info.purpose.map(|purpose| purpose.as_str().to_string()),
                price: info.price,
                area_sqft: info.area_sqft,
                bedrooms: info.bedrooms,
                bathrooms: info.bathrooms,
                city: non_empty(info.city),
                address: info.address,
                agent,
                is_available: info.is_available,
            };
            diesel::update(properties::table.find(pid))
                .set(&data)
                .execute(conn)
                .map_err(|err| match err {
                    diesel::result::Error::QueryBuilderError(_) => {
                        ApiError::bad_request("Nothing to update")
                    }
                    err => err.into(),
                })?;

            Ok(properties::table.find(pid).first::<PropertyData>(conn)?)
        })
    })
    .await??;

    tracing::info!(property = pid, "property modified");
    Ok(PropertyResponse {
        success: true,
        message: "Property updated".to_string(),
        property: Some(property.into()),
    })
}

async fn delete_property_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    pid: web::Path<u64>,
) -> ApiResult<PropertyResponse> {
    use crate::schema::properties;

    let pid = pid.into_inner();
    let mut conn = get_db_conn(&pool)?;
    web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let current = assert::find_property_in(conn, pid)?;
            if !can_withdraw(&actor, &current) {
                return Err(ApiError::forbidden("Only the seller or an admin may remove a listing"));
            }
            diesel::update(properties::table.find(pid))
                .set(properties::is_available.eq(false))
                .execute(conn)?;
            Ok(())
        })
    })
    .await??;

    tracing::info!(property = pid, "property withdrawn");
    Ok(PropertyResponse {
        success: true,
        message: "Property withdrawn".to_string(),
        property: None,
    })
}

async fn recommend_property_impl(
    pool: web::Data<DbPool>,
    info: web::Json<RecommendRequest>,
) -> ApiResult<RecommendResponse> {
    use crate::schema::properties;

    let info = info.into_inner();
    if info.price < 0 {
        return Err(ApiError::bad_request("Price cannot be negative"));
    }
    let limit = info.limit.unwrap_or(recommend::DEFAULT_LIMIT);
    let purpose = info.purpose;
    let prefs = Preferences {
        price: info.price,
        area_sqft: info.area_sqft,
        bedrooms: info.bedrooms,
        bathrooms: info.bathrooms,
        kind: info.kind,
        city: non_empty(info.city),
    };

    let mut conn = get_db_conn(&pool)?;
    let candidates = web::block(move || {
        let mut q = properties::table
            .filter(properties::is_available.eq(true))
            .into_boxed();
        if let Some(purpose) = purpose {
            q = q.filter(properties::purpose.eq(purpose.as_str()));
        }
        q.load::<PropertyData>(&mut conn)
    })
    .await??;

    let recommendations = recommend::rank(&prefs, &candidates, limit)
        .into_iter()
        .map(|scored| RecommendItem {
            property: scored.property.clone().into(),
            distance: scored.distance,
            score: 1.0 / (1.0 + scored.distance),
        })
        .collect::<Vec<_>>();

    tracing::debug!(candidates = candidates.len(), returned = recommendations.len(), "recommendation ranked");
    Ok(RecommendResponse {
        success: true,
        message: "".to_string(),
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Roles;

    fn user(name: &str, roles: &[Role]) -> Actor {
        Actor::User {
            username: name.to_string(),
            roles: Roles::from_list(roles),
        }
    }

    #[test]
    fn seller_lists_their_own_property() {
        let actor = user("sam", &[Role::Seller]);
        let (seller, agent) = listing_parties(&actor, None, Some("alex".to_string())).unwrap();
        assert_eq!(seller.as_deref(), Some("sam"));
        assert_eq!(agent.as_deref(), Some("alex"));
    }

    #[test]
    fn agent_lists_on_behalf_of_a_seller() {
        let actor = user("alex", &[Role::Agent]);
        let (seller, agent) = listing_parties(&actor, Some("sam".to_string()), None).unwrap();
        assert_eq!(seller.as_deref(), Some("sam"));
        assert_eq!(agent.as_deref(), Some("alex"));
    }

    #[test]
    fn clients_cannot_list() {
        let actor = user("carol", &[Role::Client]);
        assert!(matches!(
            listing_parties(&actor, None, None),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn listing_must_involve_the_creator() {
        let actor = user("alex", &[Role::Agent]);
        assert!(matches!(
            listing_parties(&actor, Some("sam".to_string()), Some("bob".to_string())),
            Err(ApiError::Forbidden(_))
        ));
    }

    fn admin() -> Actor {
        Actor::Admin {
            aid: "root".to_string(),
        }
    }

    #[test]
    fn admins_assign_freely() {
        let (seller, agent) = listing_parties(&admin(), Some("sam".to_string()), None).unwrap();
        assert_eq!(seller.as_deref(), Some("sam"));
        assert_eq!(agent, None);
    }

    #[test]
    fn admin_listing_needs_a_seller() {
        assert!(matches!(
            listing_parties(&admin(), None, Some("alex".to_string())),
            Err(ApiError::BadRequest(_))
        ));
    }

    fn listing() -> PropertyData {
        PropertyData {
            pid: 1,
            title: "Lake View 2BHK".to_string(),
            description: "".to_string(),
            kind: "apartment".to_string(),
            purpose: "sale".to_string(),
            price: 5_000_000,
            area_sqft: 900,
            bedrooms: 2,
            bathrooms: 2,
            city: "Pune".to_string(),
            address: "".to_string(),
            seller: Some("sam".to_string()),
            agent: Some("alex".to_string()),
            is_available: true,
            created_at: crate::utils::now(),
        }
    }

    #[test]
    fn agent_edits_but_cannot_change_availability() {
        let agent = user("alex", &[Role::Agent]);
        let edit = ModifyPropertyRequest {
            price: Some(4_900_000),
            ..Default::default()
        };
        assert!(check_modify(&agent, &listing(), &edit).is_ok());

        for available in [false, true] {
            let toggle = ModifyPropertyRequest {
                is_available: Some(available),
                ..Default::default()
            };
            assert!(matches!(
                check_modify(&agent, &listing(), &toggle),
                Err(ApiError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn seller_and_admin_change_availability() {
        let toggle = ModifyPropertyRequest {
            is_available: Some(false),
            ..Default::default()
        };
        assert!(check_modify(&user("sam", &[Role::Seller]), &listing(), &toggle).is_ok());
        assert!(check_modify(&admin(), &listing(), &toggle).is_ok());
        assert!(can_withdraw(&admin(), &listing()));
        assert!(!can_withdraw(&user("alex", &[Role::Agent]), &listing()));
    }

    #[test]
    fn strangers_cannot_modify() {
        let edit = ModifyPropertyRequest {
            title: Some("Mine now".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            check_modify(&user("carol", &[Role::Seller]), &listing(), &edit),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn unsold_listing_is_not_withdrawable_by_users() {
        let mut property = listing();
        property.seller = None;
        assert!(!can_withdraw(&user("alex", &[Role::Agent]), &property));
    }

    #[test]
    fn listing_numbers() {
        assert!(check_listing_numbers(1, 1, 0, 0).is_ok());
        assert!(check_listing_numbers(0, 100, 1, 1).is_err());
        assert!(check_listing_numbers(10, 0, 1, 1).is_err());
        assert!(check_listing_numbers(10, 100, -1, 1).is_err());
    }
}
