//! Bearer-token authentication.
//!
//! Login endpoints hand out opaque tokens stored in `user_logins` /
//! `admin_logins`. The extractors here resolve the `Authorization: Bearer`
//! header back to an account:
//!
//! - [`AuthUser`]: a non-banned user account, with its full row.
//! - [`AuthAdmin`]: an administrator id.
//! - [`Actor`]: either of the two, for routes both may call.

use std::{future::Future, pin::Pin};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::MysqlConnection;

use crate::{
    config::Settings,
    error::{ApiError, ApiResult},
    models::{
        admin_logins::AdminLoginData,
        notifications::RecipientKind,
        user_logins::UserLoginData,
        users::{Roles, UserData},
    },
    DbPool,
};

type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// The raw token from the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    fn parse(req: &HttpRequest) -> ApiResult<Self> {
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("Malformed authorization header"))?;

        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Malformed authorization header"))?;

        Ok(Self(token.to_string()))
    }
}

impl FromRequest for BearerToken {
    type Error = ApiError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        std::future::ready(Self::parse(req))
    }
}

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User { username: String, roles: Roles },
    Admin { aid: String },
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    /// Username for user actors, `None` for admins.
    pub fn username(&self) -> Option<&str> {
        match self {
            Actor::User { username, .. } => Some(username),
            Actor::Admin { .. } => None,
        }
    }

    /// Address of this actor's own notification feed.
    pub fn recipient(&self) -> (RecipientKind, &str) {
        match self {
            Actor::User { username, .. } => (RecipientKind::User, username),
            Actor::Admin { aid } => (RecipientKind::Admin, aid),
        }
    }
}

impl From<UserData> for Actor {
    fn from(user: UserData) -> Self {
        Actor::User {
            roles: user.roles(),
            username: user.username,
        }
    }
}

pub struct AuthUser(pub UserData);

impl AuthUser {
    pub fn into_inner(self) -> UserData {
        self.0
    }
}

pub struct AuthAdmin(pub String);

struct AuthContext {
    pool: web::Data<DbPool>,
    ttl_secs: i64,
    token: String,
}

impl AuthContext {
    fn from_request(req: &HttpRequest) -> ApiResult<Self> {
        let token = BearerToken::parse(req)?.0;
        let pool = req
            .app_data::<web::Data<DbPool>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("DB pool missing from app data".to_string()))?;
        let ttl_secs = req
            .app_data::<web::Data<Settings>>()
            .map(|settings| settings.login_ttl_secs)
            .ok_or_else(|| ApiError::Internal("Settings missing from app data".to_string()))?;

        Ok(Self {
            pool,
            ttl_secs,
            token,
        })
    }

    async fn user(self) -> ApiResult<Option<UserData>> {
        let mut conn = self.pool.get()?;
        let (token, ttl) = (self.token, self.ttl_secs);
        web::block(move || user_for_token(&mut conn, &token, ttl)).await?
    }

    async fn admin(self) -> ApiResult<Option<String>> {
        let mut conn = self.pool.get()?;
        let (token, ttl) = (self.token, self.ttl_secs);
        web::block(move || admin_for_token(&mut conn, &token, ttl)).await?
    }

    async fn actor(self) -> ApiResult<Option<Actor>> {
        let mut conn = self.pool.get()?;
        let (token, ttl) = (self.token, self.ttl_secs);
        web::block(move || {
            if let Some(user) = user_for_token(&mut conn, &token, ttl)? {
                return Ok(Some(Actor::from(user)));
            }
            Ok(admin_for_token(&mut conn, &token, ttl)?.map(|aid| Actor::Admin { aid }))
        })
        .await?
    }
}

fn not_logged_in() -> ApiError {
    ApiError::unauthorized("You are not logged in")
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let ctx = AuthContext::from_request(req);
        Box::pin(async move { ctx?.user().await?.map(AuthUser).ok_or_else(not_logged_in) })
    }
}

impl FromRequest for AuthAdmin {
    type Error = ApiError;
    type Future = LocalBoxFuture<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let ctx = AuthContext::from_request(req);
        Box::pin(async move { ctx?.admin().await?.map(AuthAdmin).ok_or_else(not_logged_in) })
    }
}

impl FromRequest for Actor {
    type Error = ApiError;
    type Future = LocalBoxFuture<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let ctx = AuthContext::from_request(req);
        Box::pin(async move { ctx?.actor().await?.ok_or_else(not_logged_in) })
    }
}

pub fn is_expired(login_time: NaiveDateTime, now: NaiveDateTime, ttl_secs: i64) -> bool {
    now.signed_duration_since(login_time).num_seconds() > ttl_secs
}

fn user_for_token(
    conn: &mut MysqlConnection,
    token: &str,
    ttl_secs: i64,
) -> ApiResult<Option<UserData>> {
    use crate::schema::{user_logins, users};

    let login = user_logins::table
        .find(token)
        .first::<UserLoginData>(conn)
        .optional()?;
    let login = match login {
        Some(login) => login,
        None => return Ok(None),
    };
    if is_expired(login.login_time, crate::utils::now(), ttl_secs) {
        return Err(ApiError::unauthorized("Login has expired"));
    }

    let user = users::table.find(&login.username).first::<UserData>(conn)?;
    if user.is_banned {
        return Err(ApiError::forbidden("This account has been banned"));
    }

    Ok(Some(user))
}

fn admin_for_token(
    conn: &mut MysqlConnection,
    token: &str,
    ttl_secs: i64,
) -> ApiResult<Option<String>> {
    use crate::schema::admin_logins;

    let login = admin_logins::table
        .find(token)
        .first::<AdminLoginData>(conn)
        .optional()?;
    match login {
        Some(login) if is_expired(login.login_time, crate::utils::now(), ttl_secs) => {
            Err(ApiError::unauthorized("Login has expired"))
        }
        Some(login) => Ok(Some(login.aid)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Duration;

    #[test]
    fn bearer_header_is_parsed() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(BearerToken::parse(&req).unwrap(), BearerToken("abc123".to_string()));
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(BearerToken::parse(&req), Err(ApiError::Unauthorized(_))));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert!(matches!(BearerToken::parse(&req), Err(ApiError::Unauthorized(_))));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer   "))
            .to_http_request();
        assert!(matches!(BearerToken::parse(&req), Err(ApiError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn extractor_rejects_without_header() {
        let (req, mut payload) = TestRequest::default().to_http_parts();
        let res = BearerToken::from_request(&req, &mut payload).await;
        assert!(res.is_err());
    }

    #[test]
    fn login_expiry() {
        let login = crate::utils::now();
        assert!(!is_expired(login, login + Duration::seconds(3600), 3600));
        assert!(is_expired(login, login + Duration::seconds(3601), 3600));
    }

    #[test]
    fn actor_recipient() {
        let admin = Actor::Admin {
            aid: "root".to_string(),
        };
        assert!(admin.is_admin());
        assert_eq!(admin.username(), None);
        assert_eq!(admin.recipient(), (RecipientKind::Admin, "root"));

        let user = Actor::User {
            username: "alice".to_string(),
            roles: Roles::default(),
        };
        assert_eq!(user.username(), Some("alice"));
        assert_eq!(user.recipient(), (RecipientKind::User, "alice"));
    }
}
