/// Generates actix handlers that wrap a `<name>_impl` function.
///
/// Each entry is `(name, method, url, [extractors], Response)`. The wrapper
/// takes the DB pool plus the listed extractors, forwards them to the impl,
/// and renders an `Err` as `Response::err` with the error's status code.
#[macro_export]
macro_rules! api_funcs {
    ( $( ( $func_name:ident, $method:ident, $url:literal, [ $( $arg:ident : $arg_ty:ty ),* $(,)? ], $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[actix_web::$method($url)]
                async fn $func_name(
                    pool: actix_web::web::Data<$crate::DbPool>,
                    $( $arg: $arg_ty ),*
                ) -> actix_web::HttpResponse {
                    match [<$func_name _impl>](pool, $( $arg ),*).await {
                        Ok(response) => actix_web::HttpResponse::Ok().json(response),
                        Err(err) => {
                            let status = actix_web::ResponseError::status_code(&err);
                            if status.is_server_error() {
                                tracing::error!(route = $url, error = %err, "request failed");
                            } else {
                                tracing::debug!(route = $url, error = %err, "request rejected");
                            }
                            actix_web::HttpResponse::build(status)
                                .json(<$response>::err(err.public_message()))
                        }
                    }
                }
            }
        )+
    };
}

use blake2::{Blake2b512, Digest};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_PAGE_LIMIT: i64 = 30;
pub const MAX_PAGE_LIMIT: i64 = 100;

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Blake2b512::digest(password.as_bytes()))
}

/// A fresh login token for `subject`. `role` keeps user and admin tokens apart.
pub fn generate_login_token(subject: &str, role: &str) -> String {
    let seed = format!("{}:{}:{}", role, subject, uuid::Uuid::new_v4());
    format!("{:x}", Blake2b512::digest(seed.as_bytes()))
}

pub fn parse_date_str(s: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("Wrong date format '{}', expected YYYY-MM-DD", s)))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time_str(s: &str) -> ApiResult<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ApiError::bad_request(format!("Wrong time format '{}', expected HH:MM", s)))
}

pub fn format_date_str(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time_str(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn format_datetime_str(time: &NaiveDateTime) -> String {
    const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    format!("{}+00:00", time.format(TIME_FMT))
}

pub fn get_str_pattern<S: AsRef<str>>(s: S) -> String {
    format!("%{}%", s.as_ref())
}

/// `(offset, limit)` from optional request values.
pub fn page(first_index: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let first_index = first_index.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(0, MAX_PAGE_LIMIT);
    (first_index, limit)
}

/// Trims and drops empty strings.
pub fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dates_and_times() {
        assert_eq!(
            parse_date_str("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(
            parse_time_str("10:00").unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_str(" 14:30:15 ").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 15).unwrap()
        );
        assert!(parse_date_str("01/06/2024").is_err());
        assert!(parse_time_str("25:00").is_err());
    }

    #[test]
    fn formats_round_to_minutes() {
        let time = NaiveTime::from_hms_opt(9, 5, 59).unwrap();
        assert_eq!(format_time_str(&time), "09:05");
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(format_date_str(&date), "2024-01-02");
    }

    #[test]
    fn tokens_are_unique_hex() {
        let a = generate_login_token("alice", "user");
        let b = generate_login_token("alice", "user");
        assert_ne!(a, b);
        assert_eq!(a.len(), 128);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn password_hash_is_stable() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("Secret"));
    }

    #[test]
    fn paging_is_clamped() {
        assert_eq!(page(None, None), (0, DEFAULT_PAGE_LIMIT));
        assert_eq!(page(Some(-3), Some(1000)), (0, MAX_PAGE_LIMIT));
        assert_eq!(page(Some(20), Some(5)), (20, 5));
    }

    #[test]
    fn blank_strings_are_dropped() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" Pune ".to_string())), Some("Pune".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
