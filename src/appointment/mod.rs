mod lifecycle;
mod notify;
mod requests;
mod responses;

use crate::{
    auth::{Actor, AuthUser},
    database::{get_db_conn, last_insert_id},
    error::{ApiError, ApiResult},
    models::{
        appointments::{Appointment, AppointmentStatus, NewAppointment, UpdateAppointment},
        properties::PropertyData,
    },
    utils::{non_empty, now, page, parse_date_str, parse_time_str},
    DbPool,
};
use actix_web::web;
use chrono::{NaiveDate, NaiveTime, Utc};
use diesel::mysql::Mysql;
use diesel::prelude::*;
use diesel::MysqlConnection;

use self::{
    lifecycle::Participants,
    notify::{AppointmentContext, AppointmentEvent},
    requests::*,
    responses::*,
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(schedule)
        .service(user_appoints)
        .service(update_status)
        .service(update_details)
        .service(cancel)
        .service(all_appoints)
        .service(feedback);
}

crate::api_funcs! {
    (schedule, post, "/schedule", [user: AuthUser, info: web::Json<ScheduleRequest>], AppointResponse),
    (user_appoints, get, "/user", [user: AuthUser, query: web::Query<SearchAppointQuery>], SearchAppointResponse),
    (update_status, put, "/status", [actor: Actor, info: web::Json<UpdateStatusRequest>], AppointResponse),
    (update_details, put, "/update-details", [actor: Actor, info: web::Json<UpdateDetailsRequest>], AppointResponse),
    (cancel, put, "/cancel/{id}", [actor: Actor, id: web::Path<u64>, info: Option<web::Json<CancelRequest>>], AppointResponse),
    (all_appoints, get, "/all", [actor: Actor, query: web::Query<SearchAppointQuery>], SearchAppointResponse),
    (feedback, put, "/feedback/{id}", [user: AuthUser, id: web::Path<u64>, info: web::Json<FeedbackRequest>], AppointResponse),
}

/// Loads an appointment with its property, locking both rows until the
/// surrounding transaction ends.
fn load_locked(conn: &mut MysqlConnection, id: u64) -> ApiResult<(Appointment, PropertyData)> {
    use crate::schema::{appointments, properties};

    appointments::table
        .inner_join(properties::table)
        .filter(appointments::id.eq(id))
        .for_update()
        .first::<(Appointment, PropertyData)>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("No such appointment"))
}

/// Non-cancelled appointments on `pid` at `date`/`time`, other than `except`.
fn slot_query(
    pid: u64,
    date: NaiveDate,
    time: NaiveTime,
    except: Option<u64>,
) -> crate::schema::appointments::BoxedQuery<'static, Mysql> {
    use crate::schema::appointments;

    let mut query = appointments::table
        .filter(appointments::pid.eq(pid))
        .filter(appointments::date.eq(date))
        .filter(appointments::time.eq(time))
        .filter(appointments::status.ne(AppointmentStatus::Cancelled.as_str()))
        .into_boxed();
    if let Some(id) = except {
        query = query.filter(appointments::id.ne(id));
    }
    query
}

/// Whether a non-cancelled appointment already holds the slot.
fn slot_taken(
    conn: &mut MysqlConnection,
    pid: u64,
    date: NaiveDate,
    time: NaiveTime,
    except: Option<u64>,
) -> QueryResult<bool> {
    let res = slot_query(pid, date, time, except)
        .count()
        .get_result::<i64>(conn)?;
    Ok(res > 0)
}

/// The fields of `info` that differ from the stored appointment.
fn detail_changes(
    appo: &Appointment,
    date: NaiveDate,
    time: NaiveTime,
    info: UpdateDetailsRequest,
) -> ApiResult<UpdateAppointment> {
    let mut changes = UpdateAppointment {
        date: Some(date).filter(|d| *d != appo.date),
        time: Some(time).filter(|t| *t != appo.time),
        ..Default::default()
    };
    if info.visit_type.is_some() || info.vr_city.is_some() {
        let visit_type = match info.visit_type {
            Some(visit_type) => visit_type,
            None => appo.visit_type()?,
        };
        let city = info.vr_city.as_deref().or(appo.vr_city.as_deref());
        let vr_city = lifecycle::validate_visit(visit_type, city)?;
        if visit_type.as_str() != appo.visit_type {
            changes.visit_type = Some(visit_type.as_str().to_string());
        }
        if vr_city != appo.vr_city {
            changes.vr_city = Some(vr_city);
        }
    }
    changes.meeting_platform =
        non_empty(info.meeting_platform).filter(|p| appo.meeting_platform.as_ref() != Some(p));
    changes.meeting_link =
        non_empty(info.meeting_link).filter(|l| appo.meeting_link.as_ref() != Some(l));
    changes.notes = info.notes.filter(|n| appo.notes.as_ref() != Some(n));
    Ok(changes)
}

fn reload(conn: &mut MysqlConnection, id: u64) -> QueryResult<Appointment> {
    use crate::schema::appointments;

    appointments::table.find(id).first::<Appointment>(conn)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn schedule_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    info: web::Json<ScheduleRequest>,
) -> ApiResult<AppointResponse> {
    use crate::schema::{appointments, properties};

    let info = info.into_inner();
    let username = user.into_inner().username;
    let date = lifecycle::validate_date(parse_date_str(&info.date)?, today())?;
    let time = parse_time_str(&info.time)?;
    let vr_city = lifecycle::validate_visit(info.visit_type, info.vr_city.as_deref())?;
    let pid = info.property_id;

    let mut conn = get_db_conn(&pool)?;
    let (appo, property, sent) = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            // serialises scheduling per property
            let property = properties::table
                .find(pid)
                .for_update()
                .first::<PropertyData>(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("No such property"))?;
            if !property.is_available {
                return Err(ApiError::bad_request("Property is no longer available"));
            }
            if slot_taken(conn, pid, date, time, None)? {
                return Err(ApiError::bad_request("This slot is already booked"));
            }

            let data = NewAppointment {
                pid,
                username,
                date,
                time,
                status: AppointmentStatus::Pending.as_str().to_string(),
                visit_type: info.visit_type.as_str().to_string(),
                vr_city,
                notes: non_empty(info.notes),
                created_at: now(),
                updated_at: now(),
            };
            diesel::insert_into(appointments::table)
                .values(data)
                .execute(conn)?;
            let id = diesel::select(last_insert_id()).get_result::<u64>(conn)?;

            let appo = reload(conn, id)?;
            let sent = notify::deliver(
                conn,
                &AppointmentEvent::Scheduled,
                &AppointmentContext::new(&appo, &property),
            )?;
            Ok((appo, property, sent))
        })
    })
    .await??;

    tracing::info!(
        appointment = appo.id,
        property = property.pid,
        user = %appo.username,
        notified = sent,
        "appointment scheduled"
    );
    Ok(AppointResponse::ok(
        "Appointment scheduled",
        AppointItem::new(appo, property),
    ))
}

async fn user_appoints_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    query: web::Query<SearchAppointQuery>,
) -> ApiResult<SearchAppointResponse> {
    use crate::schema::{appointments, properties};

    let query = query.into_inner();
    let username = user.into_inner().username;
    let (first_index, limit) = page(query.first_index, query.limit);

    let mut conn = get_db_conn(&pool)?;
    let appos = web::block(move || {
        let mut q = appointments::table
            .inner_join(properties::table)
            .filter(appointments::username.eq(username))
            .into_boxed();
        if let Some(status) = query.status {
            q = q.filter(appointments::status.eq(status.as_str()));
        }
        q.order((appointments::date.desc(), appointments::time.desc()))
            .offset(first_index)
            .limit(limit)
            .load::<(Appointment, PropertyData)>(&mut conn)
    })
    .await??;

    Ok(SearchAppointResponse {
        success: true,
        message: "".to_string(),
        appointments: appos
            .into_iter()
            .map(|(appo, property)| AppointItem::new(appo, property))
            .collect(),
    })
}

async fn update_status_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    info: web::Json<UpdateStatusRequest>,
) -> ApiResult<AppointResponse> {
    use crate::schema::appointments;

    let info = info.into_inner();
    let (id, status) = (info.appointment_id, info.status);

    let mut conn = get_db_conn(&pool)?;
    let (appo, property, from, sent) = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let (appo, property) = load_locked(conn, id)?;
            let from = appo.status()?;
            lifecycle::authorize_status_change(
                &actor,
                &Participants::of(&appo, &property),
                from,
                status,
            )?;

            diesel::update(appointments::table.find(id))
                .set((
                    appointments::status.eq(status.as_str()),
                    appointments::updated_at.eq(now()),
                ))
                .execute(conn)?;

            let appo = reload(conn, id)?;
            let sent = notify::deliver(
                conn,
                &AppointmentEvent::StatusChanged(status),
                &AppointmentContext::new(&appo, &property),
            )?;
            Ok((appo, property, from, sent))
        })
    })
    .await??;

    tracing::info!(appointment = id, %from, to = %status, notified = sent, "appointment status changed");
    Ok(AppointResponse::ok(
        format!("Appointment {}", status),
        AppointItem::new(appo, property),
    ))
}

async fn update_details_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    info: web::Json<UpdateDetailsRequest>,
) -> ApiResult<AppointResponse> {
    use crate::schema::appointments;

    let info = info.into_inner();
    let id = info.appointment_id;
    let touches_meeting = info.touches_meeting();
    let new_date = match info.date.as_deref() {
        Some(date) => Some(lifecycle::validate_date(parse_date_str(date)?, today())?),
        None => None,
    };
    let new_time = info.time.as_deref().map(parse_time_str).transpose()?;

    let mut conn = get_db_conn(&pool)?;
    let (appo, property, sent) = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let (appo, property) = load_locked(conn, id)?;
            lifecycle::authorize_update(
                &actor,
                &Participants::of(&appo, &property),
                appo.status()?,
                touches_meeting,
            )?;

            let date = new_date.unwrap_or(appo.date);
            let time = new_time.unwrap_or(appo.time);
            let changes = detail_changes(&appo, date, time, info)?;
            if changes.is_empty() {
                return Err(ApiError::bad_request("Nothing to update"));
            }
            if (changes.date.is_some() || changes.time.is_some())
                && slot_taken(conn, appo.pid, date, time, Some(id))?
            {
                return Err(ApiError::bad_request("This slot is already booked"));
            }

            diesel::update(appointments::table.find(id))
                .set((&changes, appointments::updated_at.eq(now())))
                .execute(conn)?;

            let appo = reload(conn, id)?;
            let sent = notify::deliver(
                conn,
                &AppointmentEvent::DetailsUpdated,
                &AppointmentContext::new(&appo, &property),
            )?;
            Ok((appo, property, sent))
        })
    })
    .await??;

    tracing::info!(appointment = id, notified = sent, "appointment details updated");
    Ok(AppointResponse::ok(
        "Appointment updated",
        AppointItem::new(appo, property),
    ))
}

async fn cancel_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    id: web::Path<u64>,
    info: Option<web::Json<CancelRequest>>,
) -> ApiResult<AppointResponse> {
    use crate::schema::appointments;

    let id = id.into_inner();
    let reason = info.and_then(|info| non_empty(info.into_inner().reason));

    let mut conn = get_db_conn(&pool)?;
    let (appo, property, sent) = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let (appo, property) = load_locked(conn, id)?;
            lifecycle::authorize_cancel(
                &actor,
                &Participants::of(&appo, &property),
                appo.status()?,
            )?;

            diesel::update(appointments::table.find(id))
                .set((
                    appointments::status.eq(AppointmentStatus::Cancelled.as_str()),
                    appointments::cancel_reason.eq(reason.clone()),
                    appointments::updated_at.eq(now()),
                ))
                .execute(conn)?;

            let appo = reload(conn, id)?;
            let sent = notify::deliver(
                conn,
                &AppointmentEvent::Cancelled { reason },
                &AppointmentContext::new(&appo, &property),
            )?;
            Ok((appo, property, sent))
        })
    })
    .await??;

    tracing::info!(appointment = id, notified = sent, "appointment cancelled");
    Ok(AppointResponse::ok(
        "Appointment cancelled",
        AppointItem::new(appo, property),
    ))
}

async fn all_appoints_impl(
    pool: web::Data<DbPool>,
    actor: Actor,
    query: web::Query<SearchAppointQuery>,
) -> ApiResult<SearchAppointResponse> {
    use crate::schema::{appointments, properties};

    // admins see everything, agents and sellers see their own listings
    let manager = match actor {
        Actor::Admin { .. } => None,
        Actor::User { username, roles } if roles.manages_listings() => Some(username),
        Actor::User { .. } => {
            return Err(ApiError::forbidden(
                "Only admins, agents and sellers may list appointments",
            ))
        }
    };
    let query = query.into_inner();
    let (first_index, limit) = page(query.first_index, query.limit);

    let mut conn = get_db_conn(&pool)?;
    let appos = web::block(move || {
        let mut q = appointments::table
            .inner_join(properties::table)
            .into_boxed();
        if let Some(username) = manager {
            q = q.filter(
                properties::agent
                    .eq(username.clone())
                    .or(properties::seller.eq(username)),
            );
        }
        if let Some(status) = query.status {
            q = q.filter(appointments::status.eq(status.as_str()));
        }
        q.order((appointments::date.desc(), appointments::time.desc()))
            .offset(first_index)
            .limit(limit)
            .load::<(Appointment, PropertyData)>(&mut conn)
    })
    .await??;

    Ok(SearchAppointResponse {
        success: true,
        message: "".to_string(),
        appointments: appos
            .into_iter()
            .map(|(appo, property)| AppointItem::new(appo, property))
            .collect(),
    })
}

async fn feedback_impl(
    pool: web::Data<DbPool>,
    user: AuthUser,
    id: web::Path<u64>,
    info: web::Json<FeedbackRequest>,
) -> ApiResult<AppointResponse> {
    use crate::schema::appointments;

    let id = id.into_inner();
    let info = info.into_inner();
    let rating = lifecycle::validate_rating(info.rating)?;
    let actor = Actor::from(user.into_inner());

    let mut conn = get_db_conn(&pool)?;
    let (appo, property) = web::block(move || {
        conn.transaction::<_, ApiError, _>(|conn| {
            let (appo, property) = load_locked(conn, id)?;
            lifecycle::authorize_feedback(
                &actor,
                &Participants::of(&appo, &property),
                appo.status()?,
            )?;
            if appo.feedback_rating.is_some() {
                return Err(ApiError::bad_request("Feedback was already submitted"));
            }

            diesel::update(appointments::table.find(id))
                .set((
                    appointments::feedback_rating.eq(Some(rating)),
                    appointments::feedback_comment.eq(non_empty(info.comment)),
                    appointments::updated_at.eq(now()),
                ))
                .execute(conn)?;

            let appo = reload(conn, id)?;
            notify::deliver(
                conn,
                &AppointmentEvent::Feedback { rating },
                &AppointmentContext::new(&appo, &property),
            )?;
            Ok((appo, property))
        })
    })
    .await??;

    tracing::info!(appointment = id, rating, "appointment feedback recorded");
    Ok(AppointResponse::ok(
        "Feedback recorded",
        AppointItem::new(appo, property),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointments::VisitType;

    fn slot_sql(except: Option<u64>) -> String {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        diesel::debug_query::<Mysql, _>(&slot_query(7, date, time, except)).to_string()
    }

    #[test]
    fn slot_ignores_cancelled_bookings() {
        let sql = slot_sql(None);
        assert!(sql.contains("`appointments`.`pid` = ?"));
        assert!(sql.contains("`appointments`.`date` = ?"));
        assert!(sql.contains("`appointments`.`time` = ?"));
        assert!(sql.contains("`appointments`.`status` != ?"));
        assert!(sql.contains("cancelled"));
        assert!(!sql.contains("`appointments`.`id` != ?"));
    }

    #[test]
    fn rescheduling_skips_the_appointment_itself() {
        let sql = slot_sql(Some(42));
        assert!(sql.contains("`appointments`.`id` != ?"));
        assert!(sql.contains("`appointments`.`status` != ?"));
    }

    fn stored() -> Appointment {
        let now = now();
        Appointment {
            id: 42,
            pid: 7,
            username: "carol".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status: "pending".to_string(),
            visit_type: "office_vr".to_string(),
            vr_city: Some("Pune".to_string()),
            meeting_platform: None,
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            notes: Some("Bring documents".to_string()),
            cancel_reason: None,
            feedback_rating: None,
            feedback_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request() -> UpdateDetailsRequest {
        UpdateDetailsRequest {
            appointment_id: 42,
            date: None,
            time: None,
            visit_type: None,
            vr_city: None,
            meeting_platform: None,
            meeting_link: None,
            notes: None,
        }
    }

    #[test]
    fn resending_stored_values_changes_nothing() {
        let appo = stored();
        let info = UpdateDetailsRequest {
            visit_type: Some(VisitType::OfficeVr),
            vr_city: Some(" Pune ".to_string()),
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            notes: Some("Bring documents".to_string()),
            ..request()
        };
        let changes = detail_changes(&appo, appo.date, appo.time, info).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn only_differing_fields_are_written() {
        let appo = stored();
        let later = NaiveTime::from_hms_opt(11, 30, 0).unwrap();
        let info = UpdateDetailsRequest {
            visit_type: Some(VisitType::Online),
            meeting_platform: Some("Zoom".to_string()),
            ..request()
        };
        let changes = detail_changes(&appo, appo.date, later, info).unwrap();
        assert_eq!(changes.date, None);
        assert_eq!(changes.time, Some(later));
        assert_eq!(changes.visit_type.as_deref(), Some("online"));
        assert_eq!(changes.vr_city, Some(None));
        assert_eq!(changes.meeting_platform.as_deref(), Some("Zoom"));
        assert_eq!(changes.meeting_link, None);
    }

    #[test]
    fn vr_visit_still_needs_a_city() {
        let mut appo = stored();
        appo.visit_type = "property".to_string();
        appo.vr_city = None;
        let info = UpdateDetailsRequest {
            visit_type: Some(VisitType::OfficeVr),
            ..request()
        };
        assert!(matches!(
            detail_changes(&appo, appo.date, appo.time, info),
            Err(ApiError::BadRequest(_))
        ));
    }
}
