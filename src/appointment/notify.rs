//! In-app notification fan-out for appointment events.
//!
//! Every event goes to the requesting client, the property's agent and
//! seller, and all administrators, each with a message worded for that
//! audience. Rows are written on the caller's connection so they commit
//! together with the change that produced them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::MysqlConnection;

use crate::{
    models::{
        appointments::{Appointment, AppointmentStatus},
        notifications::{NewNotification, RecipientKind},
        properties::PropertyData,
    },
    utils::{format_date_str, format_time_str},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentEvent {
    Scheduled,
    StatusChanged(AppointmentStatus),
    DetailsUpdated,
    Cancelled { reason: Option<String> },
    Feedback { rating: i8 },
}

impl AppointmentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AppointmentEvent::Scheduled => "appointment_scheduled",
            AppointmentEvent::StatusChanged(_) => "appointment_status",
            AppointmentEvent::DetailsUpdated => "appointment_updated",
            AppointmentEvent::Cancelled { .. } => "appointment_cancelled",
            AppointmentEvent::Feedback { .. } => "appointment_feedback",
        }
    }

    fn notifies_requester(&self) -> bool {
        !matches!(self, AppointmentEvent::Feedback { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Requester,
    Agent,
    Seller,
    Admin,
}

#[derive(Debug, Clone)]
pub struct AppointmentContext<'a> {
    pub id: u64,
    pub title: &'a str,
    pub requester: &'a str,
    pub agent: Option<&'a str>,
    pub seller: Option<&'a str>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl<'a> AppointmentContext<'a> {
    pub fn new(appointment: &'a Appointment, property: &'a PropertyData) -> Self {
        Self {
            id: appointment.id,
            title: &property.title,
            requester: &appointment.username,
            agent: property.agent.as_deref(),
            seller: property.seller.as_deref(),
            date: appointment.date,
            time: appointment.time,
        }
    }

    fn viewing(&self) -> String {
        format!(
            "viewing of \"{}\" on {} at {}",
            self.title,
            format_date_str(&self.date),
            format_time_str(&self.time)
        )
    }

    pub fn link(&self) -> String {
        format!("/appointments/{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient_kind: RecipientKind,
    pub recipient: String,
    pub audience: Audience,
    pub message: String,
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(": {}", reason),
        None => ".".to_string(),
    }
}

pub fn message_for(event: &AppointmentEvent, ctx: &AppointmentContext, audience: Audience) -> String {
    let viewing = ctx.viewing();
    let body = if audience == Audience::Requester {
        match event {
            AppointmentEvent::Scheduled => {
                format!("Your {} has been requested and is awaiting confirmation.", viewing)
            }
            AppointmentEvent::StatusChanged(status) => format!("Your {} is now {}.", viewing, status),
            AppointmentEvent::DetailsUpdated => format!("Your {} has been updated.", viewing),
            AppointmentEvent::Cancelled { reason } => {
                format!("Your {} was cancelled{}", viewing, reason_suffix(reason))
            }
            AppointmentEvent::Feedback { rating } => {
                format!("You rated the {} {}/5.", viewing, rating)
            }
        }
    } else {
        match event {
            AppointmentEvent::Scheduled => format!("{} requested a {}.", ctx.requester, viewing),
            AppointmentEvent::StatusChanged(status) => format!(
                "The {} requested by {} is now {}.",
                viewing, ctx.requester, status
            ),
            AppointmentEvent::DetailsUpdated => format!(
                "The {} requested by {} has been updated.",
                viewing, ctx.requester
            ),
            AppointmentEvent::Cancelled { reason } => format!(
                "The {} requested by {} was cancelled{}",
                viewing,
                ctx.requester,
                reason_suffix(reason)
            ),
            AppointmentEvent::Feedback { rating } => {
                format!("{} rated the {} {}/5.", ctx.requester, viewing, rating)
            }
        }
    };

    match audience {
        Audience::Requester => body,
        Audience::Agent => format!("[As agent] {}", body),
        Audience::Seller => format!("[As seller] {}", body),
        Audience::Admin => format!("[Appointment #{}] {}", ctx.id, body),
    }
}

/// One draft per recipient. A user who is both agent and seller (or who
/// booked a viewing of their own listing) is notified once, in the
/// strongest register.
pub fn plan(
    event: &AppointmentEvent,
    ctx: &AppointmentContext,
    admins: &[String],
) -> Vec<NotificationDraft> {
    let mut users: Vec<(&str, Audience)> = Vec::new();
    if let Some(agent) = ctx.agent {
        users.push((agent, Audience::Agent));
    }
    if let Some(seller) = ctx.seller {
        users.push((seller, Audience::Seller));
    }
    if event.notifies_requester() {
        users.push((ctx.requester, Audience::Requester));
    }

    let mut drafts: Vec<NotificationDraft> = Vec::with_capacity(users.len() + admins.len());
    for (username, audience) in users {
        if drafts.iter().any(|draft| draft.recipient == username) {
            continue;
        }
        drafts.push(NotificationDraft {
            recipient_kind: RecipientKind::User,
            recipient: username.to_string(),
            audience,
            message: message_for(event, ctx, audience),
        });
    }
    for aid in admins {
        drafts.push(NotificationDraft {
            recipient_kind: RecipientKind::Admin,
            recipient: aid.clone(),
            audience: Audience::Admin,
            message: message_for(event, ctx, Audience::Admin),
        });
    }

    drafts
}

pub fn into_rows(
    event: &AppointmentEvent,
    ctx: &AppointmentContext,
    drafts: Vec<NotificationDraft>,
    now: NaiveDateTime,
) -> Vec<NewNotification> {
    let link = ctx.link();
    drafts
        .into_iter()
        .map(|draft| NewNotification {
            recipient_kind: draft.recipient_kind.as_str().to_string(),
            recipient: draft.recipient,
            kind: event.kind().to_string(),
            message: draft.message,
            link: link.clone(),
            is_read: false,
            created_at: now,
        })
        .collect()
}

/// Writes the fan-out for `event`; returns how many notifications were stored.
pub fn deliver(
    conn: &mut MysqlConnection,
    event: &AppointmentEvent,
    ctx: &AppointmentContext,
) -> QueryResult<usize> {
    use crate::schema::{administrators, notifications};

    let admins = administrators::table
        .select(administrators::aid)
        .order(administrators::aid.asc())
        .load::<String>(conn)?;
    let rows = into_rows(event, ctx, plan(event, ctx, &admins), crate::utils::now());
    if rows.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(notifications::table)
        .values(&rows)
        .execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AppointmentContext<'static> {
        AppointmentContext {
            id: 42,
            title: "Lake View 2BHK",
            requester: "carol",
            agent: Some("alex"),
            seller: Some("sam"),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    fn admins() -> Vec<String> {
        vec!["root".to_string(), "ops".to_string()]
    }

    fn recipients(drafts: &[NotificationDraft]) -> Vec<(RecipientKind, &str)> {
        drafts
            .iter()
            .map(|d| (d.recipient_kind, d.recipient.as_str()))
            .collect()
    }

    #[test]
    fn confirmation_reaches_everyone() {
        let event = AppointmentEvent::StatusChanged(AppointmentStatus::Confirmed);
        let drafts = plan(&event, &ctx(), &admins());
        assert_eq!(
            recipients(&drafts),
            vec![
                (RecipientKind::User, "alex"),
                (RecipientKind::User, "sam"),
                (RecipientKind::User, "carol"),
                (RecipientKind::Admin, "root"),
                (RecipientKind::Admin, "ops"),
            ]
        );
        let client = drafts.iter().find(|d| d.recipient == "carol").unwrap();
        assert_eq!(
            client.message,
            "Your viewing of \"Lake View 2BHK\" on 2024-06-01 at 10:00 is now confirmed."
        );
        let admin = drafts.iter().find(|d| d.recipient == "root").unwrap();
        assert!(admin.message.starts_with("[Appointment #42] The viewing"));
        assert!(admin.message.ends_with("requested by carol is now confirmed."));
    }

    #[test]
    fn shared_agent_and_seller_is_notified_once() {
        let mut ctx = ctx();
        ctx.seller = Some("alex");
        let drafts = plan(&AppointmentEvent::Scheduled, &ctx, &[]);
        assert_eq!(
            recipients(&drafts),
            vec![(RecipientKind::User, "alex"), (RecipientKind::User, "carol")]
        );
        assert_eq!(drafts[0].audience, Audience::Agent);
        assert!(drafts[0].message.starts_with("[As agent] carol requested a viewing"));
    }

    #[test]
    fn missing_agent_is_skipped() {
        let mut ctx = ctx();
        ctx.agent = None;
        let drafts = plan(&AppointmentEvent::DetailsUpdated, &ctx, &admins());
        assert_eq!(drafts.len(), 4);
        assert!(drafts.iter().all(|d| d.audience != Audience::Agent));
    }

    #[test]
    fn cancellation_carries_the_reason() {
        let event = AppointmentEvent::Cancelled {
            reason: Some("Travel plans changed".to_string()),
        };
        let drafts = plan(&event, &ctx(), &[]);
        let client = drafts.iter().find(|d| d.recipient == "carol").unwrap();
        assert!(client.message.ends_with("was cancelled: Travel plans changed"));

        let event = AppointmentEvent::Cancelled { reason: None };
        let drafts = plan(&event, &ctx(), &[]);
        assert!(drafts[0].message.ends_with("was cancelled."));
    }

    #[test]
    fn feedback_skips_the_requester() {
        let drafts = plan(&AppointmentEvent::Feedback { rating: 4 }, &ctx(), &admins());
        assert!(drafts.iter().all(|d| d.recipient != "carol"));
        assert_eq!(drafts.len(), 4);
        assert!(drafts[1].message.contains("carol rated the viewing"));
        assert!(drafts[1].message.ends_with("4/5."));
    }

    #[test]
    fn rows_link_back_to_the_appointment() {
        let event = AppointmentEvent::Scheduled;
        let now = crate::utils::now();
        let rows = into_rows(&event, &ctx(), plan(&event, &ctx(), &admins()), now);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.link == "/appointments/42"));
        assert!(rows.iter().all(|r| r.kind == "appointment_scheduled" && !r.is_read));
        assert_eq!(rows[3].recipient_kind, "admin");
        assert_eq!(rows[0].recipient_kind, "user");
    }
}
