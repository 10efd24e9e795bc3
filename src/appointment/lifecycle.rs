//! Appointment lifecycle rules: who may do what, and which status moves are
//! legal. Everything here is pure so the route handlers can run it inside a
//! transaction after loading the appointment and its property.

use chrono::NaiveDate;

use crate::{
    auth::Actor,
    error::{ApiError, ApiResult},
    models::{
        appointments::{Appointment, AppointmentStatus, VisitType},
        properties::PropertyData,
    },
};

impl AppointmentStatus {
    pub fn allowed_next(self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;

        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Completed, Cancelled],
            Cancelled | Completed => &[],
        }
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

/// The accounts tied to one appointment.
#[derive(Debug, Clone, Copy)]
pub struct Participants<'a> {
    pub requester: &'a str,
    pub agent: Option<&'a str>,
    pub seller: Option<&'a str>,
}

impl<'a> Participants<'a> {
    pub fn of(appointment: &'a Appointment, property: &'a PropertyData) -> Self {
        Self {
            requester: &appointment.username,
            agent: property.agent.as_deref(),
            seller: property.seller.as_deref(),
        }
    }
}

/// How an actor relates to an appointment, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Admin,
    Agent,
    Seller,
    Requester,
    Outsider,
}

impl Relation {
    pub fn of(actor: &Actor, participants: &Participants) -> Self {
        let username = match actor {
            Actor::Admin { .. } => return Relation::Admin,
            Actor::User { username, .. } => username.as_str(),
        };

        if participants.agent == Some(username) {
            Relation::Agent
        } else if participants.seller == Some(username) {
            Relation::Seller
        } else if participants.requester == username {
            Relation::Requester
        } else {
            Relation::Outsider
        }
    }

    /// Admins and the property's agent or seller.
    pub fn is_staff(self) -> bool {
        matches!(self, Relation::Admin | Relation::Agent | Relation::Seller)
    }
}

pub fn authorize_status_change(
    actor: &Actor,
    participants: &Participants,
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> ApiResult<()> {
    if !Relation::of(actor, participants).is_staff() {
        return Err(ApiError::forbidden(
            "Only an admin, the property's agent or its seller may change the status",
        ));
    }
    if !from.can_transition_to(to) {
        return Err(ApiError::bad_request(format!(
            "Cannot change an appointment from {} to {}",
            from, to
        )));
    }
    Ok(())
}

pub fn authorize_cancel(
    actor: &Actor,
    participants: &Participants,
    status: AppointmentStatus,
) -> ApiResult<()> {
    if Relation::of(actor, participants) == Relation::Outsider {
        return Err(ApiError::forbidden("Not allowed to cancel this appointment"));
    }
    if !status.can_transition_to(AppointmentStatus::Cancelled) {
        return Err(ApiError::bad_request(format!("Appointment is already {}", status)));
    }
    Ok(())
}

/// Meeting platform and link are staff-only; other details are open to the
/// requester as well.
pub fn authorize_update(
    actor: &Actor,
    participants: &Participants,
    status: AppointmentStatus,
    touches_meeting: bool,
) -> ApiResult<()> {
    let relation = Relation::of(actor, participants);
    if relation == Relation::Outsider {
        return Err(ApiError::forbidden("Not allowed to update this appointment"));
    }
    if touches_meeting && !relation.is_staff() {
        return Err(ApiError::forbidden(
            "Only an admin, the property's agent or its seller may set meeting details",
        ));
    }
    if status.is_terminal() {
        return Err(ApiError::bad_request(format!(
            "Appointment is already {}",
            status
        )));
    }
    Ok(())
}

pub fn authorize_feedback(
    actor: &Actor,
    participants: &Participants,
    status: AppointmentStatus,
) -> ApiResult<()> {
    // The booking client may also represent the listing.
    if actor.username() != Some(participants.requester) {
        return Err(ApiError::forbidden(
            "Only the client who booked the viewing may leave feedback",
        ));
    }
    if status != AppointmentStatus::Completed {
        return Err(ApiError::bad_request(
            "Feedback is only accepted for completed appointments",
        ));
    }
    Ok(())
}

pub fn validate_rating(rating: i8) -> ApiResult<i8> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ApiError::bad_request("Rating must be between 1 and 5"))
    }
}

/// Returns the city to store: required and trimmed for office VR visits,
/// dropped for every other visit type.
pub fn validate_visit(visit_type: VisitType, vr_city: Option<&str>) -> ApiResult<Option<String>> {
    let city = vr_city.map(str::trim).filter(|city| !city.is_empty());
    match (visit_type, city) {
        (VisitType::OfficeVr, Some(city)) => Ok(Some(city.to_string())),
        (VisitType::OfficeVr, None) => Err(ApiError::bad_request(
            "A city is required for office VR visits",
        )),
        _ => Ok(None),
    }
}

pub fn validate_date(date: NaiveDate, today: NaiveDate) -> ApiResult<NaiveDate> {
    if date < today {
        return Err(ApiError::bad_request("Cannot schedule a viewing in the past"));
    }
    Ok(date)
}
