use serde::Deserialize;

use crate::models::appointments::{AppointmentStatus, VisitType};

fn default_visit_type() -> VisitType {
    VisitType::Property
}

#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub property_id: u64,
    pub date: String,
    pub time: String,
    #[serde(default = "default_visit_type")]
    pub visit_type: VisitType,
    pub vr_city: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchAppointQuery {
    pub status: Option<AppointmentStatus>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub appointment_id: u64,
    pub status: AppointmentStatus,
}

#[derive(Deserialize)]
pub struct UpdateDetailsRequest {
    pub appointment_id: u64,
    pub date: Option<String>,
    pub time: Option<String>,
    pub visit_type: Option<VisitType>,
    pub vr_city: Option<String>,
    pub meeting_platform: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
}

impl UpdateDetailsRequest {
    pub fn touches_meeting(&self) -> bool {
        self.meeting_platform.is_some() || self.meeting_link.is_some()
    }
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub rating: i8,
    pub comment: Option<String>,
}
