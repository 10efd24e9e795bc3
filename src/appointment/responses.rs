use serde::Serialize;

use crate::{
    models::{appointments::Appointment, properties::PropertyData},
    utils::{format_date_str, format_datetime_str, format_time_str},
};

#[derive(Default, Serialize)]
pub struct AppointPropertyItem {
    pub pid: u64,
    pub title: String,
    pub city: String,
    pub address: String,
    pub agent: Option<String>,
    pub seller: Option<String>,
}

#[derive(Default, Serialize)]
pub struct FeedbackItem {
    pub rating: i8,
    pub comment: Option<String>,
}

#[derive(Default, Serialize)]
pub struct AppointItem {
    pub id: u64,
    pub property: AppointPropertyItem,
    pub username: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub visit_type: String,
    pub vr_city: Option<String>,
    pub meeting_platform: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub feedback: Option<FeedbackItem>,
    pub created_at: String,
    pub updated_at: String,
}

impl AppointItem {
    pub fn new(appo: Appointment, property: PropertyData) -> Self {
        let feedback = appo.feedback_rating.map(|rating| FeedbackItem {
            rating,
            comment: appo.feedback_comment.clone(),
        });
        Self {
            id: appo.id,
            property: AppointPropertyItem {
                pid: property.pid,
                title: property.title,
                city: property.city,
                address: property.address,
                agent: property.agent,
                seller: property.seller,
            },
            date: format_date_str(&appo.date),
            time: format_time_str(&appo.time),
            created_at: format_datetime_str(&appo.created_at),
            updated_at: format_datetime_str(&appo.updated_at),
            username: appo.username,
            status: appo.status,
            visit_type: appo.visit_type,
            vr_city: appo.vr_city,
            meeting_platform: appo.meeting_platform,
            meeting_link: appo.meeting_link,
            notes: appo.notes,
            cancel_reason: appo.cancel_reason,
            feedback,
        }
    }
}

#[derive(Default, Serialize)]
pub struct AppointResponse {
    pub success: bool,
    pub message: String,
    pub appointment: Option<AppointItem>,
}

impl AppointResponse {
    pub fn ok<S: ToString>(message: S, appointment: AppointItem) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            appointment: Some(appointment),
        }
    }
}

#[derive(Default, Serialize)]
pub struct SearchAppointResponse {
    pub success: bool,
    pub message: String,
    pub appointments: Vec<AppointItem>,
}

crate::impl_err_response! {
    AppointResponse,
    SearchAppointResponse,
}
