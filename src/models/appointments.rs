use std::{fmt, str::FromStr};

use crate::{error::ApiError, schema::appointments};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Clone, Debug)]
pub struct Appointment {
    pub id: u64,
    pub pid: u64,
    pub username: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub visit_type: String,
    pub vr_city: Option<String>,
    pub meeting_platform: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub feedback_rating: Option<i8>,
    pub feedback_comment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn status(&self) -> Result<AppointmentStatus, ApiError> {
        self.status
            .parse()
            .map_err(|_| ApiError::Internal(format!("Corrupt status '{}' on appointment {}", self.status, self.id)))
    }

    pub fn visit_type(&self) -> Result<VisitType, ApiError> {
        self.visit_type
            .parse()
            .map_err(|_| ApiError::Internal(format!("Corrupt visit type '{}' on appointment {}", self.visit_type, self.id)))
    }
}

#[derive(Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub pid: u64,
    pub username: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub visit_type: String,
    pub vr_city: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = appointments)]
pub struct UpdateAppointment {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub visit_type: Option<String>,
    pub vr_city: Option<Option<String>>,
    pub meeting_platform: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
}

impl UpdateAppointment {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.time.is_none()
            && self.visit_type.is_none()
            && self.vr_city.is_none()
            && self.meeting_platform.is_none()
            && self.meeting_link.is_none()
            && self.notes.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown appointment status '{}'", s)))
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    /// On-site viewing.
    Property,
    Online,
    /// VR tour at one of the agency's city offices.
    OfficeVr,
}

impl VisitType {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitType::Property => "property",
            VisitType::Online => "online",
            VisitType::OfficeVr => "office_vr",
        }
    }
}

impl FromStr for VisitType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "property" => Ok(VisitType::Property),
            "online" => Ok(VisitType::Online),
            "office_vr" => Ok(VisitType::OfficeVr),
            _ => Err(ApiError::bad_request(format!("Unknown visit type '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_column_values() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("done".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn serde_names_match_column_values() {
        let visit: VisitType = serde_json::from_str("\"office_vr\"").unwrap();
        assert_eq!(visit, VisitType::OfficeVr);
        assert_eq!(visit.as_str(), "office_vr");

        let status: AppointmentStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(status.to_string(), "confirmed");
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateAppointment::default().is_empty());
        let update = UpdateAppointment {
            notes: Some("bring documents".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
