use crate::schema::properties;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Clone, Debug)]
pub struct PropertyData {
    pub pid: u64,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub purpose: String,
    pub price: i64,
    pub area_sqft: i32,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub city: String,
    pub address: String,
    pub seller: Option<String>,
    pub agent: Option<String>,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub purpose: String,
    pub price: i64,
    pub area_sqft: i32,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub city: String,
    pub address: String,
    pub seller: Option<String>,
    pub agent: Option<String>,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = properties)]
pub struct UpdateProperty {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub purpose: Option<String>,
    pub price: Option<i64>,
    pub area_sqft: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub agent: Option<Option<String>>,
    pub is_available: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    House,
    Villa,
    Plot,
    Commercial,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Apartment => "apartment",
            PropertyKind::House => "house",
            PropertyKind::Villa => "villa",
            PropertyKind::Plot => "plot",
            PropertyKind::Commercial => "commercial",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Sale,
    Rent,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Sale => "sale",
            Purpose::Rent => "rent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_values_match_the_wire_names() {
        let kind: PropertyKind = serde_json::from_str("\"commercial\"").unwrap();
        assert_eq!(kind.as_str(), "commercial");
        let purpose: Purpose = serde_json::from_str("\"rent\"").unwrap();
        assert_eq!(purpose.as_str(), "rent");
        assert!(serde_json::from_str::<PropertyKind>("\"castle\"").is_err());
    }
}
