use serde::Serialize;

use crate::{models::properties::PropertyData, utils::format_datetime_str};

#[derive(Default, Serialize)]
pub struct PropertyItem {
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
    pub created_at: String,
}

impl From<PropertyData> for PropertyItem {
    fn from(data: PropertyData) -> Self {
        Self {
            created_at: format_datetime_str(&data.created_at),
            pid: data.pid,
            title: data.title,
            description: data.description,
            kind: data.kind,
            purpose: data.purpose,
            price: data.price,
            area_sqft: data.area_sqft,
            bedrooms: data.bedrooms,
            bathrooms: data.bathrooms,
            city: data.city,
            address: data.address,
            seller: data.seller,
            agent: data.agent,
            is_available: data.is_available,
        }
    }
}

#[derive(Default, Serialize)]
pub struct PropertyResponse {
    pub success: bool,
    pub message: String,
    pub property: Option<PropertyItem>,
}

#[derive(Default, Serialize)]
pub struct SearchPropertyResponse {
    pub success: bool,
    pub message: String,
    pub properties: Vec<PropertyItem>,
}

#[derive(Default, Serialize)]
pub struct RecommendItem {
    pub property: PropertyItem,
    pub distance: f64,
    /// `1 / (1 + distance)`, so 1.0 is a perfect match.
    pub score: f64,
}

#[derive(Default, Serialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub message: String,
    pub recommendations: Vec<RecommendItem>,
}

crate::impl_err_response! {
    PropertyResponse,
    SearchPropertyResponse,
    RecommendResponse,
}
