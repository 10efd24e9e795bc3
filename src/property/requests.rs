use serde::Deserialize;

use crate::models::properties::{PropertyKind, Purpose};

#[derive(Deserialize)]
pub struct AddPropertyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: PropertyKind,
    pub purpose: Purpose,
    pub price: i64,
    pub area_sqft: i32,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub city: String,
    #[serde(default)]
    pub address: String,
    /// Username of the listing agent.
    pub agent: Option<String>,
    /// Username of the seller. Defaults to the creator when they hold the
    /// seller role; required when an admin creates the listing.
    pub seller: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchPropertyQuery {
    pub city: Option<String>,
    pub kind: Option<PropertyKind>,
    pub purpose: Option<Purpose>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct ModifyPropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<PropertyKind>,
    pub purpose: Option<Purpose>,
    pub price: Option<i64>,
    pub area_sqft: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Empty string clears the agent.
    pub agent: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Deserialize)]
pub struct RecommendRequest {
    pub price: i64,
    pub area_sqft: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub kind: Option<PropertyKind>,
    pub purpose: Option<Purpose>,
    pub city: Option<String>,
    pub limit: Option<usize>,
}
