use serde::Serialize;

use crate::property::PropertyItem;

#[derive(Default, Serialize)]
pub struct WishlistItem {
    pub added_at: String,
    pub property: PropertyItem,
}

#[derive(Default, Serialize)]
pub struct WishlistResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<WishlistItem>,
}

crate::impl_err_response! {
    WishlistResponse,
}
