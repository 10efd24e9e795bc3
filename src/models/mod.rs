pub mod administrators;
pub mod appointments;
pub mod notifications;
pub mod properties;
pub mod users;
pub mod wishlists;

pub mod admin_logins;
pub mod user_logins;
