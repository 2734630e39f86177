pub mod admin;
pub mod auth;
pub mod guest;
pub mod staff;
