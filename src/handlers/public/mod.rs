pub mod auth;
pub mod reviews;
pub mod tours;
