pub mod account;
pub mod reviews;
pub mod tours;
pub mod users;
