pub mod password;
pub mod reset;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{issue_token, verify_token, TokenData, TokenError};
