use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Unsupported filter operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid page number: {0}")]
    InvalidPage(String),
}
