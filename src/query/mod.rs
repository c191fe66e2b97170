pub mod engine;
pub mod error;
pub mod translator;
pub mod types;

pub use engine::QueryEngine;
pub use error::QueryError;
pub use translator::QueryTranslator;
pub use types::{Condition, FilterOp, Projection, QuerySpec, SortDirection, SortKey, SqlPlan};
