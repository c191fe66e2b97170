use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::hooks::{PostWriteHook, RecomputeTourRatings};

/// Per-resource policy consumed by the generic CRUD handlers: where the data
/// lives, what conflicts and ownership mean for it, and which side effects
/// its writes trigger.
pub struct ResourceDescriptor {
    pub collection: &'static str,
    pub display_name: &'static str,
    /// Field holding the owning principal's id. Set on create when absent,
    /// checked before delete.
    pub ownership_field: Option<&'static str>,
    /// Client-facing message for unique-constraint conflicts.
    pub conflict_message: Option<&'static str>,
    /// Fields stripped from every response body.
    pub hidden_fields: &'static [&'static str],
    pub post_write_hooks: Vec<Arc<dyn PostWriteHook>>,
}

pub static TOURS: Lazy<ResourceDescriptor> = Lazy::new(|| ResourceDescriptor {
    collection: "tours",
    display_name: "Tour",
    ownership_field: None,
    conflict_message: Some("A tour with this name already exists"),
    hidden_fields: &[],
    post_write_hooks: Vec::new(),
});

pub static REVIEWS: Lazy<ResourceDescriptor> = Lazy::new(|| ResourceDescriptor {
    collection: "reviews",
    display_name: "Review",
    ownership_field: Some("user"),
    conflict_message: Some("You have already reviewed this tour"),
    hidden_fields: &[],
    post_write_hooks: vec![Arc::new(RecomputeTourRatings)],
});

pub static USERS: Lazy<ResourceDescriptor> = Lazy::new(|| ResourceDescriptor {
    collection: "users",
    display_name: "User",
    ownership_field: None,
    conflict_message: Some("There is already an account using this email"),
    hidden_fields: &["password", "reset_token_hash", "reset_token_expires"],
    post_write_hooks: Vec::new(),
});
