pub mod tour_ratings;

use std::sync::Arc;

use async_trait::async_trait;

use crate::store::{Document, Store, StoreError};

pub use tour_ratings::RecomputeTourRatings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

/// Side effect attached to a resource's writes, such as keeping a parent's
/// aggregates in step with its children.
#[async_trait]
pub trait PostWriteHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// `doc` is the written entity for create/update, the removed entity for
    /// delete.
    async fn run(&self, store: &dyn Store, op: WriteOp, doc: &Document) -> Result<(), StoreError>;
}

/// Hooks are best-effort: a failing hook is logged and the request still
/// succeeds, since the primary write has already been committed.
pub async fn run_hooks(
    hooks: &[Arc<dyn PostWriteHook>],
    store: &dyn Store,
    op: WriteOp,
    doc: &Document,
) {
    for hook in hooks {
        if let Err(err) = hook.run(store, op, doc).await {
            tracing::warn!(hook = hook.name(), "Post-write hook failed: {}", err);
        }
    }
}
