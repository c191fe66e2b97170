//! Generic CRUD handlers parameterized by a [`ResourceDescriptor`].
//!
//! Route handlers stay thin: they pick a descriptor, pass the request pieces
//! through, and let the descriptor's policy decide ownership, conflict
//! wording, hidden fields, and post-write side effects.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::hooks::{run_hooks, WriteOp};
use crate::middleware::ApiResponse;
use crate::models::Principal;
use crate::query::QueryTranslator;
use crate::resources::ResourceDescriptor;
use crate::state::AppState;
use crate::store::Document;

fn parse_id(descriptor: &ResourceDescriptor, id: &str) -> Result<Uuid, ApiError> {
    id.parse().map_err(|_| {
        ApiError::bad_request(format!("Invalid {} id: {}", descriptor.display_name, id))
    })
}

fn strip_hidden(descriptor: &ResourceDescriptor, mut doc: Document) -> Document {
    for field in descriptor.hidden_fields {
        doc.remove(*field);
    }
    doc
}

fn map_conflict(descriptor: &'static ResourceDescriptor) -> impl Fn(ApiError) -> ApiError {
    move |err| match (&err, descriptor.conflict_message) {
        (ApiError::Conflict(_), Some(message)) => ApiError::conflict(message),
        _ => err,
    }
}

pub async fn list_all(
    descriptor: &'static ResourceDescriptor,
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<ApiResponse, ApiError> {
    let spec = QueryTranslator::translate(params)?;
    let docs = state.store.find(descriptor.collection, &spec).await?;
    let docs: Vec<Document> = docs
        .into_iter()
        .map(|doc| strip_hidden(descriptor, doc))
        .collect();
    Ok(ApiResponse::ok().count(docs.len()).data(docs))
}

pub async fn get_one(
    descriptor: &'static ResourceDescriptor,
    state: &AppState,
    id: &str,
) -> Result<ApiResponse, ApiError> {
    let id = parse_id(descriptor, id)?;
    let doc = state
        .store
        .find_by_id(descriptor.collection, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", descriptor.display_name)))?;
    Ok(ApiResponse::ok().data(strip_hidden(descriptor, doc)))
}

pub async fn create_one(
    descriptor: &'static ResourceDescriptor,
    state: &AppState,
    principal: Option<&Principal>,
    body: Value,
) -> Result<ApiResponse, ApiError> {
    let Value::Object(mut doc) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    // Ownership always comes from the session; a client-supplied value would
    // let callers attribute writes to other accounts
    if let (Some(field), Some(principal)) = (descriptor.ownership_field, principal) {
        doc.insert(field.to_string(), Value::String(principal.id.to_string()));
    }

    let created = state
        .store
        .insert(descriptor.collection, doc)
        .await
        .map_err(ApiError::from)
        .map_err(map_conflict(descriptor))?;

    run_hooks(
        &descriptor.post_write_hooks,
        state.store.as_ref(),
        WriteOp::Create,
        &created,
    )
    .await;
    Ok(ApiResponse::created().data(strip_hidden(descriptor, created)))
}

pub async fn update_one(
    descriptor: &'static ResourceDescriptor,
    state: &AppState,
    id: &str,
    body: Value,
) -> Result<ApiResponse, ApiError> {
    let id = parse_id(descriptor, id)?;
    let Value::Object(doc) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let updated = state
        .store
        .update_by_id(descriptor.collection, id, doc)
        .await
        .map_err(ApiError::from)
        .map_err(map_conflict(descriptor))?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", descriptor.display_name)))?;

    run_hooks(
        &descriptor.post_write_hooks,
        state.store.as_ref(),
        WriteOp::Update,
        &updated,
    )
    .await;
    Ok(ApiResponse::ok().data(strip_hidden(descriptor, updated)))
}

pub async fn delete_one(
    descriptor: &'static ResourceDescriptor,
    state: &AppState,
    principal: Option<&Principal>,
    id: &str,
) -> Result<ApiResponse, ApiError> {
    let id = parse_id(descriptor, id)?;
    let doc = state
        .store
        .find_by_id(descriptor.collection, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", descriptor.display_name)))?;

    // Ownership is checked before anything is removed
    if let (Some(field), Some(principal)) = (descriptor.ownership_field, principal) {
        let owner = doc.get(field).and_then(Value::as_str);
        if owner != Some(principal.id.to_string().as_str()) {
            return Err(ApiError::forbidden(format!(
                "This {} does not belong to you",
                descriptor.display_name.to_lowercase()
            )));
        }
    }

    let deleted = state.store.delete_by_id(descriptor.collection, id).await?;
    if !deleted {
        return Err(ApiError::not_found(format!(
            "{} not found",
            descriptor.display_name
        )));
    }

    run_hooks(
        &descriptor.post_write_hooks,
        state.store.as_ref(),
        WriteOp::Delete,
        &doc,
    )
    .await;
    Ok(ApiResponse::ok().message(format!("{} deleted", descriptor.display_name)))
}
