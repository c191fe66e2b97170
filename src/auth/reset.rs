use chrono::{Duration, Utc};
use rand::RngCore;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::config;
use crate::error::ApiError;
use crate::mail::{MailMessage, Mailer};
use crate::models::Principal;
use crate::query::Condition;
use crate::store::Store;

/// Time-boxed, single-use password reset.
///
/// Only the SHA-256 digest of the reset secret is ever stored; the raw secret
/// exists in the email alone. Redeeming clears both the digest and the expiry
/// so a secret cannot be replayed.
const RESET_SECRET_BYTES: usize = 32;

pub fn generate_reset_secret() -> String {
    let mut bytes = [0u8; RESET_SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_reset_secret(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

async fn load_by_email(store: &dyn Store, email: &str) -> Result<Option<Principal>, ApiError> {
    let doc = store
        .find_one(
            "users",
            &[Condition::eq("email", Value::String(email.to_string()))],
        )
        .await?;
    match doc {
        Some(doc) => Ok(Some(
            Principal::from_document(doc).map_err(crate::store::StoreError::Serialization)?,
        )),
        None => Ok(None),
    }
}

async fn save(store: &dyn Store, principal: &Principal) -> Result<(), ApiError> {
    let doc = principal
        .to_document()
        .map_err(crate::store::StoreError::Serialization)?;
    store
        .update_by_id("users", principal.id, doc)
        .await?
        .ok_or_else(|| ApiError::principal_not_found("The account no longer exists"))?;
    Ok(())
}

/// Start a reset: mint a secret, persist its digest with an expiry, and mail
/// the raw secret. If delivery fails the stored state is rolled back so the
/// account is not left with a dangling token.
pub async fn issue(store: &dyn Store, mailer: &dyn Mailer, email: &str) -> Result<(), ApiError> {
    let Some(mut principal) = load_by_email(store, email).await? else {
        return Err(ApiError::principal_not_found(
            "There is no account using this email address",
        ));
    };

    let raw_secret = generate_reset_secret();
    principal.reset_token_hash = Some(hash_reset_secret(&raw_secret));
    principal.reset_token_expires =
        Some(Utc::now() + Duration::minutes(config().security.reset_token_expiry_minutes));
    save(store, &principal).await?;

    let link = format!(
        "{}/api/users/reset-password/{}",
        config().mail.base_url,
        raw_secret
    );
    let message = MailMessage {
        to: principal.email.clone(),
        subject: "Your password reset token (valid for 15 minutes)".to_string(),
        text: format!(
            "Forgot your password? Submit your new password to: {link}\n\
             If you didn't forget your password, please ignore this email."
        ),
        html: None,
    };

    if let Err(err) = mailer.send(message).await {
        principal.reset_token_hash = None;
        principal.reset_token_expires = None;
        save(store, &principal).await?;
        return Err(err.into());
    }
    Ok(())
}

/// Redeem a raw secret: rotate the password, stamp the change, clear the
/// token. Unknown, expired, and already-used secrets all fail the same way.
pub async fn redeem(
    store: &dyn Store,
    raw_secret: &str,
    new_password: &str,
) -> Result<Principal, ApiError> {
    let digest = hash_reset_secret(raw_secret);
    let doc = store
        .find_one(
            "users",
            &[Condition::eq("reset_token_hash", Value::String(digest))],
        )
        .await?;
    let Some(doc) = doc else {
        return Err(ApiError::reset_token_invalid(
            "Reset token is invalid or has expired",
        ));
    };
    let mut principal =
        Principal::from_document(doc).map_err(crate::store::StoreError::Serialization)?;

    match principal.reset_token_expires {
        Some(expires) if expires > Utc::now() => {}
        _ => {
            return Err(ApiError::reset_token_invalid(
                "Reset token is invalid or has expired",
            ))
        }
    }

    principal.password_hash = super::hash_password(new_password)?;
    principal.pass_changed_at = Some(stamp_password_change());
    principal.reset_token_hash = None;
    principal.reset_token_expires = None;
    save(store, &principal).await?;
    Ok(principal)
}

/// Password-change timestamp, backdated one second so a token issued in the
/// same second as the change still reads as stale.
pub fn stamp_password_change() -> chrono::DateTime<Utc> {
    Utc::now() - Duration::seconds(1)
}

/// Fetch an account by id, for flows that already authenticated the caller.
pub async fn load_principal(store: &dyn Store, id: Uuid) -> Result<Option<Principal>, ApiError> {
    let doc = store.find_by_id("users", id).await?;
    match doc {
        Some(doc) => Ok(Some(
            Principal::from_document(doc).map_err(crate::store::StoreError::Serialization)?,
        )),
        None => Ok(None),
    }
}

/// Persist an updated account document.
pub async fn save_principal(store: &dyn Store, principal: &Principal) -> Result<(), ApiError> {
    save(store, principal).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::mail::MockMailer;
    use crate::store::{Document, MemoryStore};
    use serde_json::json;

    async fn seed_account(store: &MemoryStore, email: &str) -> Uuid {
        let doc: Document = match json!({
            "name": "Lena",
            "email": email,
            "photo": "defaultpic.webp",
            "role": "user",
            "active": true,
            "password": crate::auth::hash_password("original-pass").unwrap(),
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let saved = store.insert("users", doc).await.unwrap();
        saved["id"].as_str().unwrap().parse().unwrap()
    }

    fn extract_secret(mail_text: &str) -> String {
        let marker = "/api/users/reset-password/";
        let start = mail_text.find(marker).unwrap() + marker.len();
        mail_text[start..start + 64].to_string()
    }

    #[tokio::test]
    async fn issue_mails_the_raw_secret_and_stores_only_the_digest() {
        let store = MemoryStore::with_default_indexes();
        let mailer = MockMailer::new();
        let id = seed_account(&store, "lena@example.test").await;

        issue(&store, &mailer, "lena@example.test").await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let raw = extract_secret(&sent[0].text);

        let principal = load_principal(&store, id).await.unwrap().unwrap();
        let stored = principal.reset_token_hash.unwrap();
        assert_ne!(stored, raw);
        assert_eq!(stored, hash_reset_secret(&raw));
    }

    #[tokio::test]
    async fn issue_for_unknown_email_is_not_found() {
        let store = MemoryStore::with_default_indexes();
        let mailer = MockMailer::new();
        let err = issue(&store, &mailer, "ghost@example.test")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_rolls_back_the_stored_token() {
        let store = MemoryStore::with_default_indexes();
        let mailer = MockMailer::new();
        let id = seed_account(&store, "lena@example.test").await;

        mailer.fail_next();
        let err = issue(&store, &mailer, "lena@example.test")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);

        let principal = load_principal(&store, id).await.unwrap().unwrap();
        assert!(principal.reset_token_hash.is_none());
        assert!(principal.reset_token_expires.is_none());
    }

    #[tokio::test]
    async fn redeem_rotates_password_and_is_single_use() {
        let store = MemoryStore::with_default_indexes();
        let mailer = MockMailer::new();
        seed_account(&store, "lena@example.test").await;

        issue(&store, &mailer, "lena@example.test").await.unwrap();
        let raw = extract_secret(&mailer.sent()[0].text);

        let principal = redeem(&store, &raw, "brand-new-pass").await.unwrap();
        assert!(verify_password("brand-new-pass", &principal.password_hash));
        assert!(principal.pass_changed_at.is_some());
        assert!(principal.reset_token_hash.is_none());

        let err = redeem(&store, &raw, "another-pass").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn expired_secret_is_rejected() {
        let store = MemoryStore::with_default_indexes();
        let id = seed_account(&store, "lena@example.test").await;

        let raw = generate_reset_secret();
        let mut principal = load_principal(&store, id).await.unwrap().unwrap();
        principal.reset_token_hash = Some(hash_reset_secret(&raw));
        principal.reset_token_expires = Some(Utc::now() - Duration::minutes(1));
        save_principal(&store, &principal).await.unwrap();

        let err = redeem(&store, &raw, "new-pass").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let store = MemoryStore::with_default_indexes();
        let mailer = MockMailer::new();
        seed_account(&store, "lena@example.test").await;
        issue(&store, &mailer, "lena@example.test").await.unwrap();

        let err = redeem(&store, &generate_reset_secret(), "new-pass")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
