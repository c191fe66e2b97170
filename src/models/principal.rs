use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

/// An authenticated account, as stored in the `users` collection.
///
/// The password hash and reset-token fields never leave the server; use
/// [`Principal::public_json`] for anything that goes into a response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
    pub active: bool,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_changed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_expires: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }

    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => unreachable!("struct serializes to an object"),
        }
    }

    /// Response-safe view: credentials and reset state stripped.
    pub fn public_json(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "photo": self.photo,
            "role": self.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Document {
        match json!({
            "id": "7f2c0a4e-9a50-4e8a-8a51-0d1a3f6b2c9d",
            "name": "Lena",
            "email": "lena@example.test",
            "photo": "defaultpic.webp",
            "role": "lead-guide",
            "active": true,
            "password": "$argon2id$stub",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn deserializes_kebab_case_roles() {
        let principal = Principal::from_document(sample_doc()).unwrap();
        assert_eq!(principal.role, Role::LeadGuide);
        assert!(principal.pass_changed_at.is_none());
    }

    #[test]
    fn public_json_strips_credentials() {
        let principal = Principal::from_document(sample_doc()).unwrap();
        let public = principal.public_json();
        assert!(public.get("password").is_none());
        assert!(public.get("reset_token_hash").is_none());
        assert_eq!(public["email"], json!("lena@example.test"));
    }

    #[test]
    fn document_round_trip_keeps_password_under_its_storage_key() {
        let principal = Principal::from_document(sample_doc()).unwrap();
        let doc = principal.to_document().unwrap();
        assert_eq!(doc["password"], json!("$argon2id$stub"));
        assert!(doc.get("password_hash").is_none());
    }
}
