//! # Clients
//!
//! Customer records referenced by sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::double_option;
use crate::types::RecordStatus;
use crate::validation::{
    validate_document_id, validate_full_name, validate_phone, ValidationResult,
};

/// A store customer. Phone and document id are unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub address: Option<String>,
    /// National identity document number.
    pub document_id: String,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn deactivate(&mut self) {
        self.status = RecordStatus::Inactive;
    }

    pub fn restore(&mut self) {
        self.status = RecordStatus::Active;
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_full_name(&self.full_name)?;
        validate_phone(&self.phone)?;
        validate_document_id(&self.document_id)
    }
}

/// Creation payload for a client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewClient {
    pub full_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub document_id: String,
}

impl NewClient {
    pub fn into_client(self, now: DateTime<Utc>) -> ValidationResult<Client> {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.map(|a| a.trim().to_string()),
            document_id: self.document_id.trim().to_uppercase(),
            status: RecordStatus::Active,
            created_at: now,
        };
        client.validate()?;
        Ok(client)
    }
}

/// Partial update of a client. See [`crate::catalog::ProductPatch`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default, with = "double_option")]
    #[ts(as = "Option<String>")]
    pub address: Option<Option<String>>,
    pub document_id: Option<String>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.document_id.is_none()
    }

    /// Applies present fields, then validates the merged record.
    pub fn apply(&self, client: &mut Client) -> ValidationResult<()> {
        let mut merged = client.clone();

        if let Some(name) = &self.full_name {
            merged.full_name = name.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            merged.phone = phone.trim().to_string();
        }
        if let Some(address) = &self.address {
            merged.address = address.as_ref().map(|a| a.trim().to_string());
        }
        if let Some(document_id) = &self.document_id {
            merged.document_id = document_id.trim().to_uppercase();
        }

        merged.validate()?;
        *client = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Client {
        NewClient {
            full_name: "Maria Quispe".to_string(),
            phone: "71234567".to_string(),
            address: Some("Av. Busch 123".to_string()),
            document_id: "8456123lp".to_string(),
        }
        .into_client(Utc::now())
        .unwrap()
    }

    #[test]
    fn test_new_client_normalizes_document_id() {
        assert_eq!(sample().document_id, "8456123LP");
    }

    #[test]
    fn test_new_client_requires_phone() {
        let result = NewClient {
            full_name: "Maria Quispe".to_string(),
            phone: "".to_string(),
            address: None,
            document_id: "123".to_string(),
        }
        .into_client(Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let mut client = sample();
        let patch = ClientPatch {
            phone: Some("76543210".to_string()),
            ..Default::default()
        };
        patch.apply(&mut client).unwrap();
        assert_eq!(client.phone, "76543210");
        assert_eq!(client.full_name, "Maria Quispe");
        assert_eq!(client.address.as_deref(), Some("Av. Busch 123"));
    }

    #[test]
    fn test_invalid_patch_is_rejected_whole() {
        let mut client = sample();
        let patch = ClientPatch {
            full_name: Some("Otra Persona".to_string()),
            phone: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(patch.apply(&mut client).is_err());
        assert_eq!(client.full_name, "Maria Quispe");
    }

    #[test]
    fn test_deactivate_restore() {
        let mut client = sample();
        client.deactivate();
        assert!(!client.is_active());
        client.restore();
        assert!(client.is_active());
    }

    #[test]
    fn test_patch_binding_clears_with_null() {
        let decl = ClientPatch::decl();
        assert!(decl.contains("address: string | null"), "{}", decl);
    }
}
