//! Typed schemas for the remote JSON API.
//!
//! Every operation shares one envelope: `{objects, message, code}` with
//! `code == 0` denoting success and `objects` keyed by qualified object
//! key (for example `Team::42`). Responses are decoded into explicit
//! per-operation field structs; anything that does not fit surfaces as
//! `SyncError::MalformedResponse` instead of a silently absent value.

use crate::utils::error::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// An object identifier as the remote system returns it. Some
/// deployments emit numeric ids, some strings; both decode to a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(serde_json::Number),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => Ok(ObjectId(s)),
            Raw::Num(n) => match n.as_i64() {
                Some(i) => Ok(ObjectId(i.to_string())),
                None => Ok(ObjectId(n.to_string())),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiObject<F> {
    pub fields: F,
}

/// Common response envelope for all remote operations.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<F> {
    // A missing or null `objects` field both decode to None; no
    // serde(default) here, it would demand F: Default.
    pub objects: Option<HashMap<String, ApiObject<F>>>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i64,
}

impl<F: DeserializeOwned> ApiEnvelope<F> {
    pub fn parse(operation: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::MalformedResponse {
            operation: operation.to_string(),
            detail: e.to_string(),
        })
    }
}

impl<F> ApiEnvelope<F> {
    pub fn ensure_ok(&self, operation: &str) -> Result<()> {
        if self.code != 0 {
            return Err(SyncError::Api {
                operation: operation.to_string(),
                code: self.code,
                message: self.message.clone(),
            });
        }
        Ok(())
    }

    /// Fields of all returned objects, qualified keys dropped.
    pub fn into_fields(self) -> Vec<F> {
        self.objects
            .unwrap_or_default()
            .into_values()
            .map(|o| o.fields)
            .collect()
    }

    /// Fields of the object with the given qualified key.
    pub fn take_object(&mut self, key: &str) -> Option<F> {
        self.objects.as_mut()?.remove(key).map(|o| o.fields)
    }
}

/// `core/get` on `Team` with `output_fields: "id,name"`.
#[derive(Debug, Deserialize)]
pub struct TeamFields {
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
}

/// `core/get` on `User` with `output_fields: "contactid,login,email"`.
#[derive(Debug, Deserialize)]
pub struct UserFields {
    #[serde(rename = "contactid")]
    pub contact_id: ObjectId,
}

/// One membership entry. Only `person_id` and `role_id` survive a read,
/// because the remote API rejects its own read-only fields on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonLink {
    pub person_id: ObjectId,
    #[serde(default)]
    pub role_id: ObjectId,
}

/// `core/get`/`core/update` on `Team` touching `persons_list`.
#[derive(Debug, Deserialize)]
pub struct TeamMembersFields {
    #[serde(default)]
    pub persons_list: Option<Vec<PersonLink>>,
}

impl TeamMembersFields {
    pub fn into_members(self) -> Vec<PersonLink> {
        self.persons_list.unwrap_or_default()
    }
}

/// Qualified object key used by the envelope's `objects` map.
pub fn team_key(team_id: &str) -> String {
    format!("Team::{}", team_id)
}
