use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification emitted when a membership becomes active.
///
/// Wire format is a flat JSON object with camelCase keys:
///
/// ```json
/// {
///   "membershipId": "de98f01b-7f7a-474d-a98c-12015e35df27",
///   "userId": "df1ed9e9-1e85-4bba-a8ef-78ffe391e123",
///   "activationDate": "2025-06-01T09:30:00.000000+00:00",
///   "membershipType": "Premium"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationMessage {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "utc_timestamp")]
    pub activation_date: DateTime<Utc>,
    pub membership_type: String,
}

impl NotificationMessage {
    pub fn new(
        membership_id: Uuid,
        user_id: Uuid,
        activation_date: DateTime<Utc>,
        membership_type: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let message = Self {
            membership_id,
            user_id,
            activation_date,
            membership_type: membership_type.into(),
        };
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        if self.membership_type.trim().is_empty() {
            return Err(ContractError::EmptyMembershipType);
        }
        Ok(())
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::Serialization(e.to_string()))
    }

    pub fn to_pretty_json(&self) -> Result<String, ContractError> {
        serde_json::to_string_pretty(self).map_err(|e| ContractError::Serialization(e.to_string()))
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ContractError> {
        let message: Self = serde_json::from_slice(bytes)
            .map_err(|e| ContractError::Deserialization(e.to_string()))?;
        message.validate()?;
        Ok(message)
    }
}

// RFC 3339 with microseconds and an explicit `+00:00` offset rather than `Z`.
mod utc_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("membershipType must not be empty")]
    EmptyMembershipType,

    #[error("Failed to serialize notification: {0}")]
    Serialization(String),

    #[error("Failed to deserialize notification: {0}")]
    Deserialization(String),
}
