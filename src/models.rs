use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender used by the terminal client for its own messages
pub const LOCAL_SENDER: &str = "me";
/// Sender of the synthetic echo reply
pub const SERVER_SENDER: &str = "server";
/// Sender recorded when a post omits one
pub const DEFAULT_SENDER: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn is_from_me(&self) -> bool {
        self.sender == LOCAL_SENDER
    }
}

/// Body of `POST /api/chat/messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl NewMessage {
    pub fn new(text: &str, sender: &str) -> Self {
        NewMessage {
            text: Some(text.to_string()),
            sender: Some(sender.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: u32,
    pub name: String,
    pub avatar: String,
    pub status: String,
    pub last_message: String,
}

impl Contact {
    pub fn first_name(&self) -> &str {
        self.name.split(' ').next().unwrap_or(&self.name)
    }
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix on the way
/// out; any RFC 3339 string on the way in.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}
