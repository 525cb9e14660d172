//! Management-API resource types and the derivations applied to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::Secret;
use crate::error::Error;

/// Bytes per MiB.
pub const MIB: u64 = 1_048_576;

/// Smallest capacity the gateway accepts, in bytes.
pub const MIN_CAPACITY_BYTES: u64 = MIB;

/// Derives a URL-safe slug from a display name.
///
/// Lowercases, turns whitespace and underscores into hyphens, then drops
/// every character outside `[a-z0-9-]`. The result can be empty; callers
/// that need a slug must reject that.
///
/// ```rust
/// use redisgate_harness::slugify;
///
/// assert_eq!(slugify("Acme Labs_QA"), "acme-labs-qa");
/// assert_eq!(slugify("Café!"), "caf");
/// ```
pub fn slugify(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Converts a capacity in whole MiB to bytes, never below 1 MiB.
///
/// ```rust
/// use redisgate_harness::capacity_bytes;
///
/// assert_eq!(capacity_bytes(0), 1_048_576);
/// assert_eq!(capacity_bytes(256), 268_435_456);
/// ```
pub fn capacity_bytes(mib: u64) -> u64 {
    mib.saturating_mul(MIB).max(MIN_CAPACITY_BYTES)
}

/// Derives a slug and rejects names that leave nothing behind.
pub(crate) fn required_slug(name: &str) -> Result<String, Error> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(Error::validation(format!(
            "name {:?} has no characters usable in a slug",
            name
        )));
    }
    Ok(slug)
}

/// Ids arrive as UUID strings from the gateway but as numbers from some
/// fakes. Both are kept as strings.
pub(crate) mod id_string {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User ID.
    #[serde(deserialize_with = "id_string::deserialize")]
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Username.
    #[serde(default)]
    pub username: String,
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID.
    #[serde(deserialize_with = "id_string::deserialize")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL-safe projection of the name.
    #[serde(default)]
    pub slug: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// ID of the owning user.
    #[serde(default, deserialize_with = "id_string::deserialize_option")]
    pub owner_id: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of a data instance.
///
/// The gateway reports freshly created instances as `creating` and serving
/// ones as `running`; both spellings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Provisioning has not finished.
    #[default]
    #[serde(alias = "creating")]
    Pending,
    /// Serving requests.
    #[serde(alias = "running")]
    Active,
    /// Deleted (soft-deleted instances stay listable).
    Deleted,
    /// A status this harness does not know.
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Returns `true` if the instance may move from `self` to `next`.
    ///
    /// Transitions only go forward: pending, then active, then deleted.
    pub fn can_transition_to(self, next: InstanceStatus) -> bool {
        use InstanceStatus::*;
        matches!(
            (self, next),
            (Pending, Active) | (Pending, Deleted) | (Active, Deleted)
        ) || self == next
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceStatus::Pending => "pending",
            InstanceStatus::Active => "active",
            InstanceStatus::Deleted => "deleted",
            InstanceStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A data instance owned by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInstance {
    /// Instance ID, used in data-plane paths.
    #[serde(deserialize_with = "id_string::deserialize")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL-safe projection of the name.
    #[serde(default)]
    pub slug: String,
    /// Owning organization.
    #[serde(default, deserialize_with = "id_string::deserialize")]
    pub organization_id: String,
    /// Memory capacity in bytes.
    #[serde(rename = "max_memory", default)]
    pub capacity: u64,
    /// Lifecycle state.
    #[serde(default)]
    pub status: InstanceStatus,
    /// Data-plane URL, when the gateway reports one.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Scope granted to an access credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `redis:read`
    Read,
    /// `redis:write`
    Write,
    /// `redis:admin`
    Admin,
    /// Any other scope string.
    Custom(String),
}

impl Scope {
    /// The read/write/admin set used for full data-plane access.
    pub fn all() -> Vec<Scope> {
        vec![Scope::Read, Scope::Write, Scope::Admin]
    }

    /// Returns the wire form of the scope.
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Read => "redis:read",
            Scope::Write => "redis:write",
            Scope::Admin => "redis:admin",
            Scope::Custom(s) => s,
        }
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        match s {
            "redis:read" => Scope::Read,
            "redis:write" => Scope::Write,
            "redis:admin" => Scope::Admin,
            other => Scope::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Scope::from(s.as_str()))
    }
}

/// An access credential (API key) without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential {
    /// Credential ID.
    #[serde(deserialize_with = "id_string::deserialize")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Non-secret prefix of the key, e.g. `rg_1a2b3c4d`.
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Owning organization.
    #[serde(default, deserialize_with = "id_string::deserialize")]
    pub organization_id: String,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<Scope>,
    /// Whether the key is still usable.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Expiry, if any.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// A freshly created credential together with its one-time secret.
///
/// The secret is only returned at creation and cannot be fetched again.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// The credential record.
    pub credential: AccessCredential,
    /// The secret used to authenticate data-plane calls.
    pub secret: Secret,
}

impl IssuedCredential {
    /// Parses a creation payload.
    ///
    /// Accepts `{"api_key": {...}, "key": "..."}` as well as a flat record
    /// carrying `key` (or `secret`/`token`) next to the credential fields.
    pub(crate) fn from_payload(payload: Value) -> Result<Self, Error> {
        let Value::Object(mut map) = payload else {
            return Err(Error::invalid_response(
                "credential creation payload is not an object",
            ));
        };

        let secret = ["key", "secret", "token"]
            .iter()
            .find_map(|field| match map.remove(*field) {
                Some(Value::String(s)) if !s.is_empty() => Some(s),
                _ => None,
            })
            .ok_or_else(|| Error::invalid_response("credential creation payload has no secret"))?;

        let record = match map.remove("api_key") {
            Some(nested @ Value::Object(_)) => nested,
            _ => Value::Object(map),
        };
        let credential: AccessCredential = crate::client::inner::decode(record)?;

        Ok(Self {
            credential,
            secret: Secret::new(secret),
        })
    }
}

/// Decodes a list payload: a bare array or a paginated `{"items": [...]}`.
pub(crate) fn decode_list<T>(payload: Value) -> Result<Vec<T>, Error>
where
    T: serde::de::DeserializeOwned,
{
    let items = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => match map.remove("items") {
            Some(items @ Value::Array(_)) => items,
            _ => {
                return Err(Error::invalid_response(
                    "list payload has no items array",
                ));
            }
        },
        Value::Null => return Ok(Vec::new()),
        _ => return Err(Error::invalid_response("list payload is not an array")),
    };
    crate::client::inner::decode(items)
}
