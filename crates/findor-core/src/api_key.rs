use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Prefix carried by keys in the long format. Those are masked with an
/// eight character head instead of the generic `sk` stub.
pub const LONG_KEY_PREFIX: &str = "qsk-";

const SHORT_MASK_PREFIX: &str = "sk";

/// A key as the dashboard knows it.
///
/// `id` and `name` are local only: the backend identifies a key solely by
/// its secret, so both are reassigned every time the list is refetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub secret: String,
    pub created_at: String,
}

impl ApiKey {
    /// A key that was just returned by the create endpoint, labelled with
    /// the name the user typed.
    pub fn from_created(name: &str, created: &CreatedApiKey) -> Self {
        let created_at = DateTime::from_timestamp(created.created_at, 0)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| created.created_at.to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            secret: created.secret.clone(),
            created_at,
        }
    }

    /// Convert a list response into display keys, preserving backend order.
    /// Names are placeholders since the backend never stores them.
    pub fn from_list(items: Vec<ApiKeyListItem>) -> Vec<Self> {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| Self {
                id: Uuid::new_v4().to_string(),
                name: format!("API Key {}", idx + 1),
                secret: item.key,
                created_at: item.created_at,
            })
            .collect()
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }

    pub fn created_on(&self) -> String {
        format_created_date(&self.created_at)
    }
}

/// Redacted form of a secret for list display. Cosmetic only.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    if secret.starts_with(LONG_KEY_PREFIX) {
        let head: String = chars.iter().take(8).collect();
        format!("{head}...{tail}")
    } else {
        format!("{SHORT_MASK_PREFIX}...{tail}")
    }
}

/// Render a backend timestamp as e.g. `Jan 1, 2024`.
///
/// Accepts RFC 3339, naive ISO date-times, plain dates and unix seconds.
/// Anything else is returned unchanged.
pub fn format_created_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .or_else(|| {
            raw.parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| dt.date_naive())
        });

    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

// -- Wire types for the remote key service --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteKeyRequest {
    pub email: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub secret: String,
    /// Unix seconds. Fractional values are floored.
    #[serde(deserialize_with = "unix_seconds")]
    pub created_at: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_code: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnixSeconds {
    Whole(i64),
    Fractional(f64),
}

fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match UnixSeconds::deserialize(deserializer)? {
        UnixSeconds::Whole(secs) => secs,
        UnixSeconds::Fractional(secs) => secs.floor() as i64,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyListItem {
    pub key: String,
    pub created_at: String,
}
