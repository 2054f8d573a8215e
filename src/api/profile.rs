// Free Fire player info API client
// Every section and field is optional; callers render fallbacks.

use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// One JSON object section of the profile response
#[derive(Debug, Clone, Default)]
pub struct Section(Option<Map<String, Value>>);

// Anything other than an object (`[]`, `""`, `null`) counts as a missing section
impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Section(Some(map))),
            _ => Ok(Section(None)),
        }
    }
}

impl Section {
    /// Whether the API returned a non-empty object for this section
    pub fn is_present(&self) -> bool {
        self.0.as_ref().is_some_and(|m| !m.is_empty())
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        self.0.as_ref()?.get(key).filter(|v| !v.is_null())
    }

    /// Field rendered as text, or `fallback` when missing
    pub fn text(&self, key: &str, fallback: &str) -> String {
        match self.raw(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => other.to_string(),
            None => fallback.to_string(),
        }
    }

    /// Numeric field, accepting numbers or numeric strings
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.raw(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.raw(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }
}

/// Player profile as returned by the info API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    #[serde(default)]
    pub basic_info: Section,
    #[serde(default)]
    pub captain_basic_info: Section,
    #[serde(default)]
    pub clan_basic_info: Section,
    #[serde(default)]
    pub credit_score_info: Section,
    #[serde(default)]
    pub pet_info: Section,
    #[serde(default)]
    pub profile_info: Section,
    #[serde(default)]
    pub social_info: Section,
}

/// Fetch a player's profile. `Ok(None)` means the player doesn't exist.
pub async fn fetch_profile(
    client: &reqwest::Client,
    api_url: &str,
    uid: &str,
) -> Result<Option<PlayerProfile>> {
    debug!("Fetching profile for uid {}", uid);

    let response = client.get(api_url).query(&[("uid", uid)]).send().await?;

    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => Ok(Some(response.json().await?)),
        status => {
            let body = response.text().await.unwrap_or_default();
            error!("Profile API error: status={}, body={}", status, body);
            Err(anyhow!("profile API returned {}", status))
        }
    }
}

/// URL of the rendered profile card image
pub fn card_url(card_api_url: &str, uid: &str) -> String {
    format!("{}?uid={}", card_api_url, uid)
}
