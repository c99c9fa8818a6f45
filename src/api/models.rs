// Wire types for the metadata inference endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body returned by the metadata guess endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<GuessData>,
    #[serde(default)]
    pub has_metadata: bool,
    #[serde(default)]
    pub message: String,
}

/// Tag values the server read from the upload. Any field may be missing, and
/// a tag that isn't a string is treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuessData {
    #[serde(default, deserialize_with = "string_only")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub genre: Option<String>,
    /// Seconds, or whatever the server sent when it isn't a number.
    #[serde(default)]
    pub duration: Option<Value>,
}

impl GuessData {
    pub fn duration_secs(&self) -> Option<f64> {
        match self.duration.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
