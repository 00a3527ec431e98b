//! Nested payload shapes and lenient value normalization.
//!
//! The backend clamps numeric fields when it builds events; the helpers here
//! apply the same bounds on receipt so the rest of the crate can rely on them.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Message used when `METADATA_CONFIRMED` arrives without one.
pub const DEFAULT_CONFIRMED_MESSAGE: &str = "Metadata updated successfully.";

/// Longest cool-down accepted from `NET_RATE_LIMITED`: one day.
pub const MAX_RETRY_AFTER_SECS: u64 = 24 * 60 * 60;

/// One field the backend asks the user to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Why the field is needed ("Missing or low confidence")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Pre-filled guess extracted from the document, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A retrieved passage cited by the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "fileName")]
    pub filename: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "company_document_id",
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub company_doc_id: Option<String>,
    #[serde(
        default,
        alias = "revision_number",
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Coarse answer confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

pub(crate) fn default_confirmed_message() -> String {
    DEFAULT_CONFIRMED_MESSAGE.to_string()
}

/// `null` or empty falls back to the default confirmation text.
pub(crate) fn confirmed_message<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let message = Option::<String>::deserialize(deserializer)?;
    Ok(message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(default_confirmed_message))
}

/// Any JSON number, clamped to 0..=100 and rounded.
pub(crate) fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

/// Any JSON number, clamped to 0.0..=1.0.
pub(crate) fn unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 1.0))
}

/// Seconds to wait, between one second and [`MAX_RETRY_AFTER_SECS`].
pub(crate) fn retry_after<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().max(1.0).min(MAX_RETRY_AFTER_SECS as f64) as u64)
}

pub(crate) fn stage_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_lowercase())
}

fn value_to_string<E: de::Error>(value: serde_json::Value) -> Result<String, E> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!("expected string or number, got {}", other))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    value_to_string(serde_json::Value::deserialize(deserializer)?)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => value_to_string(value).map(Some),
    }
}
