use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One extracted record. The domain fields depend on which prompt template
/// produced it, so everything past the provenance and scoring block lives in
/// `fields`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deal {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_relevant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_it_matters: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl Deal {
    /// Relevance score as a number; the extractor emits either JSON numbers
    /// or numeric strings.
    pub fn score(&self) -> Option<f64> {
        match self.relevance_score.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn score_band(&self) -> Option<ScoreBand> {
        let score = self.score()?;
        Some(if score >= 0.90 {
            ScoreBand::High
        } else if score >= 0.70 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        })
    }

    /// Parsed publication timestamp, or `None` when missing or unparsable.
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        parse_published(self.published_date.as_deref()?)
    }

    /// Raw value of a template-dependent field. Provenance fields are served
    /// from their typed slots so callers can address every column by name.
    pub fn field(&self, name: &str) -> Option<Value> {
        let text = |s: &str| Some(Value::String(s.to_string()));
        match name {
            "source" => text(&self.source),
            "url" => text(&self.url),
            "title" => text(&self.title),
            "published_date" => self.published_date.as_deref().and_then(text),
            "section" => self.section.as_deref().and_then(text),
            "is_relevant" => Some(Value::Bool(self.is_relevant)),
            "relevance_score" => self.relevance_score.clone(),
            "summary" => self.summary.as_deref().and_then(text),
            "why_it_matters" => self.why_it_matters.as_deref().and_then(text),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Field rendered for a table cell, `-` when absent.
    pub fn display_field(&self, name: &str) -> String {
        match self.field(name) {
            Some(value) => display_value(&value),
            None => "-".to_string(),
        }
    }

    /// Field as plain text when it is a JSON string.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Flattens a loosely typed extractor value into one line of text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => "-".to_string(),
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => {
            for key in ["name", "company"] {
                if let Some(Value::String(s)) = map.get(key) {
                    if !s.is_empty() {
                        return s.clone();
                    }
                }
            }
            if let (Some(amount), Some(Value::String(currency))) =
                (map.get("amount"), map.get("currency"))
            {
                if !amount.is_null() {
                    return format!("{} {}", display_value(amount), currency);
                }
            }
            map.values()
                .find_map(|v| v.as_str().map(ToOwned::to_owned))
                .unwrap_or_else(|| value.to_string())
        }
    }
}

/// Orders deals newest first. Deals without a usable date sink to the end;
/// ties keep their received order.
pub fn sort_newest_first(deals: &mut [Deal]) {
    deals.sort_by_cached_key(|deal| Reverse(deal.published_at()));
}

fn parse_published(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
