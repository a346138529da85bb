//! Survey document model
//!
//! The input is a trusted, already-shaped JSON document produced elsewhere:
//!
//! ```text
//! {
//!   "results": {
//!     "raw_survey": { "topic": "..." },
//!     "total_summary": "...",
//!     "suggestion": "...",
//!     "stats": [{ "question": "...", "answer": { "label": 12 }, "summary": "..." }]
//!   },
//!   "interviewer_records": [{
//!     "consumer": { "name": "...", "age": 27, "gender": "female", "region": "...", "description": "..." },
//!     "cn_data": [{ "q": "...", "a": "..." }],
//!     "summary": "..."
//!   }]
//! }
//! ```
//!
//! Parsing degrades instead of failing: absent collections become empty,
//! malformed elements are skipped, and non-numeric answer counts are kept as
//! `None` so the chart shaper can coerce them to zero.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReportError, Result};

/// Root of a loaded survey document. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyDocument {
    pub topic: Option<String>,
    pub total_summary: Option<String>,
    pub suggestion: Option<String>,
    pub stats: Vec<QuestionStat>,
    pub interviews: Vec<InterviewRecord>,
}

/// Aggregated answers for one survey question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionStat {
    pub question: String,
    /// Markdown summary authored for this question
    pub summary: String,
    /// Answer options in authoring order (not display order)
    pub answers: Vec<Answer>,
}

/// One answer option and its recorded count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub label: String,
    /// `None` when the raw value was not a number
    pub count: Option<f64>,
}

impl Answer {
    pub fn new(label: impl Into<String>, count: f64) -> Self {
        Self {
            label: label.into(),
            count: Some(count),
        }
    }

    /// Count coerced to a non-negative finite number
    pub fn value(&self) -> f64 {
        match self.count {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => 0.0,
        }
    }
}

/// A simulated interview with one consumer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    #[serde(default, deserialize_with = "lenient_object")]
    pub consumer: Consumer,
    #[serde(
        default,
        rename(deserialize = "cn_data"),
        deserialize_with = "lenient_exchanges"
    )]
    pub exchanges: Vec<Exchange>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
}

/// Interviewee profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_gender")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

/// One question/answer pair of an interview transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    #[serde(default, rename(deserialize = "q"), deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default, rename(deserialize = "a"), deserialize_with = "lenient_string")]
    pub answer: String,
}

// =============================================================================
// Raw input shape
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawResponse {
    #[serde(default, deserialize_with = "lenient_object")]
    results: RawResults,
    #[serde(default)]
    interviewer_records: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawResults {
    #[serde(default, deserialize_with = "lenient_object")]
    raw_survey: RawSurvey,
    #[serde(default, deserialize_with = "lenient_text")]
    total_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    suggestion: Option<String>,
    #[serde(default)]
    stats: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawSurvey {
    #[serde(default, deserialize_with = "lenient_text")]
    topic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStat {
    #[serde(default, deserialize_with = "lenient_string")]
    question: String,
    #[serde(default)]
    answer: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    summary: Option<String>,
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

/// Strings stay, anything else (null included) becomes `None`
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// A nested object that fails to parse falls back to its default
fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("unexpected object shape, using defaults: {}", e);
        T::default()
    }))
}

fn lenient_exchanges<'de, D>(deserializer: D) -> std::result::Result<Vec<Exchange>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(elements(value, "cn_data")
        .filter_map(|v| match serde_json::from_value::<Exchange>(v) {
            Ok(exchange) => Some(exchange),
            Err(e) => {
                tracing::warn!("skipping malformed exchange: {}", e);
                None
            }
        })
        .collect())
}

fn lenient_gender<'de, D>(deserializer: D) -> std::result::Result<Gender, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("male") => Gender::Male,
        Some("female") => Gender::Female,
        _ => Gender::Other,
    })
}

impl SurveyDocument {
    /// Parse a document from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    /// Read and parse a document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = Self::from_json_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            stats = doc.stats.len(),
            interviews = doc.interviews.len(),
            "loaded survey document"
        );
        Ok(doc)
    }

    /// Build a document from an already-parsed JSON value
    pub fn from_value(value: Value) -> Self {
        let raw: RawResponse = serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("unexpected document shape, rendering empty report: {}", e);
            RawResponse::default()
        });

        let stats = elements(raw.results.stats, "stats")
            .filter_map(|v| match serde_json::from_value::<RawStat>(v) {
                Ok(stat) => Some(QuestionStat::from_raw(stat)),
                Err(e) => {
                    tracing::warn!("skipping malformed stat: {}", e);
                    None
                }
            })
            .collect();

        let interviews = elements(raw.interviewer_records, "interviewer_records")
            .filter_map(|v| match serde_json::from_value::<InterviewRecord>(v) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("skipping malformed interview record: {}", e);
                    None
                }
            })
            .collect();

        Self {
            topic: raw.results.raw_survey.topic,
            total_summary: raw.results.total_summary,
            suggestion: raw.results.suggestion,
            stats,
            interviews,
        }
    }
}

impl QuestionStat {
    fn from_raw(raw: RawStat) -> Self {
        let answers = match raw.answer {
            Value::Object(map) => map
                .into_iter()
                .map(|(label, count)| Answer {
                    label,
                    count: count.as_f64(),
                })
                .collect(),
            Value::Null => Vec::new(),
            other => {
                tracing::warn!(question = %raw.question, "answer is not an object: {}", other);
                Vec::new()
            }
        };

        Self {
            question: raw.question,
            summary: raw.summary.unwrap_or_default(),
            answers,
        }
    }
}

/// Array elements of `value`, or nothing when it is absent or not an array
fn elements(value: Value, field: &str) -> impl Iterator<Item = Value> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        _ => {
            tracing::warn!("`{}` is not an array, treating as empty", field);
            Vec::new()
        }
    };
    items.into_iter()
}
