//! Artifact classification and decoding
//!
//! Takes the fully assembled response text from one generation call
//! and produces exactly one [`Artifact`]. Model output is unreliable
//! input: [`decode_artifact`] is a total function that degrades to
//! [`Artifact::Chat`] on anything it cannot classify, and never panics
//! or errors.

use serde::Serialize;
use serde_json::Value;

/// Placeholder title for artifacts whose source omits one
const UNTITLED: &str = "Untitled";

/// One slide of a presentation artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slide {
    pub title: String,
    pub html_content: String,
}

/// One step of a plan artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub description: String,
}

/// A decoded generation result
///
/// Every variant except `Chat` carries a non-empty title; when the
/// source omits one, the fixed placeholder "Untitled" is substituted,
/// never a derived guess. `Document` and `Slide` HTML content is
/// passed through from model output unsanitized; rendering layers are
/// responsible for sanitizing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Chat {
        text: String,
        suggested_questions: Vec<String>,
    },
    Document {
        title: String,
        html_content: String,
        suggested_questions: Vec<String>,
    },
    Presentation {
        title: String,
        slides: Vec<Slide>,
        suggested_questions: Vec<String>,
    },
    Spreadsheet {
        title: String,
        columns: Vec<String>,
        /// Rows may be ragged: row lengths are not reconciled with
        /// `columns` in either direction.
        rows: Vec<Vec<String>>,
        suggested_questions: Vec<String>,
    },
    Code {
        title: String,
        language: String,
        content: String,
        suggested_questions: Vec<String>,
    },
    Plan {
        summary: String,
        steps: Vec<PlanStep>,
        suggested_questions: Vec<String>,
    },
}

impl Artifact {
    /// Follow-up prompts the model proposed alongside the artifact
    pub fn suggested_questions(&self) -> &[String] {
        match self {
            Artifact::Chat {
                suggested_questions,
                ..
            }
            | Artifact::Document {
                suggested_questions,
                ..
            }
            | Artifact::Presentation {
                suggested_questions,
                ..
            }
            | Artifact::Spreadsheet {
                suggested_questions,
                ..
            }
            | Artifact::Code {
                suggested_questions,
                ..
            }
            | Artifact::Plan {
                suggested_questions,
                ..
            } => suggested_questions,
        }
    }

    /// One-line chat representation of this artifact, for callers that
    /// render a chat row next to the artifact itself
    pub fn summary_line(&self) -> String {
        match self {
            Artifact::Chat { text, .. } => text.clone(),
            Artifact::Document { title, .. } => format!("### Generated Document: {title}"),
            Artifact::Presentation { title, .. } => {
                format!("### Generated Presentation: {title}")
            }
            Artifact::Spreadsheet { title, .. } => format!("### Generated Data Grid: {title}"),
            Artifact::Code { title, .. } => format!("### Generated Code: {title}"),
            Artifact::Plan { summary, .. } => summary.clone(),
        }
    }
}

/// Classify and parse one full response text into an artifact
///
/// First-match-wins:
/// 1. the interior of the first ```json fenced block, if any;
/// 2. otherwise the whole trimmed text, but only if it starts with `{`;
/// 3. a successful parse dispatches on `"type"` (or `"kind"`);
/// 4. anything else falls back to `Chat` carrying the raw text.
pub fn decode_artifact(full_text: &str) -> Artifact {
    let candidate = fenced_json(full_text).or_else(|| {
        let trimmed = full_text.trim();
        trimmed.starts_with('{').then_some(trimmed)
    });

    let Some(candidate) = candidate else {
        return chat_fallback(full_text);
    };
    let Ok(value) = serde_json::from_str::<Value>(candidate) else {
        return chat_fallback(full_text);
    };

    classify(&value, full_text)
}

/// Interior of the first ```json fenced block, if the text has one
///
/// Only the first block counts; trailing prose after the closing fence
/// never affects classification.
fn fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")?;
    let interior = &text[start + "```json".len()..];
    let end = interior.find("```")?;
    Some(interior[..end].trim())
}

fn classify(value: &Value, raw: &str) -> Artifact {
    let questions = string_vec(value.get("suggested_questions"));

    let kind = value
        .get("type")
        .or_else(|| value.get("kind"))
        .and_then(Value::as_str);

    match kind {
        Some("doc") => Artifact::Document {
            title: title_of(value),
            html_content: str_field(value, "content"),
            suggested_questions: questions,
        },
        Some("ppt") => Artifact::Presentation {
            title: title_of(value),
            slides: slides_of(value),
            suggested_questions: questions,
        },
        Some("spreadsheet") => Artifact::Spreadsheet {
            title: title_of(value),
            columns: string_vec(value.get("columns")),
            rows: rows_of(value.get("data")),
            suggested_questions: questions,
        },
        Some("code") => Artifact::Code {
            title: title_of(value),
            language: str_field(value, "language"),
            content: str_field(value, "content"),
            suggested_questions: questions,
        },
        Some("plan") => Artifact::Plan {
            summary: value
                .get("content")
                .or_else(|| value.get("thought"))
                .and_then(Value::as_str)
                .unwrap_or("Implementation plan")
                .to_string(),
            steps: steps_of(value.get("steps")),
            suggested_questions: questions,
        },
        Some("chat") => Artifact::Chat {
            text: value
                .get("content")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .unwrap_or_else(|| raw.to_string()),
            suggested_questions: questions,
        },
        // Unrecognized or missing type: the raw response, fences and all
        _ => chat_fallback(raw),
    }
}

fn chat_fallback(raw: &str) -> Artifact {
    Artifact::Chat {
        text: raw.to_string(),
        suggested_questions: Vec::new(),
    }
}

/// Title field with the fixed placeholder for absent or blank titles
fn title_of(value: &Value) -> String {
    value
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

fn str_field(value: &Value, name: &str) -> String {
    value
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Coerce a JSON value to cell/list text: strings verbatim, other
/// scalars via their JSON rendering
fn text_of(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn string_vec(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(text_of).collect())
        .unwrap_or_default()
}

fn rows_of(value: Option<&Value>) -> Vec<Vec<String>> {
    value
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| match row.as_array() {
                    Some(cells) => cells.iter().map(text_of).collect(),
                    // A non-array row becomes a single-cell row rather
                    // than being dropped
                    None => vec![text_of(row)],
                })
                .collect()
        })
        .unwrap_or_default()
}

fn slides_of(value: &Value) -> Vec<Slide> {
    value
        .get("slides")
        .and_then(Value::as_array)
        .map(|slides| {
            slides
                .iter()
                .map(|slide| Slide {
                    title: title_of(slide),
                    html_content: str_field(slide, "content"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn steps_of(value: Option<&Value>) -> Vec<PlanStep> {
    value
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .map(|step| PlanStep {
                    description: match step.as_str() {
                        Some(s) => s.to_string(),
                        None => step
                            .get("description")
                            .or_else(|| step.get("content"))
                            .and_then(Value::as_str)
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| text_of(step)),
                    },
                })
                .collect()
        })
        .unwrap_or_default()
}
