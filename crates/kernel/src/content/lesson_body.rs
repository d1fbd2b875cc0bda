//! Lesson body schema.
//!
//! The body is the structured payload a content item carries. Contributors
//! build it up incrementally, so validation comes in two strengths:
//!
//! - [`Strictness::Lenient`] checks only that present fields have the right
//!   shape. Used while saving drafts.
//! - [`Strictness::Strict`] additionally requires a description, at least one
//!   section, and a difficulty. Used whenever an item leaves DRAFT.
//!
//! The engine never interprets section or key-term text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Payload failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field `{field}`: {reason}")]
pub struct SchemaError {
    /// Path of the offending field, e.g. `sections[2].heading`.
    pub field: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// How much of the body must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Lenient,
    Strict,
}

/// Lesson difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl FromStr for Difficulty {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(SchemaError::new(
                "difficulty",
                format!("unrecognized difficulty {s:?} (expected Beginner, Intermediate, or Advanced)"),
            )),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One titled block of lesson text. Display order is list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: String,
}

/// A glossary entry. Terms are not required to be unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTerm {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

/// Structured lesson payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonBody {
    pub description: String,

    /// Free-text label such as "5 min". Never parsed.
    pub duration: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,

    pub sections: Vec<Section>,

    pub key_terms: Vec<KeyTerm>,

    pub examples: Vec<String>,
}

impl LessonBody {
    /// Validate a loosely structured payload.
    ///
    /// Accepts the body as a JSON object, or as a string holding the JSON
    /// encoding of one (the form web clients submit). `null`, absent, and
    /// blank-string payloads are treated as an empty body.
    pub fn validate(raw: &Value, strictness: Strictness) -> Result<Self, SchemaError> {
        let body = match raw {
            Value::Null => Self::default(),
            Value::String(s) if s.trim().is_empty() => Self::default(),
            Value::String(s) => {
                let decoded: Value = serde_json::from_str(s)
                    .map_err(|e| SchemaError::new("body", format!("invalid JSON: {e}")))?;
                if decoded.is_string() {
                    return Err(SchemaError::new("body", "expected an object"));
                }
                return Self::validate(&decoded, strictness);
            }
            Value::Object(map) => Self::from_map(map)?,
            _ => return Err(SchemaError::new("body", "expected an object")),
        };

        if strictness == Strictness::Strict {
            body.ensure_complete()?;
        }
        Ok(body)
    }

    /// Parse a serialized body leniently.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let raw: Value = serde_json::from_str(s)
            .map_err(|e| SchemaError::new("body", format!("invalid JSON: {e}")))?;
        Self::validate(&raw, Strictness::Lenient)
    }

    /// Serialize to the canonical JSON text form.
    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Check the extra requirements strict validation imposes.
    pub fn ensure_complete(&self) -> Result<(), SchemaError> {
        if self.description.trim().is_empty() {
            return Err(SchemaError::new("description", "must not be empty"));
        }
        if self.sections.is_empty() {
            return Err(SchemaError::new("sections", "at least one section is required"));
        }
        if self.difficulty.is_none() {
            return Err(SchemaError::new("difficulty", "must be set"));
        }
        Ok(())
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self, SchemaError> {
        let description = string_field(map, "description", "description")?.unwrap_or_default();
        let duration = string_field(map, "duration", "duration")?.unwrap_or_default();

        let difficulty = match string_field(map, "difficulty", "difficulty")? {
            Some(s) if !s.trim().is_empty() => Some(s.parse::<Difficulty>()?),
            _ => None,
        };

        let sections = array_field(map, "sections")?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let path = format!("sections[{i}]");
                let entry = object_entry(v, &path)?;
                Ok(Section {
                    heading: string_field(entry, "heading", &format!("{path}.heading"))?
                        .unwrap_or_default(),
                    body: string_field(entry, "body", &format!("{path}.body"))?
                        .unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        let key_terms = array_field(map, "keyTerms")?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let path = format!("keyTerms[{i}]");
                let entry = object_entry(v, &path)?;
                Ok(KeyTerm {
                    term: string_field(entry, "term", &format!("{path}.term"))?
                        .unwrap_or_default(),
                    definition: string_field(entry, "definition", &format!("{path}.definition"))?
                        .unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        let examples = array_field(map, "examples")?
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(SchemaError::new(format!("examples[{i}]"), "expected a string")),
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok(Self {
            description,
            duration,
            difficulty,
            sections,
            key_terms,
            examples,
        })
    }
}

fn string_field(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<String>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::new(path, "expected a string")),
    }
}

fn array_field<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a [Value], SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Default::default()),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(SchemaError::new(key, "expected an array")),
    }
}

fn object_entry<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::new(path, "expected an object"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> Value {
        json!({
            "description": "What \"no cap\" means",
            "duration": "5 min",
            "difficulty": "Beginner",
            "sections": [
                {"heading": "Origin", "body": "AAVE roots, {braces} and [brackets]"},
                {"heading": "Usage", "body": "Said to stress honesty."}
            ],
            "keyTerms": [
                {"term": "cap", "definition": "a lie"},
                {"term": "cap", "definition": "duplicate terms are allowed"}
            ],
            "examples": ["no cap, that was the best pizza", "\"quoted\"\nnewline"]
        })
    }

    #[test]
    fn lenient_accepts_missing_fields() {
        let body = LessonBody::validate(&json!({"description": "wip"}), Strictness::Lenient)
            .unwrap();
        assert_eq!(body.description, "wip");
        assert!(body.sections.is_empty());
        assert!(body.key_terms.is_empty());
        assert!(body.examples.is_empty());
        assert_eq!(body.difficulty, None);
    }

    #[test]
    fn lenient_accepts_null_and_blank() {
        assert_eq!(
            LessonBody::validate(&Value::Null, Strictness::Lenient).unwrap(),
            LessonBody::default()
        );
        assert_eq!(
            LessonBody::validate(&json!("  "), Strictness::Lenient).unwrap(),
            LessonBody::default()
        );
    }

    #[test]
    fn wrong_type_names_the_field() {
        let raw = json!({"sections": [{"heading": "ok"}, {"heading": 7}]});
        let err = LessonBody::validate(&raw, Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "sections[1].heading");

        let raw = json!({"keyTerms": [{"term": "x", "definition": false}]});
        let err = LessonBody::validate(&raw, Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "keyTerms[0].definition");

        let raw = json!({"examples": ["fine", 3]});
        let err = LessonBody::validate(&raw, Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "examples[1]");

        let raw = json!({"sections": "not a list"});
        let err = LessonBody::validate(&raw, Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "sections");
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = LessonBody::validate(&json!([1, 2]), Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "body");
        let err = LessonBody::validate(&json!("{not json"), Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "body");
    }

    #[test]
    fn string_encoded_body_is_decoded() {
        let encoded = Value::String(complete().to_string());
        let body = LessonBody::validate(&encoded, Strictness::Strict).unwrap();
        assert_eq!(body.sections.len(), 2);
        assert_eq!(body.difficulty, Some(Difficulty::Beginner));
    }

    #[test]
    fn strict_requires_description_sections_and_difficulty() {
        let mut raw = complete();
        raw["description"] = json!("   ");
        let err = LessonBody::validate(&raw, Strictness::Strict).unwrap_err();
        assert_eq!(err.field, "description");

        let mut raw = complete();
        raw["sections"] = json!([]);
        let err = LessonBody::validate(&raw, Strictness::Strict).unwrap_err();
        assert_eq!(err.field, "sections");

        let mut raw = complete();
        raw.as_object_mut().unwrap().remove("difficulty");
        let err = LessonBody::validate(&raw, Strictness::Strict).unwrap_err();
        assert_eq!(err.field, "difficulty");

        assert!(LessonBody::validate(&complete(), Strictness::Strict).is_ok());
    }

    #[test]
    fn unknown_difficulty_is_rejected_even_leniently() {
        let err = LessonBody::validate(&json!({"difficulty": "Expert"}), Strictness::Lenient)
            .unwrap_err();
        assert_eq!(err.field, "difficulty");
        let body =
            LessonBody::validate(&json!({"difficulty": ""}), Strictness::Lenient).unwrap();
        assert_eq!(body.difficulty, None);
    }

    #[test]
    fn order_and_duplicates_are_preserved() {
        let body = LessonBody::validate(&complete(), Strictness::Strict).unwrap();
        assert_eq!(body.sections[0].heading, "Origin");
        assert_eq!(body.sections[1].heading, "Usage");
        assert_eq!(body.key_terms.len(), 2);
        assert_eq!(body.key_terms[0].term, body.key_terms[1].term);
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let full = LessonBody::validate(&complete(), Strictness::Strict).unwrap();
        assert_eq!(LessonBody::parse(&full.serialize().unwrap()).unwrap(), full);

        let empty = LessonBody::default();
        assert_eq!(LessonBody::parse(&empty.serialize().unwrap()).unwrap(), empty);

        let partial = LessonBody {
            duration: "10 min".to_string(),
            examples: vec!["}{][\",:".to_string()],
            ..LessonBody::default()
        };
        assert_eq!(LessonBody::parse(&partial.serialize().unwrap()).unwrap(), partial);
    }

    #[test]
    fn serialized_form_uses_camel_case() {
        let body = LessonBody::validate(&complete(), Strictness::Lenient).unwrap();
        let json: Value = serde_json::from_str(&body.serialize().unwrap()).unwrap();
        assert!(json.get("keyTerms").is_some());
        assert_eq!(json["difficulty"], "Beginner");
    }
}
