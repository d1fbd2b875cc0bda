//! Lectern test utilities.
//!
//! Helpers for integration testing: JSON payload builders for lessons and
//! content requests, subject token minting, and assertion utilities.

use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Start a lesson body with every field empty.
pub fn lesson_body() -> LessonBodyBuilder {
    LessonBodyBuilder {
        value: json!({
            "description": "",
            "duration": "",
            "difficulty": "",
            "sections": [],
            "keyTerms": [],
            "examples": []
        }),
    }
}

/// A lesson body that passes strict validation.
pub fn complete_lesson_body() -> LessonBodyBuilder {
    lesson_body()
        .description("What the word means and how to use it")
        .duration("5 min")
        .difficulty("Beginner")
        .section("Meaning", "The everyday sense of the term.")
        .key_term("slay", "to do something exceptionally well")
        .example("She slayed that presentation.")
}

/// Builder for lesson body JSON.
#[derive(Debug, Clone)]
pub struct LessonBodyBuilder {
    value: JsonValue,
}

impl LessonBodyBuilder {
    fn set(mut self, key: &str, value: JsonValue) -> Self {
        if let Some(obj) = self.value.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
        self
    }

    fn push(mut self, key: &str, value: JsonValue) -> Self {
        if let Some(list) = self.value.get_mut(key).and_then(JsonValue::as_array_mut) {
            list.push(value);
        }
        self
    }

    pub fn description(self, description: &str) -> Self {
        self.set("description", json!(description))
    }

    pub fn duration(self, duration: &str) -> Self {
        self.set("duration", json!(duration))
    }

    pub fn difficulty(self, difficulty: &str) -> Self {
        self.set("difficulty", json!(difficulty))
    }

    /// Append a section.
    pub fn section(self, heading: &str, body: &str) -> Self {
        self.push("sections", json!({ "heading": heading, "body": body }))
    }

    /// Drop all sections.
    pub fn without_sections(self) -> Self {
        self.set("sections", json!([]))
    }

    /// Append a key term.
    pub fn key_term(self, term: &str, definition: &str) -> Self {
        self.push("keyTerms", json!({ "term": term, "definition": definition }))
    }

    /// Append an example.
    pub fn example(self, example: &str) -> Self {
        self.push("examples", json!(example))
    }

    /// Set an arbitrary field, for malformed payloads.
    pub fn with_raw(self, key: &str, value: JsonValue) -> Self {
        self.set(key, value)
    }

    /// The body as a JSON object.
    pub fn build(self) -> JsonValue {
        self.value
    }

    /// The body encoded as a JSON string, the way browser clients send it.
    pub fn build_string(self) -> JsonValue {
        JsonValue::String(self.value.to_string())
    }
}

/// Start a content request for `title` in category `slug`.
pub fn content_request(title: &str, slug: &str) -> ContentRequestBuilder {
    ContentRequestBuilder {
        value: json!({
            "title": title,
            "term": title.to_lowercase(),
            "categorySlug": slug,
            "body": complete_lesson_body().build()
        }),
    }
}

/// Builder for create/update request JSON.
#[derive(Debug, Clone)]
pub struct ContentRequestBuilder {
    value: JsonValue,
}

impl ContentRequestBuilder {
    fn set(mut self, key: &str, value: JsonValue) -> Self {
        if let Some(obj) = self.value.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
        self
    }

    pub fn title(self, title: &str) -> Self {
        self.set("title", json!(title))
    }

    pub fn term(self, term: &str) -> Self {
        self.set("term", json!(term))
    }

    pub fn category(self, slug: &str) -> Self {
        self.set("categorySlug", json!(slug))
    }

    /// Replace the body with a built lesson body (object or string form).
    pub fn body(self, body: JsonValue) -> Self {
        self.set("body", body)
    }

    /// Set the `submit` flag used by updates.
    pub fn submit(self, submit: bool) -> Self {
        self.set("submit", json!(submit))
    }

    pub fn build(self) -> JsonValue {
        self.value
    }
}

/// Claims minted for test subjects.
#[derive(Debug, Serialize)]
struct TestClaims<'a> {
    sub: String,
    role: &'a str,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<&'a str>,
}

/// Mint an HS256 bearer token for `subject_id` with `role`, valid for an hour.
pub fn mint_token(
    secret: &[u8],
    subject_id: Uuid,
    role: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    mint_token_with(secret, subject_id, role, 3600, None)
}

/// Mint a token with an explicit lifetime (seconds, may be negative) and issuer.
pub fn mint_token_with(
    secret: &[u8],
    subject_id: Uuid,
    role: &str,
    lifetime_secs: i64,
    issuer: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TestClaims {
        sub: subject_id.to_string(),
        role,
        exp: chrono::Utc::now().timestamp() + lifetime_secs,
        iss: issuer,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret),
    )
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value lacks a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to not have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value equals expected.
    pub fn json_eq(actual: &Value, expected: &Value) {
        assert_eq!(
            actual, expected,
            "JSON mismatch:\nactual: {actual:#}\nexpected: {expected:#}"
        );
    }

    /// Assert that a JSON error body names `field`.
    pub fn error_field(body: &Value, field: &str) {
        assert_eq!(
            body.get("field").and_then(Value::as_str),
            Some(field),
            "Expected error for field '{field}', got: {body}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}
