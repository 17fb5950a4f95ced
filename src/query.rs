//! Structured-query extraction from free-text queries.
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::llm::{ChatModel, ChatOptions, LlmError, Message};

/// Structured fields extracted from a free-text query.
///
/// Every field is optional; an all-null query is the degraded form used
/// when extraction fails, and retrieval falls back to a generic search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredQuery {
    #[serde(deserialize_with = "lenient_age")]
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub procedure: Option<String>,
    pub location: Option<String>,
    pub policy_duration: Option<String>,
    pub other_details: Option<String>,
}

impl StructuredQuery {
    /// True when no field was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.gender.is_none()
            && self.procedure.is_none()
            && self.location.is_none()
            && self.policy_duration.is_none()
            && self.other_details.is_none()
    }
}

/// Models emit ages as numbers or numeric strings; accept both.
fn lenient_age<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

const PARSE_PROMPT: &str = r#"You are an expert insurance query parser. Extract structured information from the following query:

Query: {query}

Extract the following information (if available):
1. Age and gender of the person
2. Medical procedure or condition
3. Location
4. Policy duration or age
5. Any other relevant details

Return ONLY a valid JSON object with the fields "age", "gender", "procedure", "location", "policy_duration" and "other_details" (use null for missing information)."#;

/// Extracts [`StructuredQuery`] fields from free text via the chat model.
pub struct QueryParser {
    chat: Arc<dyn ChatModel>,
}

impl QueryParser {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Ask the model for the structured fields of `query`.
    ///
    /// Callers map any failure to `StructuredQuery::default()`; parsing
    /// failure degrades retrieval to a whole-query search, it never blocks
    /// it.
    pub async fn parse(&self, query: &str) -> Result<StructuredQuery, LlmError> {
        let prompt = PARSE_PROMPT.replace("{query}", query);
        let raw = self
            .chat
            .complete(vec![Message::user(prompt)], ChatOptions::json())
            .await?;

        serde_json::from_str(&raw).map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedChat;

    #[tokio::test]
    async fn test_parse_extracts_fields() {
        let chat = Arc::new(ScriptedChat::new([
            r#"{"age": 46, "gender": "male", "procedure": "knee surgery", "location": "Pune", "policy_duration": "3 months", "other_details": null}"#,
        ]));
        let parser = QueryParser::new(chat);

        let parsed = parser
            .parse("46-year-old male, knee surgery in Pune, 3-month-old insurance policy")
            .await
            .unwrap();

        assert_eq!(parsed.age, Some(46.0));
        assert_eq!(parsed.gender.as_deref(), Some("male"));
        assert_eq!(parsed.procedure.as_deref(), Some("knee surgery"));
        assert_eq!(parsed.location.as_deref(), Some("Pune"));
        assert_eq!(parsed.policy_duration.as_deref(), Some("3 months"));
        assert!(!parsed.is_empty());
    }

    #[tokio::test]
    async fn test_parse_accepts_string_age() {
        let chat = Arc::new(ScriptedChat::new([r#"{"age": "46"}"#]));
        let parser = QueryParser::new(chat);
        let parsed = parser.parse("46-year-old").await.unwrap();
        assert_eq!(parsed.age, Some(46.0));
    }

    #[tokio::test]
    async fn test_parse_missing_fields_are_none() {
        let chat = Arc::new(ScriptedChat::new([r#"{"procedure": "dental cleaning"}"#]));
        let parser = QueryParser::new(chat);
        let parsed = parser.parse("is dental cleaning covered?").await.unwrap();
        assert_eq!(parsed.procedure.as_deref(), Some("dental cleaning"));
        assert!(parsed.age.is_none());
        assert!(parsed.gender.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error() {
        let chat = Arc::new(ScriptedChat::new(["not json at all"]));
        let parser = QueryParser::new(chat);
        assert!(parser.parse("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let parser = QueryParser::new(Arc::new(ScriptedChat::failing()));
        assert!(parser.parse("anything").await.is_err());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(StructuredQuery::default().is_empty());
    }
}
