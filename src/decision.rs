//! Decision synthesis over retrieved policy clauses.
//!
//! Two synthesis modes share the retrieved context: a structured
//! approve/reject decision with cited clauses, and a plain one-paragraph
//! factual answer. Model and transport failures are captured here and never
//! raised past this boundary in the decision flow.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::llm::{ChatModel, ChatOptions, LlmError, Message};
use crate::query::StructuredQuery;
use crate::retriever::RetrievedClause;

/// Answer returned when retrieval produced no context at all.
pub const NO_INFORMATION_ANSWER: &str =
    "No relevant information found in the policy document.";

const NO_CLAUSES_JUSTIFICATION: &str =
    "Could not find relevant policy clauses to make a determination.";

// ── Decision model ───────────────────────────────────────────────────

/// The verdict of a structured decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Approved,
    Rejected,
    NeedsMoreInfo,
    Undetermined,
    Error,
    InsufficientInformation,
}

impl DecisionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::NeedsMoreInfo => "Needs More Information",
            Self::Undetermined => "Undetermined",
            Self::Error => "Error",
            Self::InsufficientInformation => "Insufficient Information",
        }
    }

    /// Normalize a model-emitted verdict string; anything unrecognized is
    /// `Undetermined`.
    fn from_model(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "needs more information" | "need more information" => Self::NeedsMoreInfo,
            "insufficient information" => Self::InsufficientInformation,
            _ => Self::Undetermined,
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DecisionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A structured decision with its supporting evidence.
///
/// `clauses` is always a subset (by clause id) of the retrieved set the
/// decision was synthesized from, falling back to the full retrieved set
/// when the model cites nothing resolvable.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub decision: DecisionKind,
    pub amount: Option<f64>,
    pub justification: String,
    pub clauses: Vec<RetrievedClause>,
}

// ── Prompts ──────────────────────────────────────────────────────────

fn render_clauses(clauses: &[RetrievedClause]) -> String {
    let mut rendered = String::new();
    for clause in clauses {
        rendered.push_str(&format!("Clause {}:\n{}\n---\n", clause.clause_id, clause.text));
    }
    rendered
}

fn render_clauses_with_pages(clauses: &[RetrievedClause]) -> String {
    let mut rendered = String::new();
    for clause in clauses {
        rendered.push_str(&format!(
            "Clause {} Page {}:\n{}\n---\n",
            clause.clause_id, clause.metadata.page, clause.text
        ));
    }
    rendered
}

fn field_or(value: Option<&str>, fallback: &str) -> String {
    value.map_or_else(|| fallback.to_string(), ToString::to_string)
}

fn build_decision_prompt(
    query: &str,
    structured: &StructuredQuery,
    clauses: &[RetrievedClause],
) -> String {
    let age = structured
        .age
        .map_or_else(|| "Not specified".to_string(), |a| a.to_string());

    format!(
        r#"You are an expert insurance claims processor. Your task is to evaluate a claim based ONLY on the provided policy document clauses.

**Query Details:**
- Original Query: {query}
- Age: {age}
- Gender: {gender}
- Procedure/Condition: {procedure}
- Location: {location}
- Policy Duration: {duration}
- Other Details: {other}

**Policy Clauses:**
{clauses}

Based strictly on the query details and the policy clauses, provide a decision. Your response MUST be a single, valid JSON object with these keys:
1. "decision": Either "Approved", "Rejected", or "Needs More Information"
2. "amount": The coverage amount if applicable (null if not applicable)
3. "justification": A clear explanation of your decision, referencing specific clauses
4. "clause_references": An array of clause IDs that support your decision

Be specific and precise in your justification, citing the exact clauses that led to your decision."#,
        gender = field_or(structured.gender.as_deref(), "Not specified"),
        procedure = field_or(structured.procedure.as_deref(), "Not specified"),
        location = field_or(structured.location.as_deref(), "Not specified"),
        duration = field_or(structured.policy_duration.as_deref(), "Not specified"),
        other = field_or(structured.other_details.as_deref(), "None"),
        clauses = render_clauses(clauses),
    )
}

fn build_answer_prompt(query: &str, clauses: &[RetrievedClause]) -> String {
    format!(
        r#"You are an expert insurance policy analyst. Your task is to answer a specific question about an insurance policy based ONLY on the provided policy document clauses.

**Policy Clauses (Context):**
{context}

**Question:**
{query}

Provide a direct, concise, and accurate answer to the question based solely on the information in the provided policy clauses.
Your answer should be factual and reference specific details from the policy document.
If the information is not available in the provided clauses, state that clearly.
Do not make assumptions or provide information not supported by the policy clauses.

Format your response as a single paragraph without bullet points or numbered lists."#,
        context = render_clauses_with_pages(clauses),
    )
}

// ── Model verdict parsing ────────────────────────────────────────────

/// The JSON object requested from the model. Numbers may arrive as strings;
/// parse leniently and let `None` carry anything unusable.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelVerdict {
    decision: Option<String>,
    amount: Option<serde_json::Value>,
    justification: Option<String>,
    clause_references: Vec<serde_json::Value>,
}

fn value_to_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_clause_id(value: &serde_json::Value) -> Option<usize> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|v| v as usize),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolve cited clause ids back to clauses, in citation order, silently
/// dropping anything that does not match the retrieved set.
fn resolve_citations(
    references: &[serde_json::Value],
    clauses: &[RetrievedClause],
) -> Vec<RetrievedClause> {
    references
        .iter()
        .filter_map(value_to_clause_id)
        .filter_map(|id| clauses.iter().find(|c| c.clause_id == id).cloned())
        .collect()
}

// ── Synthesizer ──────────────────────────────────────────────────────

/// Turns retrieved clauses into a decision or a plain answer.
pub struct DecisionSynthesizer {
    chat: Arc<dyn ChatModel>,
}

impl DecisionSynthesizer {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Synthesize a structured decision.
    ///
    /// An empty clause set short-circuits to `InsufficientInformation`
    /// without any model call; every failure after that point is captured
    /// as a `DecisionKind::Error` decision carrying the retrieved set.
    pub async fn decide(
        &self,
        query: &str,
        structured: &StructuredQuery,
        clauses: Vec<RetrievedClause>,
    ) -> Decision {
        if clauses.is_empty() {
            return Decision {
                decision: DecisionKind::InsufficientInformation,
                amount: None,
                justification: NO_CLAUSES_JUSTIFICATION.to_string(),
                clauses: Vec::new(),
            };
        }

        let prompt = build_decision_prompt(query, structured, &clauses);
        let raw = match self
            .chat
            .complete(vec![Message::user(prompt)], ChatOptions::json())
            .await
        {
            Ok(raw) => raw,
            Err(e) => return Self::error_decision(&e, clauses),
        };

        let verdict: ModelVerdict = match serde_json::from_str(&raw) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("decision response was not valid JSON: {e}");
                return Self::error_decision(&LlmError::ParseError(e.to_string()), clauses);
            }
        };

        let cited = resolve_citations(&verdict.clause_references, &clauses);
        let supporting = if cited.is_empty() { clauses } else { cited };

        Decision {
            decision: verdict
                .decision
                .as_deref()
                .map_or(DecisionKind::Undetermined, DecisionKind::from_model),
            amount: verdict.amount.as_ref().and_then(value_to_f64),
            justification: verdict
                .justification
                .unwrap_or_else(|| "No justification provided.".to_string()),
            clauses: supporting,
        }
    }

    fn error_decision(error: &LlmError, clauses: Vec<RetrievedClause>) -> Decision {
        Decision {
            decision: DecisionKind::Error,
            amount: None,
            justification: format!("An error occurred while processing the decision: {error}"),
            clauses,
        }
    }

    /// Synthesize a one-paragraph factual answer from the same retrieved
    /// context. No JSON contract; an empty context short-circuits to the
    /// fixed no-information string.
    pub async fn answer(
        &self,
        query: &str,
        clauses: &[RetrievedClause],
    ) -> Result<String, LlmError> {
        if clauses.is_empty() {
            return Ok(NO_INFORMATION_ANSWER.to_string());
        }

        let prompt = build_answer_prompt(query, clauses);
        let options = ChatOptions {
            temperature: 0.2,
            max_tokens: 500,
            json_object: false,
        };
        let raw = self
            .chat
            .complete(vec![Message::user(prompt)], options)
            .await?;

        Ok(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;
    use crate::llm::mock::ScriptedChat;

    fn clause(id: usize, text: &str) -> RetrievedClause {
        RetrievedClause {
            clause_id: id,
            text: text.to_string(),
            relevance_score: 0.9 - id as f32 * 0.1,
            metadata: Chunk {
                text: text.to_string(),
                page: id,
                sequence: 1,
                source: "policy.pdf".to_string(),
            },
        }
    }

    fn clauses() -> Vec<RetrievedClause> {
        vec![
            clause(1, "Knee surgery is covered after 24 months."),
            clause(2, "Claims require continuous coverage."),
            clause(3, "Cosmetic procedures are excluded."),
        ]
    }

    #[tokio::test]
    async fn test_empty_clauses_short_circuit_no_model_call() {
        let chat = Arc::new(ScriptedChat::failing());
        let synthesizer = DecisionSynthesizer::new(chat.clone());

        let decision = synthesizer
            .decide("any query", &StructuredQuery::default(), Vec::new())
            .await;

        assert_eq!(decision.decision, DecisionKind::InsufficientInformation);
        assert!(decision.amount.is_none());
        assert!(decision.clauses.is_empty());
        assert_eq!(chat.calls(), 0, "no external call may be made");
    }

    #[tokio::test]
    async fn test_decide_resolves_cited_clauses() {
        let chat = Arc::new(ScriptedChat::new([
            r#"{"decision": "Approved", "amount": 150000, "justification": "Covered per clause 1.", "clause_references": [1, 3]}"#,
        ]));
        let synthesizer = DecisionSynthesizer::new(chat);

        let decision = synthesizer
            .decide("knee surgery claim", &StructuredQuery::default(), clauses())
            .await;

        assert_eq!(decision.decision, DecisionKind::Approved);
        assert_eq!(decision.amount, Some(150000.0));
        let cited: Vec<usize> = decision.clauses.iter().map(|c| c.clause_id).collect();
        assert_eq!(cited, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_unresolvable_citations_are_dropped() {
        let chat = Arc::new(ScriptedChat::new([
            r#"{"decision": "Rejected", "amount": null, "justification": "Excluded.", "clause_references": [3, 99, "7"]}"#,
        ]));
        let synthesizer = DecisionSynthesizer::new(chat);

        let decision = synthesizer
            .decide("cosmetic claim", &StructuredQuery::default(), clauses())
            .await;

        assert_eq!(decision.decision, DecisionKind::Rejected);
        let cited: Vec<usize> = decision.clauses.iter().map(|c| c.clause_id).collect();
        assert_eq!(cited, vec![3], "ids 99 and 7 match nothing in scope");
    }

    #[tokio::test]
    async fn test_empty_citations_substitute_full_set() {
        let chat = Arc::new(ScriptedChat::new([
            r#"{"decision": "Needs More Information", "amount": null, "justification": "Unclear.", "clause_references": [42]}"#,
        ]));
        let synthesizer = DecisionSynthesizer::new(chat);

        let retrieved = clauses();
        let decision = synthesizer
            .decide("vague claim", &StructuredQuery::default(), retrieved.clone())
            .await;

        assert_eq!(decision.decision, DecisionKind::NeedsMoreInfo);
        assert_eq!(
            decision.clauses.len(),
            retrieved.len(),
            "unresolvable citations fall back to the full retrieved set"
        );
    }

    #[tokio::test]
    async fn test_model_failure_becomes_error_decision() {
        let synthesizer = DecisionSynthesizer::new(Arc::new(ScriptedChat::failing()));

        let retrieved = clauses();
        let decision = synthesizer
            .decide("any claim", &StructuredQuery::default(), retrieved.clone())
            .await;

        assert_eq!(decision.decision, DecisionKind::Error);
        assert!(decision.amount.is_none());
        assert!(decision.justification.contains("An error occurred"));
        assert_eq!(decision.clauses.len(), retrieved.len());
    }

    #[tokio::test]
    async fn test_invalid_json_becomes_error_decision() {
        let synthesizer =
            DecisionSynthesizer::new(Arc::new(ScriptedChat::new(["the claim looks fine to me"])));

        let decision = synthesizer
            .decide("any claim", &StructuredQuery::default(), clauses())
            .await;

        assert_eq!(decision.decision, DecisionKind::Error);
    }

    #[tokio::test]
    async fn test_unknown_verdict_string_is_undetermined() {
        let chat = Arc::new(ScriptedChat::new([
            r#"{"decision": "Maybe", "justification": "Hard to say.", "clause_references": [1]}"#,
        ]));
        let synthesizer = DecisionSynthesizer::new(chat);

        let decision = synthesizer
            .decide("claim", &StructuredQuery::default(), clauses())
            .await;
        assert_eq!(decision.decision, DecisionKind::Undetermined);
    }

    #[tokio::test]
    async fn test_string_amount_is_parsed() {
        let chat = Arc::new(ScriptedChat::new([
            r#"{"decision": "Approved", "amount": "50000", "justification": "ok", "clause_references": [1]}"#,
        ]));
        let synthesizer = DecisionSynthesizer::new(chat);

        let decision = synthesizer
            .decide("claim", &StructuredQuery::default(), clauses())
            .await;
        assert_eq!(decision.amount, Some(50000.0));
    }

    #[tokio::test]
    async fn test_answer_empty_context_short_circuits() {
        let chat = Arc::new(ScriptedChat::failing());
        let synthesizer = DecisionSynthesizer::new(chat.clone());

        let answer = synthesizer.answer("grace period?", &[]).await.unwrap();
        assert_eq!(answer, NO_INFORMATION_ANSWER);
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_answer_returns_trimmed_model_text() {
        let chat = Arc::new(ScriptedChat::new([
            "  The grace period for premium payment is thirty days.  \n",
        ]));
        let synthesizer = DecisionSynthesizer::new(chat);

        let answer = synthesizer
            .answer("What is the grace period?", &clauses())
            .await
            .unwrap();
        assert_eq!(answer, "The grace period for premium payment is thirty days.");
    }

    #[tokio::test]
    async fn test_answer_failure_propagates() {
        let synthesizer = DecisionSynthesizer::new(Arc::new(ScriptedChat::failing()));
        assert!(synthesizer.answer("q", &clauses()).await.is_err());
    }

    #[test]
    fn test_decision_kind_display_strings() {
        assert_eq!(DecisionKind::NeedsMoreInfo.to_string(), "Needs More Information");
        assert_eq!(
            DecisionKind::InsufficientInformation.to_string(),
            "Insufficient Information"
        );
        assert_eq!(DecisionKind::from_model("approved"), DecisionKind::Approved);
        assert_eq!(
            DecisionKind::from_model("Needs More Information"),
            DecisionKind::NeedsMoreInfo
        );
        assert_eq!(DecisionKind::from_model("gibberish"), DecisionKind::Undetermined);
    }

    #[test]
    fn test_decision_serializes_display_form() {
        let decision = Decision {
            decision: DecisionKind::NeedsMoreInfo,
            amount: None,
            justification: "x".to_string(),
            clauses: Vec::new(),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "Needs More Information");
    }

    #[test]
    fn test_prompt_renders_all_fields() {
        let structured = StructuredQuery {
            age: Some(46.0),
            gender: Some("male".to_string()),
            procedure: Some("knee surgery".to_string()),
            location: None,
            policy_duration: Some("3 months".to_string()),
            other_details: None,
        };
        let prompt = build_decision_prompt("original query", &structured, &clauses());

        assert!(prompt.contains("Original Query: original query"));
        assert!(prompt.contains("Age: 46"));
        assert!(prompt.contains("Location: Not specified"));
        assert!(prompt.contains("Other Details: None"));
        assert!(prompt.contains("Clause 1:"));
        assert!(prompt.contains("Clause 3:"));
    }

    #[test]
    fn test_answer_prompt_includes_page_info() {
        let prompt = build_answer_prompt("grace period?", &clauses());
        assert!(prompt.contains("Clause 1 Page 1:"));
        assert!(prompt.contains("**Question:**"));
    }
}
