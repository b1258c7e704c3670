//! The LLM oracle contract.
//!
//! The kernel never parses model output itself: an `Oracle` implementation
//! turns text into embeddings, a multi-lens council report, and generated
//! responses. Implementations must map failures onto [`OracleError`]; the
//! kernel wraps every call in retry and degrades to the documented fallbacks.

use crate::retry::OracleError;
use async_trait::async_trait;
use noema_core::AgentKind;
use serde::Deserialize;
use std::collections::HashMap;

/// One lens fragment of the shared council report.
#[derive(Debug, Clone, Deserialize)]
pub struct LensScore {
    /// 0.0 to 10.0.
    pub score: f32,
    #[serde(default)]
    pub rationale: String,
    /// 0.0 to 1.0.
    #[serde(default)]
    pub confidence: f32,
}

/// An explicit emotional attitude toward a named entity, e.g.
/// "hate Java" → (User, HATES, Java, intensity 0.9, valence -0.9).
#[derive(Debug, Clone, Deserialize)]
pub struct AffectiveExtract {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    /// Signed attitude; negative for aversion.
    #[serde(default)]
    pub valence: f32,
}

fn default_intensity() -> f32 {
    0.5
}

/// Self-disclosed identity facts pulled from the message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileHint {
    pub name: Option<String>,
    pub preferred_mode: Option<String>,
    #[serde(default)]
    pub traits: Vec<String>,
}

/// The shared multi-lens report: one oracle call scores all five lenses and
/// carries the side-channel extractions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouncilReport {
    /// Keyed by agent wire name ("intuition", "amygdala", ...).
    #[serde(default)]
    pub lenses: HashMap<String, LensScore>,
    #[serde(default)]
    pub profile_update: Option<ProfileHint>,
    #[serde(default)]
    pub affective_extraction: Vec<AffectiveExtract>,
    /// Conversational register of the message (phatic/casual/narrative/
    /// deep/task).
    #[serde(default)]
    pub intent: Option<String>,
}

impl CouncilReport {
    /// A report missing any council lens is a contract violation and must be
    /// replaced with the fallback, never partially trusted.
    pub fn is_complete(&self) -> bool {
        AgentKind::COUNCIL
            .iter()
            .all(|a| self.lenses.contains_key(a.as_str()))
    }
}

/// Hand-authored fallback used whenever report generation fails or returns
/// an incomplete report. Social wins: the safest non-committal voice.
pub fn fallback_report() -> CouncilReport {
    let mut lenses = HashMap::new();
    for agent in AgentKind::COUNCIL {
        let (score, rationale) = if agent == AgentKind::Social {
            (6.0, "fallback: defaulting to polite engagement")
        } else {
            (1.0, "fallback: no signal")
        };
        lenses.insert(
            agent.as_str().to_string(),
            LensScore {
                score,
                rationale: rationale.to_string(),
                confidence: 0.3,
            },
        );
    }
    CouncilReport {
        lenses,
        profile_update: None,
        affective_extraction: Vec::new(),
        intent: None,
    }
}

/// Inputs to response generation, assembled by the pipeline.
#[derive(Debug, Clone)]
pub struct ResponseRequest {
    /// The winning agent's voice.
    pub agent: AgentKind,
    pub user_text: String,
    /// Formatted memory context (history, facts, traits).
    pub context: String,
    /// The winner's rationale for taking this turn.
    pub rationale: String,
    pub bot_name: String,
    /// "formal" or "informal" address.
    pub user_mode: String,
    /// Combined style directives (hormonal, archetype, strong losers,
    /// volitional).
    pub style: String,
    /// Standing emotional relations to steer around.
    pub affective_context: String,
    /// Bifurcation directive: gently bridge to this topic.
    pub pivot_directive: Option<String>,
}

impl Default for ResponseRequest {
    fn default() -> Self {
        Self {
            agent: AgentKind::Social,
            user_text: String::new(),
            context: String::new(),
            rationale: String::new(),
            bot_name: String::new(),
            user_mode: "formal".to_string(),
            style: String::new(),
            affective_context: String::new(),
            pivot_directive: None,
        }
    }
}

/// Response text plus the hypothesis about the user's next utterance.
#[derive(Debug, Clone)]
pub struct GeneratedResponse {
    pub text: String,
    pub predicted_reaction: Option<String>,
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, OracleError>;

    /// One call scoring all five lenses. `full` additionally requests the
    /// affective extraction (used when the message carries attitude
    /// keywords).
    async fn council_report(
        &self,
        text: &str,
        context: &str,
        full: bool,
    ) -> Result<CouncilReport, OracleError>;

    async fn generate_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<GeneratedResponse, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_report_is_complete_and_social_wins() {
        let report = fallback_report();
        assert!(report.is_complete());
        let social = &report.lenses["social"];
        for agent in AgentKind::COUNCIL {
            if agent != AgentKind::Social {
                assert!(report.lenses[agent.as_str()].score < social.score);
            }
        }
    }

    #[test]
    fn test_incomplete_report_detected() {
        let mut report = fallback_report();
        report.lenses.remove("amygdala");
        assert!(!report.is_complete());
    }

    #[test]
    fn test_report_deserializes_from_oracle_json() {
        let json = r#"{
            "lenses": {
                "intuition": {"score": 2.0, "rationale": "familiar", "confidence": 0.4},
                "amygdala": {"score": 1.0},
                "prefrontal": {"score": 8.0, "rationale": "planning question"},
                "social": {"score": 3.0},
                "striatum": {"score": 4.0}
            },
            "affective_extraction": [
                {"subject": "User", "predicate": "HATES", "object": "Java",
                 "intensity": 0.9, "valence": -0.9}
            ],
            "intent": "task"
        }"#;
        let report: CouncilReport = serde_json::from_str(json).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.affective_extraction.len(), 1);
        assert_eq!(report.intent.as_deref(), Some("task"));
    }
}
