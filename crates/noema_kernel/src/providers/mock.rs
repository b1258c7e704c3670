//! Mock oracle — deterministic responses for tests and offline prototyping.
//!
//! Embeddings are character-bucket frequency vectors, so textually similar
//! inputs land close together and unrelated inputs do not. Council scoring is
//! plain keyword heuristics. Nothing here consults a network.

use crate::oracle::{
    AffectiveExtract, CouncilReport, GeneratedResponse, LensScore, Oracle, ResponseRequest,
};
use crate::retry::OracleError;
use async_trait::async_trait;
use noema_core::AgentKind;
use std::collections::HashMap;

const EMBED_DIM: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    fail: bool,
}

impl MockOracle {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A variant whose every call fails with a transient error, for
    /// degradation tests.
    pub fn failing() -> Self {
        Self { fail: true }
    }

    fn check(&self) -> Result<(), OracleError> {
        if self.fail {
            Err(OracleError::Server("mock outage".to_string()))
        } else {
            Ok(())
        }
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn lens(score: f32, rationale: &str) -> LensScore {
    LensScore {
        score,
        rationale: rationale.to_string(),
        confidence: if score > 5.0 { 0.8 } else { 0.3 },
    }
}

/// Scan for "<subject> <verb> <object>" attitude statements.
fn extract_affect(text: &str) -> Vec<AffectiveExtract> {
    const VERBS: &[(&str, &str, f32, f32)] = &[
        ("hate", "HATES", -0.9, 0.9),
        ("despise", "DESPISES", -0.9, 0.9),
        ("fear", "FEARS", -0.7, 0.8),
        ("love", "LOVES", 0.9, 0.8),
        ("adore", "ADORES", 0.9, 0.8),
        ("enjoy", "ENJOYS", 0.7, 0.6),
    ];

    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .collect();

    let mut extracts = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let lowered = word.to_lowercase();
        for (verb, predicate, valence, intensity) in VERBS {
            if lowered == *verb && i + 1 < words.len() {
                extracts.push(AffectiveExtract {
                    subject: "User".to_string(),
                    predicate: predicate.to_string(),
                    object: words[i + 1].to_string(),
                    intensity: *intensity,
                    valence: *valence,
                });
            }
        }
    }
    extracts
}

#[async_trait]
impl Oracle for MockOracle {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, OracleError> {
        self.check()?;
        let mut v = vec![0.0f32; EMBED_DIM];
        for ch in text.to_lowercase().chars().filter(|c| c.is_alphanumeric()) {
            v[(ch as u32 as usize) % EMBED_DIM] += 1.0;
        }
        noema_core::math::normalize(&mut v);
        Ok(v)
    }

    async fn council_report(
        &self,
        text: &str,
        _context: &str,
        full: bool,
    ) -> Result<CouncilReport, OracleError> {
        self.check()?;
        let lower = text.to_lowercase();

        let mut lenses = HashMap::new();
        lenses.insert(
            AgentKind::Amygdala.as_str().to_string(),
            if contains_any(&lower, &["scared", "danger", "threat", "hurt", "боюсь", "страшно"]) {
                lens(8.0, "distress markers present")
            } else {
                lens(1.0, "no threat")
            },
        );
        lenses.insert(
            AgentKind::Prefrontal.as_str().to_string(),
            if contains_any(&lower, &["how", "what", "should", "plan", "why", "как", "почему"]) {
                lens(7.5, "a question needing structure")
            } else {
                lens(2.0, "no task")
            },
        );
        lenses.insert(
            AgentKind::Social.as_str().to_string(),
            if contains_any(&lower, &["thanks", "sorry", "feel", "hello", "привет", "чувствую"]) {
                lens(7.0, "social ritual")
            } else {
                lens(4.0, "baseline warmth")
            },
        );
        lenses.insert(
            AgentKind::Striatum.as_str().to_string(),
            if contains_any(&lower, &["fun", "cool", "new", "awesome", "game", "круто"]) {
                lens(7.0, "novelty bait")
            } else {
                lens(2.0, "nothing shiny")
            },
        );
        lenses.insert(
            AgentKind::Intuition.as_str().to_string(),
            lens(0.0, "defer to episodic recall"),
        );

        let intent = if contains_any(&lower, &["help", "fix", "build", "plan", "should"]) {
            "task"
        } else if contains_any(&lower, &["story", "yesterday", "happened"]) {
            "narrative"
        } else if contains_any(&lower, &["meaning", "philosophy", "believe"]) {
            "deep"
        } else {
            "casual"
        };

        Ok(CouncilReport {
            lenses,
            profile_update: None,
            affective_extraction: if full { extract_affect(text) } else { Vec::new() },
            intent: Some(intent.to_string()),
        })
    }

    async fn generate_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<GeneratedResponse, OracleError> {
        self.check()?;

        // When standing attitudes are in play, the reply steers around the
        // charged entity without naming it.
        let text = if !request.affective_context.is_empty() {
            "I remember how you feel about that, so let me point you somewhere \
             you'd actually enjoy instead."
                .to_string()
        } else if let Some(pivot) = &request.pivot_directive {
            format!("(Mock pivot) By the way — {}", pivot)
        } else {
            match request.agent {
                AgentKind::Social => "Happy to chat — tell me more?".to_string(),
                AgentKind::Prefrontal => "Let's break this down step by step.".to_string(),
                AgentKind::Amygdala => "Careful — this sounds risky to me.".to_string(),
                AgentKind::Striatum => "Ooh, now that sounds fun.".to_string(),
                AgentKind::Intuition => "Something about this feels familiar.".to_string(),
                AgentKind::Uncertainty => {
                    "I'm not sure I follow — can you rephrase that?".to_string()
                }
            }
        };

        Ok(GeneratedResponse {
            text,
            predicted_reaction: Some("the user elaborates on their last point".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_similarity_ordering() {
        let oracle = MockOracle::new();
        let a = oracle.embed("the quick brown fox").await.unwrap();
        let b = oracle.embed("the quick brown foxes").await.unwrap();
        let c = oracle.embed("zzz 123 qqq").await.unwrap();
        let sim_ab = noema_core::math::cosine_similarity(&a, &b);
        let sim_ac = noema_core::math::cosine_similarity(&a, &c);
        assert!(sim_ab > sim_ac);
    }

    #[tokio::test]
    async fn test_report_is_complete() {
        let oracle = MockOracle::new();
        let report = oracle.council_report("hello there", "", false).await.unwrap();
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_affective_extraction_in_full_mode() {
        let oracle = MockOracle::new();
        let report = oracle
            .council_report("honestly I really hate Java sometimes", "", true)
            .await
            .unwrap();
        assert_eq!(report.affective_extraction.len(), 1);
        let extract = &report.affective_extraction[0];
        assert_eq!(extract.predicate, "HATES");
        assert_eq!(extract.object, "Java");
        assert!(extract.valence < 0.0);

        let light = oracle
            .council_report("honestly I really hate Java sometimes", "", false)
            .await
            .unwrap();
        assert!(light.affective_extraction.is_empty());
    }

    #[tokio::test]
    async fn test_failing_oracle_fails() {
        let oracle = MockOracle::failing();
        assert!(oracle.embed("x").await.is_err());
        assert!(oracle.council_report("x", "", false).await.is_err());
    }

    #[tokio::test]
    async fn test_response_avoids_charged_entities() {
        let oracle = MockOracle::new();
        let mut request = ResponseRequest::default();
        request.user_text = "what language should I use for backend?".to_string();
        request.affective_context = "User HATES Java".to_string();
        let response = oracle.generate_response(&request).await.unwrap();
        assert!(!response.text.to_lowercase().contains("java"));
        assert!(response.predicted_reaction.is_some());
    }
}
