//! Council agent identities and the signal contract they all produce.

use serde::{Deserialize, Serialize};

/// The closed set of cognitive agents.
///
/// The council is intentionally a small fixed enum rather than an open plugin
/// registry: every downstream table (hormonal multipliers, volitional
/// strategies, mood impacts) is keyed exhaustively on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Episodic pattern matching ("déjà vu").
    Intuition,
    /// Threat and distress detection.
    Amygdala,
    /// Logic, planning, task structure.
    Prefrontal,
    /// Social ritual, politeness, emotional attunement.
    Social,
    /// Reward and novelty seeking.
    Striatum,
    /// Meta-agent that voices "I don't understand you" states.
    Uncertainty,
}

impl AgentKind {
    /// The five report-driven council members, in canonical order.
    /// Uncertainty is gated separately on prediction error.
    pub const COUNCIL: [AgentKind; 5] = [
        AgentKind::Intuition,
        AgentKind::Amygdala,
        AgentKind::Prefrontal,
        AgentKind::Social,
        AgentKind::Striatum,
    ];

    /// Stable wire name, also used as the report fragment key.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Intuition => "intuition",
            AgentKind::Amygdala => "amygdala",
            AgentKind::Prefrontal => "prefrontal",
            AgentKind::Social => "social",
            AgentKind::Striatum => "striatum",
            AgentKind::Uncertainty => "uncertainty",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard output of any cognitive agent for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSignal {
    pub agent: AgentKind,
    /// Activation strength, 0.0 to 10.0.
    pub score: f32,
    /// Short human-readable justification; modulation passes append to it.
    pub rationale: String,
    /// Internal confidence, 0.0 to 1.0.
    pub confidence: f32,
    pub latency_ms: u64,
    /// Optional style hint, e.g. "...but keep it brief".
    pub style_instruction: Option<String>,
}

impl AgentSignal {
    pub fn new(agent: AgentKind, score: f32, rationale: impl Into<String>, confidence: f32) -> Self {
        Self {
            agent,
            score: score.clamp(0.0, 10.0),
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
            latency_ms: 0,
            style_instruction: None,
        }
    }

    /// Multiply the score by a modulation factor, clamping back to [0, 10].
    /// A non-unit factor is recorded in the rationale for auditability.
    pub fn modulate(&mut self, factor: f32, label: &str) {
        if (factor - 1.0).abs() < f32::EPSILON {
            return;
        }
        self.score = (self.score * factor).clamp(0.0, 10.0);
        self.rationale
            .push_str(&format!(" [{} x{:.2}]", label, factor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps() {
        let s = AgentSignal::new(AgentKind::Social, 15.0, "over", 2.0);
        assert_eq!(s.score, 10.0);
        assert_eq!(s.confidence, 1.0);

        let s = AgentSignal::new(AgentKind::Social, -3.0, "under", -1.0);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn test_modulate_annotates() {
        let mut s = AgentSignal::new(AgentKind::Amygdala, 5.0, "threat", 0.8);
        s.modulate(1.5, "mod");
        assert!((s.score - 7.5).abs() < 1e-6);
        assert!(s.rationale.contains("x1.50"));
    }

    #[test]
    fn test_modulate_unit_factor_is_silent() {
        let mut s = AgentSignal::new(AgentKind::Amygdala, 5.0, "threat", 0.8);
        s.modulate(1.0, "mod");
        assert_eq!(s.rationale, "threat");
        assert_eq!(s.score, 5.0);
    }

    #[test]
    fn test_modulate_clamps_high() {
        let mut s = AgentSignal::new(AgentKind::Striatum, 9.0, "reward", 0.9);
        s.modulate(2.0, "mod");
        assert_eq!(s.score, 10.0);
    }

    #[test]
    fn test_council_order_is_stable() {
        assert_eq!(AgentKind::COUNCIL[0], AgentKind::Intuition);
        assert_eq!(AgentKind::COUNCIL[4], AgentKind::Striatum);
        assert_eq!(AgentKind::Social.as_str(), "social");
    }
}
