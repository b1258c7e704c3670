//! The agent council: turning the shared report into per-agent signals.
//!
//! Every agent applies a personality-slider multiplier to its raw lens score
//! before arbitration ever sees it — a risk-tolerant persona literally cannot
//! hear its amygdala at full volume. Non-unit factors are annotated in the
//! rationale so a turn can always be audited.

use crate::oracle::CouncilReport;
use noema_core::config::{BotConfig, UncertaintyConfig};
use noema_core::{AgentKind, AgentSignal, PersonalitySliders};

/// Score an Intuition déjà-vu hit gets when the report itself was silent but
/// episodic memory resonated.
const DEJA_VU_SCORE: f32 = 6.0;

/// Slider-driven modulation factor per agent.
pub fn slider_modifier(agent: AgentKind, sliders: &PersonalitySliders) -> f32 {
    match agent {
        AgentKind::Intuition => 0.5 + sliders.pace_setting * 0.7,
        AgentKind::Amygdala => 1.5 - sliders.risk_tolerance * 1.2,
        AgentKind::Prefrontal => 1.3 - sliders.empathy_bias * 0.6,
        AgentKind::Social => 0.5 + sliders.empathy_bias,
        AgentKind::Striatum => 0.5 + sliders.risk_tolerance * 0.8,
        AgentKind::Uncertainty => 1.0,
    }
}

/// Build the council signals from a (complete) report.
///
/// `episodic_hit` marks that episodic recall returned something. In the
/// unified path a silent Intuition lens is promoted to a déjà-vu signal; when
/// `use_unified_council` is off, Intuition ignores the report entirely and
/// scores purely from episodic resonance (the legacy direct path).
pub fn signals_from_report(
    report: &CouncilReport,
    config: &BotConfig,
    episodic_hit: bool,
) -> Vec<AgentSignal> {
    let mut signals = Vec::with_capacity(AgentKind::COUNCIL.len() + 1);

    for agent in AgentKind::COUNCIL {
        let fragment = report.lenses.get(agent.as_str());
        let mut score = fragment.map(|f| f.score).unwrap_or(0.0);
        let mut rationale = fragment
            .map(|f| f.rationale.clone())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "no rationale".to_string());
        let confidence = fragment.map(|f| f.confidence).unwrap_or(0.0);

        if agent == AgentKind::Intuition {
            if config.use_unified_council {
                score *= config.intuition_gain;
                if score == 0.0 && episodic_hit {
                    score = DEJA_VU_SCORE;
                    rationale = "déjà vu: episodic memory resonates".to_string();
                }
            } else {
                // Legacy path: similarity to lived episodes is the only
                // intuition there is.
                if episodic_hit {
                    score = DEJA_VU_SCORE * config.intuition_gain;
                    rationale = "déjà vu: episodic memory resonates".to_string();
                } else {
                    score = 0.0;
                    rationale = "no episodic resonance".to_string();
                }
            }
        }

        let mut signal = AgentSignal::new(agent, score, rationale, confidence);
        signal.modulate(slider_modifier(agent, &config.sliders), "mod");
        signals.push(signal);
    }

    signals
}

/// The Uncertainty meta-agent: silent until prediction error crosses the
/// "lost" threshold, then loud enough to usually take the turn. Its entire
/// purpose is to force the council to admit "I don't understand you".
pub fn uncertainty_signal(prediction_error: f32, config: &UncertaintyConfig) -> AgentSignal {
    if prediction_error >= config.activation_threshold {
        AgentSignal::new(
            AgentKind::Uncertainty,
            config.active_score,
            format!("lost the thread (PE {:.2})", prediction_error),
            config.active_confidence,
        )
    } else {
        AgentSignal::new(
            AgentKind::Uncertainty,
            config.inactive_score,
            "tracking fine",
            config.inactive_confidence,
        )
    }
}
