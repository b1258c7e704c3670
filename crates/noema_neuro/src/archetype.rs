//! Archetype classification: hormone thresholds → named emotional category.
//!
//! The mapping is a total 3-bit lookup over {NE > 0.5, DA > 0.5, 5HT > 0.5}
//! with a cortisol override to BURNOUT, so classification is a pure function
//! of the current levels. Each archetype carries a style directive for the
//! response prompt and a table of per-agent score multipliers applied before
//! arbitration. The tables are data, not logic: they are tuned independently
//! and unit-tested exhaustively.

use noema_core::{AgentKind, HormonalState};
use serde::{Deserialize, Serialize};

/// Effective cortisol above this forces BURNOUT regardless of the lookup.
const BURNOUT_GATE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    Shame,
    Surprise,
    Fear,
    Rage,
    Calm,
    Joy,
    Disgust,
    Triumph,
    Burnout,
}

/// Classify a hormonal state. `effective_cort` is the excitement-masked
/// cortisol (see `NeuroModulation::effective_cortisol`), not the stored level.
pub fn classify(state: &HormonalState, effective_cort: f32) -> Archetype {
    if effective_cort > BURNOUT_GATE {
        return Archetype::Burnout;
    }

    match (state.ne > 0.5, state.da > 0.5, state.ht > 0.5) {
        (false, false, false) => Archetype::Shame,
        (false, false, true) => Archetype::Calm,
        (false, true, false) => Archetype::Disgust,
        (false, true, true) => Archetype::Joy,
        (true, false, false) => Archetype::Fear,
        (true, false, true) => Archetype::Surprise,
        (true, true, false) => Archetype::Rage,
        (true, true, true) => Archetype::Triumph,
    }
}

impl Archetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Shame => "SHAME",
            Archetype::Surprise => "SURPRISE",
            Archetype::Fear => "FEAR",
            Archetype::Rage => "RAGE",
            Archetype::Calm => "CALM",
            Archetype::Joy => "JOY",
            Archetype::Disgust => "DISGUST",
            Archetype::Triumph => "TRIUMPH",
            Archetype::Burnout => "BURNOUT",
        }
    }

    /// One fixed natural-language directive injected into the style prompt.
    pub fn style_directive(&self) -> &'static str {
        match self {
            Archetype::Shame => "[MOOD: Withdrawn. Hedge statements, avoid self-praise.]",
            Archetype::Surprise => "[MOOD: Alert and curious. Ask one clarifying question.]",
            Archetype::Fear => "[MOOD: On guard. Cautious wording, no commitments.]",
            Archetype::Rage => "[MOOD: Irritated. Clipped sentences, low patience.]",
            Archetype::Calm => "[MOOD: Even and unhurried.]",
            Archetype::Joy => "[MOOD: Warm and playful. Light humor welcome.]",
            Archetype::Disgust => "[MOOD: Cool distaste. Polite but curt.]",
            Archetype::Triumph => "[MOOD: Confident, energetic, generous.]",
            Archetype::Burnout => "[MOOD: Exhausted. Minimal effort, short replies.]",
        }
    }

    /// Per-agent score multipliers applied by arbitration before winner
    /// selection. Agents not listed keep their score unchanged.
    pub fn multipliers(&self) -> &'static [(AgentKind, f32)] {
        match self {
            Archetype::Rage => &[
                (AgentKind::Amygdala, 1.6),
                (AgentKind::Prefrontal, 0.6),
                (AgentKind::Social, 0.8),
            ],
            Archetype::Fear => &[
                (AgentKind::Amygdala, 1.8),
                (AgentKind::Striatum, 0.4),
                (AgentKind::Prefrontal, 0.7),
            ],
            Archetype::Burnout => &[
                (AgentKind::Prefrontal, 0.3),
                (AgentKind::Intuition, 1.5),
                (AgentKind::Amygdala, 1.2),
            ],
            Archetype::Shame => &[(AgentKind::Intuition, 1.3)],
            Archetype::Triumph => &[
                (AgentKind::Striatum, 1.3),
                (AgentKind::Amygdala, 0.5),
                (AgentKind::Prefrontal, 1.1),
            ],
            // Conservative tables for the states the reference never tuned.
            Archetype::Joy => &[
                (AgentKind::Striatum, 1.2),
                (AgentKind::Social, 1.2),
                (AgentKind::Amygdala, 0.7),
            ],
            Archetype::Surprise => &[(AgentKind::Intuition, 1.3), (AgentKind::Prefrontal, 1.1)],
            Archetype::Disgust => &[(AgentKind::Social, 0.7), (AgentKind::Amygdala, 1.3)],
            Archetype::Calm => &[],
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(ne: f32, da: f32, ht: f32, cort: f32) -> HormonalState {
        let mut s = HormonalState::new(Utc::now());
        s.ne = ne;
        s.da = da;
        s.ht = ht;
        s.cort = cort;
        s
    }

    #[test]
    fn test_burnout_override() {
        let s = state(0.9, 0.9, 0.9, 0.9);
        assert_eq!(classify(&s, 0.9), Archetype::Burnout);
        // Same levels but masked cortisol: the lookup applies instead.
        assert_eq!(classify(&s, 0.45), Archetype::Triumph);
    }

    #[test]
    fn test_lookup_is_total() {
        // Every corner of the 3-bit cube has a defined archetype.
        let corners = [
            (0.1, 0.1, 0.1, Archetype::Shame),
            (0.1, 0.1, 0.9, Archetype::Calm),
            (0.1, 0.9, 0.1, Archetype::Disgust),
            (0.1, 0.9, 0.9, Archetype::Joy),
            (0.9, 0.1, 0.1, Archetype::Fear),
            (0.9, 0.1, 0.9, Archetype::Surprise),
            (0.9, 0.9, 0.1, Archetype::Rage),
            (0.9, 0.9, 0.9, Archetype::Triumph),
        ];
        for (ne, da, ht, expected) in corners {
            let s = state(ne, da, ht, 0.1);
            assert_eq!(classify(&s, 0.1), expected, "ne={} da={} ht={}", ne, da, ht);
        }
    }

    #[test]
    fn test_classification_is_pure() {
        let s = state(0.7, 0.2, 0.6, 0.3);
        let a = classify(&s, 0.3);
        let b = classify(&s, 0.3);
        assert_eq!(a, b);
        assert_eq!(a, Archetype::Surprise);
    }

    #[test]
    fn test_multiplier_tables_are_sane() {
        for archetype in [
            Archetype::Shame,
            Archetype::Surprise,
            Archetype::Fear,
            Archetype::Rage,
            Archetype::Calm,
            Archetype::Joy,
            Archetype::Disgust,
            Archetype::Triumph,
            Archetype::Burnout,
        ] {
            for (agent, factor) in archetype.multipliers() {
                assert!(
                    *factor > 0.0 && *factor <= 2.0,
                    "{} multiplier for {} out of range: {}",
                    archetype,
                    agent,
                    factor
                );
            }
            assert!(!archetype.style_directive().is_empty());
        }
    }

    #[test]
    fn test_fear_boosts_amygdala() {
        let table = Archetype::Fear.multipliers();
        let amygdala = table
            .iter()
            .find(|(a, _)| *a == AgentKind::Amygdala)
            .unwrap();
        assert!(amygdala.1 > 1.0);
    }
}
