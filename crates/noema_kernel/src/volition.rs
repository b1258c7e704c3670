//! Volitional gating: which learned behavioral pattern owns this turn, and
//! how it reweights the council.
//!
//! The modulation matrix encodes an intervention policy keyed on impulse
//! family × motivational fuel: when fuel is depleted, push supportive,
//! low-effort framing; when fuel is abundant, push challenge and logic. The
//! tables are pure data so they can be tuned and tested exhaustively.

use chrono::{DateTime, Utc};
use noema_core::{AgentKind, AgentSignal, MoodVector};
use noema_memory::VolitionalPattern;

pub const PERSISTENCE_BONUS: f32 = 0.3;
pub const FOCUS_DURATION: u32 = 3;
/// Effective score a pattern must exceed to take (or keep proposing) focus.
pub const FOCUS_THRESHOLD: f32 = 0.6;

/// Fuel below this is the depleted regime, above the high regime; the
/// mid-band gets no modulation.
const FUEL_LOW: f32 = 0.4;
const FUEL_HIGH: f32 = 0.7;

/// Mood filter on volitional influence.
const FEARFUL_DAMPING: f32 = 0.2;
const TRIUMPHANT_GAIN: f32 = 1.2;

/// Which pattern currently owns the conversation. Kernel-volatile: cleared
/// whenever a different user is processed.
#[derive(Debug, Clone, Default)]
pub struct ActiveFocus {
    pub pattern_id: Option<String>,
    pub turns_remaining: u32,
    pub user_id: Option<i64>,
}

/// A named reweighting of the council.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub multipliers: &'static [(AgentKind, f32)],
}

/// No modulation: unknown impulses and mid-band fuel land here.
pub const STANDARD: Strategy = Strategy {
    name: "Standard",
    multipliers: &[],
};

/// The full matrix: 4 impulse families × 2 fuel regimes.
const MATRIX: &[(&[&str], Strategy, Strategy)] = &[
    (
        &["laziness", "procrastination"],
        // Low fuel: remove friction, make the first step trivial.
        Strategy {
            name: "Baby Steps",
            multipliers: &[
                (AgentKind::Social, 1.5),
                (AgentKind::Intuition, 1.3),
                (AgentKind::Prefrontal, 0.5),
            ],
        },
        // High fuel: the user can take a push.
        Strategy {
            name: "Challenge",
            multipliers: &[
                (AgentKind::Prefrontal, 1.4),
                (AgentKind::Striatum, 1.2),
                (AgentKind::Social, 0.6),
            ],
        },
    ),
    (
        &["fear", "anxiety"],
        Strategy {
            name: "Safe Harbor",
            multipliers: &[
                (AgentKind::Social, 1.6),
                (AgentKind::Intuition, 1.2),
                (AgentKind::Amygdala, 0.7),
            ],
        },
        Strategy {
            name: "Exposure",
            multipliers: &[
                (AgentKind::Prefrontal, 1.3),
                (AgentKind::Striatum, 1.2),
                (AgentKind::Amygdala, 0.8),
            ],
        },
    ),
    (
        &["anger", "rage"],
        Strategy {
            name: "Cooldown",
            multipliers: &[
                (AgentKind::Social, 1.4),
                (AgentKind::Prefrontal, 1.2),
                (AgentKind::Amygdala, 0.5),
            ],
        },
        Strategy {
            name: "Channeling",
            multipliers: &[
                (AgentKind::Striatum, 1.3),
                (AgentKind::Prefrontal, 1.2),
                (AgentKind::Social, 0.7),
            ],
        },
    ),
    (
        &["boredom"],
        Strategy {
            name: "Gentle Spark",
            multipliers: &[(AgentKind::Intuition, 1.4), (AgentKind::Social, 1.2)],
        },
        Strategy {
            name: "Novelty Rush",
            multipliers: &[
                (AgentKind::Striatum, 1.5),
                (AgentKind::Intuition, 1.2),
                (AgentKind::Prefrontal, 0.7),
            ],
        },
    ),
];

/// Pick the strategy for an impulse name and fuel level.
pub fn select_strategy(impulse: &str, fuel: f32) -> Strategy {
    let impulse = impulse.to_lowercase();
    for (keywords, low, high) in MATRIX {
        if keywords.iter().any(|k| impulse.contains(k)) {
            if fuel < FUEL_LOW {
                return *low;
            }
            if fuel > FUEL_HIGH {
                return *high;
            }
            return STANDARD;
        }
    }
    STANDARD
}

/// Select the dominant active pattern for this turn, maintaining the focus
/// window.
///
/// Effective score = intensity + learned_delta − decay penalty
/// (+ persistence bonus while focused), scaled by the affective filter:
/// a fearful mood suppresses volition, a triumphant one amplifies it.
pub fn select_dominant(
    patterns: &[VolitionalPattern],
    focus: &mut ActiveFocus,
    user_id: i64,
    mood: &MoodVector,
    now: DateTime<Utc>,
) -> Option<VolitionalPattern> {
    // Focus never carries across users.
    let current_focus_id = if focus.user_id == Some(user_id) && focus.turns_remaining > 0 {
        focus.turns_remaining -= 1;
        focus.pattern_id.clone()
    } else {
        *focus = ActiveFocus {
            pattern_id: None,
            turns_remaining: 0,
            user_id: Some(user_id),
        };
        None
    };

    let mood_factor = if mood.is_fearful() {
        FEARFUL_DAMPING
    } else if mood.is_triumphant() {
        TRIUMPHANT_GAIN
    } else {
        1.0
    };

    let mut best: Option<(f32, &VolitionalPattern)> = None;
    for pattern in patterns.iter().filter(|p| p.is_active) {
        let mut score = pattern.intensity + pattern.learned_delta - pattern.decay_penalty(now);
        if current_focus_id.as_deref() == Some(pattern.id.as_str()) {
            score += PERSISTENCE_BONUS;
        }
        score *= mood_factor;
        if best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, pattern));
        }
    }

    let (score, winner) = best?;
    if score <= FOCUS_THRESHOLD {
        return None;
    }

    if current_focus_id.as_deref() != Some(winner.id.as_str()) {
        tracing::debug!("volitional focus -> {} ({})", winner.impulse, winner.id);
        *focus = ActiveFocus {
            pattern_id: Some(winner.id.clone()),
            turns_remaining: FOCUS_DURATION,
            user_id: Some(user_id),
        };
    }
    Some(winner.clone())
}

/// Apply the winning pattern's strategy to the council. Returns the strategy
/// for diagnostics.
pub fn apply_modulation(signals: &mut [AgentSignal], pattern: &VolitionalPattern) -> Strategy {
    let strategy = select_strategy(&pattern.impulse, pattern.fuel);
    for (agent, factor) in strategy.multipliers {
        if let Some(signal) = signals.iter_mut().find(|s| s.agent == *agent) {
            signal.modulate(*factor, strategy.name);
        }
    }
    strategy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_signals() -> Vec<AgentSignal> {
        AgentKind::COUNCIL
            .iter()
            .map(|a| AgentSignal::new(*a, 5.0, "neutral", 0.5))
            .collect()
    }

    fn pattern(impulse: &str, fuel: f32) -> VolitionalPattern {
        let mut p = VolitionalPattern::new("coding", impulse, "project");
        p.fuel = fuel;
        p.intensity = 0.8;
        p
    }

    fn score_of(signals: &[AgentSignal], agent: AgentKind) -> f32 {
        signals.iter().find(|s| s.agent == agent).unwrap().score
    }

    #[test]
    fn test_low_fuel_laziness_favors_social() {
        let mut signals = neutral_signals();
        let strategy = apply_modulation(&mut signals, &pattern("laziness", 0.2));
        assert_eq!(strategy.name, "Baby Steps");
        assert!(score_of(&signals, AgentKind::Social) >= score_of(&signals, AgentKind::Prefrontal));
    }

    #[test]
    fn test_high_fuel_laziness_favors_challenge() {
        let mut signals = neutral_signals();
        let strategy = apply_modulation(&mut signals, &pattern("laziness", 0.9));
        assert_eq!(strategy.name, "Challenge");
        assert!(score_of(&signals, AgentKind::Prefrontal) > score_of(&signals, AgentKind::Social));
    }

    #[test]
    fn test_mid_band_fuel_is_standard() {
        let strategy = select_strategy("laziness", 0.5);
        assert_eq!(strategy.name, "Standard");
        assert!(strategy.multipliers.is_empty());
    }

    #[test]
    fn test_unknown_impulse_is_standard() {
        assert_eq!(select_strategy("wanderlust", 0.1).name, "Standard");
    }

    #[test]
    fn test_impulse_substring_match() {
        assert_eq!(select_strategy("social anxiety", 0.2).name, "Safe Harbor");
        assert_eq!(select_strategy("rage at tooling", 0.9).name, "Channeling");
        assert_eq!(select_strategy("boredom", 0.1).name, "Gentle Spark");
        assert_eq!(select_strategy("procrastination", 0.9).name, "Challenge");
    }

    #[test]
    fn test_dominant_selection_and_focus_window() {
        let now = Utc::now();
        let mood = MoodVector::default();
        let mut focus = ActiveFocus::default();

        let strong = pattern("laziness", 0.5);
        let strong_id = strong.id.clone();
        let mut weak = pattern("boredom", 0.5);
        weak.intensity = 0.3;
        let patterns = vec![weak, strong];

        let selected = select_dominant(&patterns, &mut focus, 1, &mood, now).unwrap();
        assert_eq!(selected.id, strong_id);
        assert_eq!(focus.pattern_id.as_deref(), Some(strong_id.as_str()));
        assert_eq!(focus.turns_remaining, FOCUS_DURATION);

        // Next turn the focused pattern gets the persistence bonus and the
        // window counts down.
        select_dominant(&patterns, &mut focus, 1, &mood, now).unwrap();
        assert_eq!(focus.turns_remaining, FOCUS_DURATION - 1);
    }

    #[test]
    fn test_weak_patterns_select_nothing() {
        let now = Utc::now();
        let mut focus = ActiveFocus::default();
        let mut weak = pattern("laziness", 0.5);
        weak.intensity = 0.4;
        weak.learned_delta = 0.0;
        let selected = select_dominant(&[weak], &mut focus, 1, &MoodVector::default(), now);
        assert!(selected.is_none());
        assert!(focus.pattern_id.is_none());
    }

    #[test]
    fn test_fearful_mood_suppresses_volition() {
        let now = Utc::now();
        let mut focus = ActiveFocus::default();
        let strong = pattern("laziness", 0.5); // intensity 0.8 > threshold
        let fear = MoodVector::new(-0.5, 0.8, -0.6);
        let selected = select_dominant(&[strong], &mut focus, 1, &fear, now);
        // 0.8 * 0.2 = 0.16 — far below the focus threshold.
        assert!(selected.is_none());
    }

    #[test]
    fn test_triumphant_mood_amplifies_volition() {
        let now = Utc::now();
        let mut focus = ActiveFocus::default();
        let mut borderline = pattern("laziness", 0.5);
        borderline.intensity = 0.55; // below threshold unaided
        let triumph = MoodVector::new(0.6, 0.8, 0.6);
        let selected = select_dominant(&[borderline], &mut focus, 1, &triumph, now);
        assert!(selected.is_some(), "0.55 * 1.2 = 0.66 crosses the threshold");
    }

    #[test]
    fn test_focus_cleared_for_new_user() {
        let now = Utc::now();
        let mut focus = ActiveFocus::default();
        let p = pattern("laziness", 0.5);
        select_dominant(&[p.clone()], &mut focus, 1, &MoodVector::default(), now).unwrap();
        assert_eq!(focus.user_id, Some(1));

        select_dominant(&[p], &mut focus, 2, &MoodVector::default(), now).unwrap();
        assert_eq!(focus.user_id, Some(2));
        assert_eq!(focus.turns_remaining, FOCUS_DURATION);
    }

    #[test]
    fn test_inactive_patterns_ignored() {
        let now = Utc::now();
        let mut focus = ActiveFocus::default();
        let mut p = pattern("laziness", 0.5);
        p.is_active = false;
        assert!(select_dominant(&[p], &mut focus, 1, &MoodVector::default(), now).is_none());
    }
}
