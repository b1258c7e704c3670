//! Arbitration: the ordered modulation passes and winner selection.
//!
//! Pass order matters — each pass reads and rewrites the shared signal list:
//! (1) hormonal archetype multipliers, (2) volitional strategy matrix,
//! (3) chaos injection, (4) tonic exploration boost. Only then are signals
//! sorted and the winner chosen.

use noema_core::{AgentKind, AgentSignal};
use noema_neuro::{Archetype, LcMode};
use rand::Rng;

/// Chaos below this level injects nothing.
const CHAOS_FLOOR: f32 = 0.05;
/// Noise magnitude above this is annotated in the rationale.
const CHAOS_ANNOTATE: f32 = 0.5;
/// Prefrontal boost in tonic (exploration) mode.
const TONIC_PREFRONTAL_BOOST: f32 = 1.25;
/// Losers above this score still color the reply's tone.
const STRONG_LOSER_FLOOR: f32 = 5.0;

/// Pass 1: the current archetype's per-agent multipliers.
pub fn apply_hormonal(signals: &mut [AgentSignal], archetype: Archetype) {
    for (agent, factor) in archetype.multipliers() {
        if let Some(signal) = signals.iter_mut().find(|s| s.agent == *agent) {
            signal.modulate(*factor, archetype.as_str());
        }
    }
}

/// Pass 3: entropy injection. Every score gets independent uniform noise in
/// [-2·chaos, +2·chaos], clamped back to [0, 10].
pub fn apply_chaos(signals: &mut [AgentSignal], chaos_level: f32) {
    if chaos_level <= CHAOS_FLOOR {
        return;
    }
    let mut rng = rand::thread_rng();
    let spread = chaos_level * 2.0;
    for signal in signals.iter_mut() {
        let noise: f32 = rng.gen_range(-spread..=spread);
        signal.score = (signal.score + noise).clamp(0.0, 10.0);
        if noise.abs() > CHAOS_ANNOTATE {
            signal
                .rationale
                .push_str(&format!(" [chaos {:+.2}]", noise));
        }
    }
}

/// Pass 4: in tonic (exploration) mode, boost Prefrontal so the reply leans
/// into structured topic-opening rather than more of the same.
pub fn apply_tonic_boost(signals: &mut [AgentSignal], lc_mode: LcMode) {
    if lc_mode != LcMode::Tonic {
        return;
    }
    if let Some(signal) = signals.iter_mut().find(|s| s.agent == AgentKind::Prefrontal) {
        signal.modulate(TONIC_PREFRONTAL_BOOST, "tonic");
    }
}

/// Sort descending and split into winner + strong losers.
///
/// The sort is stable, so at chaos 0 the outcome is deterministic and ties
/// resolve by input order.
pub fn arbitrate(mut signals: Vec<AgentSignal>) -> (AgentSignal, Vec<AgentSignal>) {
    debug_assert!(!signals.is_empty());
    signals.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let winner = signals.remove(0);
    let strong_losers = signals
        .into_iter()
        .filter(|s| s.score > STRONG_LOSER_FLOOR)
        .collect();
    (winner, strong_losers)
}
