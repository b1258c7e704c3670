//! Hormonal physics: time-based decay and stimulus-based reactive updates.
//!
//! The model runs two passes per turn. First `decay` metabolizes the time
//! elapsed since the last message (each channel has its own clearance curve),
//! then `update_from_stimuli` applies the consequences of the current turn
//! (surprise, which agent won). Both passes keep every level in [0, 1].

use crate::archetype::{self, Archetype};
use chrono::{DateTime, Utc};
use noema_core::config::RewardCurve;
use noema_core::math::logistic;
use noema_core::{AgentKind, HormonalState};

// Clearance half-lives, in minutes.
const NE_HALF_LIFE: f32 = 5.0;
const DA_AFTERGLOW_HALF_LIFE: f32 = 60.0;
const DA_CRASH_HALF_LIFE: f32 = 10.0;
/// Elapsed time after which dopamine switches from afterglow to crash.
const DA_AFTERGLOW_WINDOW: f32 = 30.0;
const CORT_HALF_LIFE: f32 = 720.0;
const CORT_CALM_HALF_LIFE: f32 = 360.0;

/// Serotonin recovers linearly: full range over this many minutes.
const HT_RECOVERY_SPAN: f32 = 360.0;
/// Cortisol above this blocks most serotonin recovery.
const HT_STRESS_GATE: f32 = 0.7;
const HT_STRESSED_RATE: f32 = 0.3;
/// Serotonin above this accelerates cortisol clearance.
const CORT_CALM_GATE: f32 = 0.7;

/// Surprise-impact logistic parameters: raw cosine distance (0..2) is mapped
/// through this curve so near-synonym restatements score low and genuine
/// derailments score high.
const SURPRISE_MIDPOINT: f32 = 0.65;
const SURPRISE_STEEPNESS: f32 = 12.0;

/// Engagement below this counts as boredom and triggers vigilance seeking.
const TONIC_TEC_GATE: f32 = 0.3;
const TONIC_NE_GAIN: f32 = 2.5;

/// Exploration/exploitation mode, after the Locus Coeruleus analogy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcMode {
    /// Low engagement: explore, consider switching topics.
    Tonic,
    /// Healthy engagement: exploit the current topic.
    Phasic,
}

impl LcMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LcMode::Tonic => "tonic",
            LcMode::Phasic => "phasic",
        }
    }
}

/// The hormonal state machine. One instance per kernel; never reset after
/// construction.
#[derive(Debug, Clone)]
pub struct NeuroModulation {
    pub state: HormonalState,
}

impl NeuroModulation {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: HormonalState::new(now),
        }
    }

    /// Apply per-channel decay for the time elapsed since the last update.
    /// Returns the elapsed minutes for logging.
    pub fn decay(&mut self, now: DateTime<Utc>, topic_engagement: f32) -> f32 {
        let elapsed = (now - self.state.last_update).num_seconds() as f32 / 60.0;
        if elapsed <= 0.0 {
            return 0.0;
        }

        // NE is modeled spike-only: it always relaxes toward baseline.
        self.state.ne = decay_toward(
            self.state.ne,
            HormonalState::NE_BASELINE,
            elapsed,
            NE_HALF_LIFE,
        );

        // DA: slow afterglow for the first 30 minutes, fast crash after.
        let afterglow = elapsed.min(DA_AFTERGLOW_WINDOW);
        self.state.da = decay_toward(
            self.state.da,
            HormonalState::DA_BASELINE,
            afterglow,
            DA_AFTERGLOW_HALF_LIFE,
        );
        if elapsed > DA_AFTERGLOW_WINDOW {
            self.state.da = decay_toward(
                self.state.da,
                HormonalState::DA_BASELINE,
                elapsed - DA_AFTERGLOW_WINDOW,
                DA_CRASH_HALF_LIFE,
            );
        }

        // 5HT recovers linearly toward full stability; stress blocks most of
        // the recovery.
        let ht_rate = if self.state.cort > HT_STRESS_GATE {
            HT_STRESSED_RATE
        } else {
            1.0
        };
        self.state.ht =
            (self.state.ht + (elapsed / HT_RECOVERY_SPAN) * ht_rate).min(HormonalState::HT_TARGET);

        // Cortisol clears logarithmically; calm halves the clearance time.
        let cort_half_life = if self.state.ht > CORT_CALM_GATE {
            CORT_CALM_HALF_LIFE
        } else {
            CORT_HALF_LIFE
        };
        self.state.cort = decay_toward(
            self.state.cort,
            HormonalState::CORT_BASELINE,
            elapsed,
            cort_half_life,
        );

        // NOTE: the tonic boost also fires in update_from_stimuli, so it can
        // apply twice per turn. Preserved as-is from the reference behavior
        // pending clarification (see DESIGN.md).
        self.apply_tonic_boost(topic_engagement);

        self.state.last_update = now;
        self.state.normalize();
        elapsed
    }

    /// Reactive update from the outcome of the current turn.
    ///
    /// `impact` is the biological surprise impact (see
    /// [`NeuroModulation::compute_surprise_impact`]), not the raw distance.
    pub fn update_from_stimuli(
        &mut self,
        impact: f32,
        winner: AgentKind,
        reward: Option<&RewardCurve>,
        topic_engagement: f32,
    ) {
        // Norepinephrine: vigilance spike proportional to surprise.
        if impact > 0.1 {
            self.state.ne += impact * 0.5;
        }

        // Dopamine: configured reward curve, or the legacy fixed bumps.
        match reward {
            Some(curve) => {
                self.state.da += logistic(impact, curve.threshold, curve.sensitivity) * curve.gain;
            }
            None => match winner {
                AgentKind::Striatum => self.state.da += 0.2,
                AgentKind::Social => self.state.da += 0.05,
                _ => {}
            },
        }

        // Serotonin: emotional labor consumes it, being in sync restores it.
        if winner == AgentKind::Social {
            self.state.ht -= 0.05;
        }
        if impact < 0.1 {
            self.state.ht += 0.05;
        }

        // Cortisol: threat handling is stressful, severe surprise more so.
        if winner == AgentKind::Amygdala {
            self.state.cort += 0.25;
        }
        if impact > 0.6 {
            self.state.cort += 0.15;
        }

        self.apply_tonic_boost(topic_engagement);
        self.state.normalize();
    }

    /// Vigilance under boredom: low engagement produces a tonic NE boost
    /// (seeking behavior), independent of any stimulus.
    fn apply_tonic_boost(&mut self, tec: f32) {
        if tec < TONIC_TEC_GATE {
            self.state.ne += (TONIC_TEC_GATE - tec) * TONIC_NE_GAIN;
        }
    }

    /// Map raw prediction error (cosine distance, 0..2) to biological impact
    /// in [0, 1]. Exactly 0.5 at the 0.65 midpoint, monotone in the input.
    pub fn compute_surprise_impact(&self, raw_error: f32) -> f32 {
        logistic(raw_error, SURPRISE_MIDPOINT, SURPRISE_STEEPNESS)
    }

    /// Cortisol as seen by the archetype classifier: excitement masks stress.
    /// The stored level is never modified by this.
    pub fn effective_cortisol(&self) -> f32 {
        if self.state.da > 0.8 {
            self.state.cort * 0.5
        } else {
            self.state.cort
        }
    }

    /// Current emotional archetype. Pure function of the hormone levels.
    pub fn archetype(&self) -> Archetype {
        archetype::classify(&self.state, self.effective_cortisol())
    }

    pub fn lc_mode(&self, tec: f32) -> LcMode {
        if tec < TONIC_TEC_GATE {
            LcMode::Tonic
        } else {
            LcMode::Phasic
        }
    }

    /// Mechanical summation of hormones into control signals
    /// (tempo, social temperature, cognitive load).
    pub fn control_signals(&self) -> (f32, f32, f32) {
        let s = &self.state;
        let tempo = (s.ne + 0.5 * s.cort - 0.3 * s.ht).clamp(0.0, 1.0);
        let social_temp = (s.ht + s.da - s.cort).clamp(0.0, 1.0);
        let cog_load = (1.0 - s.cort + 0.2 * s.da).clamp(0.1, 1.0);
        (tempo, social_temp, cog_load)
    }

    /// Render control signals as token-efficient style constraints for the
    /// response prompt.
    pub fn style_instruction(&self) -> String {
        let (tempo, social, load) = self.control_signals();
        let mut parts = Vec::new();

        if tempo > 0.8 {
            parts.push("[CONSTRAINT: Max 15 words. Direct answer.]");
        } else if tempo > 0.6 {
            parts.push("[CONSTRAINT: Short sentences. Fast pace.]");
        } else if tempo < 0.3 {
            parts.push("[STYLE: Relaxed, narrative, detailed.]");
        }

        if social < 0.3 {
            parts.push("[TONE: Dry, formal, distant.]");
        } else if social > 0.7 {
            parts.push("[TONE: Warm, empathetic.]");
        }

        if load < 0.4 {
            parts.push("[STATE: Stressed. Simplistic thinking. Defensive.]");
        } else if self.state.da > 0.8 {
            parts.push("[STATE: Euphoric. High energy.]");
        }

        if parts.is_empty() {
            "[STYLE: Balanced conversation.]".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Exponential half-life relaxation toward a baseline, from either direction.
fn decay_toward(current: f32, baseline: f32, minutes: f32, half_life: f32) -> f32 {
    let diff = current - baseline;
    baseline + diff * 0.5_f32.powf(minutes / half_life)
}
