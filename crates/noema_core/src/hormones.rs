//! Hormonal state: the four-channel biochemical snapshot.
//!
//! The state itself is plain bounded data; the physics that evolves it
//! (decay curves, stimulus reactions) lives in `noema_neuro`. Splitting the
//! two keeps the snapshot serializable and testable on its own.

use crate::sanitize_f32;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Four-hormone internal state; every level is bounded to [0.0, 1.0].
///
/// - `ne` — norepinephrine: arousal/vigilance, spikes on surprise
/// - `da` — dopamine: motivation/reward, afterglow then crash
/// - `ht` — serotonin: stability/calm, slowly recovers toward 1.0
/// - `cort` — cortisol: stress load, clears over hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HormonalState {
    pub ne: f32,
    pub da: f32,
    pub ht: f32,
    pub cort: f32,
    pub last_update: DateTime<Utc>,
}

impl HormonalState {
    /// Resting levels each channel decays toward.
    pub const NE_BASELINE: f32 = 0.1;
    pub const DA_BASELINE: f32 = 0.3;
    pub const CORT_BASELINE: f32 = 0.1;
    /// Serotonin has no decay baseline: it recovers toward full stability.
    pub const HT_TARGET: f32 = 1.0;

    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ne: Self::NE_BASELINE,
            da: Self::DA_BASELINE,
            ht: 0.5,
            cort: Self::CORT_BASELINE,
            last_update: now,
        }
    }

    /// Clamp all levels and scrub non-finite values back to baseline.
    pub fn normalize(&mut self) {
        self.ne = sanitize_f32(self.ne, Self::NE_BASELINE).clamp(0.0, 1.0);
        self.da = sanitize_f32(self.da, Self::DA_BASELINE).clamp(0.0, 1.0);
        self.ht = sanitize_f32(self.ht, 0.5).clamp(0.0, 1.0);
        self.cort = sanitize_f32(self.cort, Self::CORT_BASELINE).clamp(0.0, 1.0);
    }
}

impl Default for HormonalState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
