//! Behavioral configuration: personality sliders, prediction-error bands, and
//! oracle wiring. TOML-backed with env-var overrides, defaults everywhere.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NoemaConfig {
    pub bot: BotConfig,
    pub pe: PeThresholds,
    pub uncertainty: UncertaintyConfig,
    pub oracle: OracleConfig,
}

impl NoemaConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields, then apply env overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: NoemaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NOEMA_BOT_NAME") {
            self.bot.name = v;
        }
        if let Ok(v) = std::env::var("NOEMA_CHAOS_LEVEL") {
            if let Ok(n) = v.parse() {
                self.bot.chaos_level = n;
            }
        }
        if let Ok(v) = std::env::var("NOEMA_INTUITION_GAIN") {
            if let Ok(n) = v.parse() {
                self.bot.intuition_gain = n;
            }
        }
        if let Ok(v) = std::env::var("PE_THRESHOLD_IN_SYNC") {
            if let Ok(n) = v.parse() {
                self.pe.in_sync = n;
            }
        }
        if let Ok(v) = std::env::var("PE_THRESHOLD_LOST") {
            if let Ok(n) = v.parse() {
                self.pe.lost = n;
            }
        }
        if let Ok(v) = std::env::var("ORACLE_BASE_URL") {
            self.oracle.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("ORACLE_MODEL") {
            self.oracle.model = v;
        }
    }
}

// ============================================================================
// Persona
// ============================================================================

/// Per-persona configuration the kernel is constructed with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    pub gender: String,
    pub sliders: PersonalitySliders,
    /// Entropy injected into arbitration; below 0.05 no noise is added.
    pub chaos_level: f32,
    /// Multiplier on the Intuition lens score in the unified council.
    pub intuition_gain: f32,
    /// Unified council (one shared report) vs legacy per-agent calls.
    pub use_unified_council: bool,
    /// Dopamine reward curve; when absent the legacy fixed bumps apply.
    pub reward: Option<RewardCurve>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Noema".to_string(),
            gender: "Neutral".to_string(),
            sliders: PersonalitySliders::default(),
            chaos_level: 0.0,
            intuition_gain: 1.0,
            use_unified_council: true,
            reward: None,
        }
    }
}

/// Dynamic personality axes, each 0.0 to 1.0. These modulate raw agent scores
/// every turn.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PersonalitySliders {
    /// 0.0 coward — 1.0 reckless. Feeds Amygdala (inverse) and Striatum.
    pub risk_tolerance: f32,
    /// 0.0 cold — 1.0 bleeding heart. Feeds Social and Prefrontal (inverse).
    pub empathy_bias: f32,
    /// 0.0 reflective — 1.0 impulsive. Feeds Intuition.
    pub pace_setting: f32,
    /// 0.0 bored — 1.0 wonder. Reserved for the curiosity drive.
    pub curiosity_drive: f32,
}

impl Default for PersonalitySliders {
    fn default() -> Self {
        Self {
            risk_tolerance: 0.5,
            empathy_bias: 0.5,
            pace_setting: 0.5,
            curiosity_drive: 0.5,
        }
    }
}

/// Sigmoid dopamine response to surprise impact.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RewardCurve {
    /// Impact level at which the reward response is half-maximal.
    pub threshold: f32,
    /// Steepness of the response around the threshold.
    pub sensitivity: f32,
    /// Maximum dopamine bump per turn.
    pub gain: f32,
}

impl Default for RewardCurve {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            sensitivity: 8.0,
            gain: 0.2,
        }
    }
}

// ============================================================================
// Prediction-error bands
// ============================================================================

/// Empathy-alignment bands over raw prediction error.
///
/// in_sync below 0.3, lost at 0.8 and above, puzzled in between.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PeThresholds {
    pub in_sync: f32,
    pub lost: f32,
}

impl Default for PeThresholds {
    fn default() -> Self {
        Self {
            in_sync: 0.3,
            lost: 0.8,
        }
    }
}

impl PeThresholds {
    pub fn band(&self, prediction_error: f32) -> PeBand {
        if prediction_error < self.in_sync {
            PeBand::InSync
        } else if prediction_error >= self.lost {
            PeBand::Lost
        } else {
            PeBand::Puzzled
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeBand {
    InSync,
    Puzzled,
    Lost,
}

/// Gating for the Uncertainty meta-agent.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    /// Surprise-impact level at which the agent activates.
    pub activation_threshold: f32,
    /// High enough to usually win the council when active.
    pub active_score: f32,
    pub inactive_score: f32,
    pub active_confidence: f32,
    pub inactive_confidence: f32,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.8,
            active_score: 7.5,
            inactive_score: 1.0,
            active_confidence: 0.9,
            inactive_confidence: 0.1,
        }
    }
}

// ============================================================================
// Oracle wiring
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: String,
    pub model: String,
    pub embedding_model: String,
    pub base_url: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: None,
        }
    }
}
