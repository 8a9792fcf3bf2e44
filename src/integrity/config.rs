//! Threshold configuration for the friction orchestrator and override validator.
//!
//! Defaults reproduce the fixed thresholds of the gating rules. Every
//! field can be overridden from the environment via [`FrictionConfig::from_env`].

use crate::error::AppError;

/// Thresholds for one "lower is worse" dimension.
///
/// A value below `hard` yields hard friction, below `medium` medium, below
/// `soft` soft; anything else yields none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    /// Below this: hard friction
    pub hard: f64,
    /// Below this: medium friction
    pub medium: f64,
    /// Below this: soft friction
    pub soft: f64,
}

impl LevelThresholds {
    /// Create a new threshold triple.
    pub fn new(hard: f64, medium: f64, soft: f64) -> Self {
        Self { hard, medium, soft }
    }

    fn validate(&self, name: &str) -> Result<(), AppError> {
        if self.hard < self.medium && self.medium < self.soft {
            Ok(())
        } else {
            Err(AppError::Config {
                message: format!(
                    "{} thresholds must be strictly increasing (hard < medium < soft), got {} / {} / {}",
                    name, self.hard, self.medium, self.soft
                ),
            })
        }
    }
}

/// Configuration for the friction orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct FrictionConfig {
    /// Research quality score thresholds
    pub research: LevelThresholds,

    /// Hours-in-development thresholds
    pub time_hours: LevelThresholds,

    /// Conviction swing above which medium friction applies
    pub swing_threshold: f64,

    /// Conviction score at or above which the user is treated as overconfident
    pub overconfidence_threshold: f64,

    /// Overrides in the trailing window that trigger one-step escalation
    pub escalation_override_count: u32,

    /// Minimum justification length when overriding hard friction
    pub min_override_reasoning_chars: usize,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self {
            research: LevelThresholds::new(20.0, 40.0, 60.0),
            time_hours: LevelThresholds::new(1.0, 4.0, 8.0),
            swing_threshold: 30.0,
            overconfidence_threshold: 95.0,
            escalation_override_count: 3,
            min_override_reasoning_chars: 10,
        }
    }
}

impl FrictionConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let config = Self {
            research: LevelThresholds::new(
                env_or("FRICTION_RESEARCH_HARD", defaults.research.hard),
                env_or("FRICTION_RESEARCH_MEDIUM", defaults.research.medium),
                env_or("FRICTION_RESEARCH_SOFT", defaults.research.soft),
            ),
            time_hours: LevelThresholds::new(
                env_or("FRICTION_TIME_HARD_HOURS", defaults.time_hours.hard),
                env_or("FRICTION_TIME_MEDIUM_HOURS", defaults.time_hours.medium),
                env_or("FRICTION_TIME_SOFT_HOURS", defaults.time_hours.soft),
            ),
            swing_threshold: env_or("FRICTION_SWING_THRESHOLD", defaults.swing_threshold),
            overconfidence_threshold: env_or(
                "FRICTION_OVERCONFIDENCE_THRESHOLD",
                defaults.overconfidence_threshold,
            ),
            escalation_override_count: env_or(
                "FRICTION_ESCALATION_OVERRIDES",
                defaults.escalation_override_count,
            ),
            min_override_reasoning_chars: env_or(
                "OVERRIDE_MIN_REASONING_CHARS",
                defaults.min_override_reasoning_chars,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that threshold triples are ordered.
    pub fn validate(&self) -> Result<(), AppError> {
        self.research.validate("Research quality")?;
        self.time_hours.validate("Time in thesis")?;
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
