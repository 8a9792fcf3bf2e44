//! Override validation and the override audit record.
//!
//! Hard friction can only be overridden with a written justification; every
//! other level is accepted as-is. The validator never fails, it returns a
//! structured [`OverrideValidation`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::friction::FrictionDecision;
use super::types::{FrictionDimension, FrictionLevel, TradeAction};

/// Trailing window, in days, over which overrides drive escalation.
pub const OVERRIDE_WINDOW_DAYS: i64 = 7;

/// A request to proceed despite friction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverrideRequest {
    /// Level of the decision the user saw
    pub friction_level: FrictionLevel,
    /// Justification typed by the user
    #[serde(default)]
    pub user_reasoning: Option<String>,
}

/// Outcome of override validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideValidation {
    /// Whether the override is accepted
    pub valid: bool,
    /// Feedback for the user
    pub message: String,
}

impl OverrideValidation {
    fn accepted(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Accepts or rejects override attempts.
#[derive(Debug, Clone, Copy)]
pub struct OverrideValidator {
    min_reasoning_chars: usize,
}

impl Default for OverrideValidator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl OverrideValidator {
    /// Create a validator requiring `min_reasoning_chars` for hard overrides.
    pub fn new(min_reasoning_chars: usize) -> Self {
        Self {
            min_reasoning_chars,
        }
    }

    /// Validate an override attempt.
    ///
    /// Reasoning length is counted in characters, as typed.
    pub fn validate(&self, level: FrictionLevel, user_reasoning: Option<&str>) -> OverrideValidation {
        match level {
            FrictionLevel::Hard => {
                let Some(reasoning) = user_reasoning else {
                    warn!("Hard override rejected: no reasoning supplied");
                    return OverrideValidation::rejected(format!(
                        "Hard friction requires a written justification of at least {} characters before you can proceed.",
                        self.min_reasoning_chars
                    ));
                };

                let length = reasoning.chars().count();
                if length < self.min_reasoning_chars {
                    warn!(length, "Hard override rejected: reasoning too short");
                    return OverrideValidation::rejected(format!(
                        "Your justification is too short ({} of {} characters). Explain why this trade should proceed despite the warning.",
                        length, self.min_reasoning_chars
                    ));
                }

                info!(length, "Hard override accepted");
                OverrideValidation::accepted("Override accepted. Your reasoning has been recorded.")
            }
            FrictionLevel::Medium | FrictionLevel::Soft => {
                OverrideValidation::accepted("Override accepted.")
            }
            FrictionLevel::None => OverrideValidation::accepted("No friction to override."),
        }
    }

    /// Validate an [`OverrideRequest`].
    pub fn validate_request(&self, request: &OverrideRequest) -> OverrideValidation {
        self.validate(request.friction_level, request.user_reasoning.as_deref())
    }
}

// ============================================================================
// Audit Record
// ============================================================================

/// Unique identifier for an override record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OverrideId(pub String);

impl OverrideId {
    /// Create a new unique override ID.
    pub fn new() -> Self {
        Self(format!("ovr_{}", uuid::Uuid::new_v4()))
    }
}

impl Default for OverrideId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OverrideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dimension scores at the moment of the override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoresSnapshot {
    /// Research quality score
    pub research_quality: f64,
    /// Hours the thesis had been in development
    pub hours_in_development: f64,
    /// Conviction score
    pub conviction_score: f64,
    /// Conviction swing
    pub conviction_swing: f64,
    /// Level before escalation (equal to the shown level when not escalated)
    pub base_level: FrictionLevel,
}

/// Audit record of a user bypassing friction.
///
/// Built by the engine for the caller to persist; the engine itself never
/// stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessOverride {
    /// Record identifier
    pub id: OverrideId,
    /// User who overrode
    pub user_id: String,
    /// Symbol being traded
    pub symbol: String,
    /// Level the user saw (after escalation)
    pub friction_level: FrictionLevel,
    /// Message the user saw
    pub friction_reason: String,
    /// Dimension responsible
    pub dimension: FrictionDimension,
    /// Scores at override time
    pub scores_snapshot: ScoresSnapshot,
    /// User confirmed the override dialog
    pub override_confirmed: bool,
    /// Justification typed by the user
    pub user_reasoning: Option<String>,
    /// Action attempted
    pub action_attempted: TradeAction,
    /// When the override happened
    pub created_at: DateTime<Utc>,
}

impl ProcessOverride {
    /// Build an audit record from the decision the user overrode.
    #[allow(clippy::too_many_arguments)]
    pub fn from_decision(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        action: TradeAction,
        decision: &FrictionDecision,
        scores: ScoresSnapshot,
        user_reasoning: Option<String>,
        override_confirmed: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OverrideId::new(),
            user_id: user_id.into(),
            symbol: symbol.into(),
            friction_level: decision.level,
            friction_reason: decision.message.clone(),
            dimension: decision.dimension,
            scores_snapshot: scores,
            override_confirmed,
            user_reasoning,
            action_attempted: action,
            created_at,
        }
    }
}

/// Count a user's overrides within the trailing window ending at `now`.
pub fn count_recent_overrides(records: &[ProcessOverride], user_id: &str, now: DateTime<Utc>) -> u32 {
    let window_start = now - Duration::days(OVERRIDE_WINDOW_DAYS);
    records
        .iter()
        .filter(|r| r.user_id == user_id && r.created_at > window_start && r.created_at <= now)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_hard_without_reasoning_rejected() {
        let result = OverrideValidator::default().validate(FrictionLevel::Hard, None);
        assert!(!result.valid);
        assert!(result.message.contains("at least 10 characters"));
    }

    #[test]
    fn test_hard_with_short_reasoning_rejected() {
        let result = OverrideValidator::default().validate(FrictionLevel::Hard, Some("because"));
        assert!(!result.valid);
        assert!(result.message.contains("7 of 10"));
    }

    #[test]
    fn test_hard_boundary_lengths() {
        let validator = OverrideValidator::default();
        assert!(!validator.validate(FrictionLevel::Hard, Some("123456789")).valid);
        assert!(validator.validate(FrictionLevel::Hard, Some("1234567890")).valid);
    }

    #[test]
    fn test_hard_length_counts_padding() {
        let validator = OverrideValidator::default();
        // 12 characters as typed
        assert!(validator.validate(FrictionLevel::Hard, Some("  123456789 ")).valid);
        assert!(!validator.validate(FrictionLevel::Hard, Some(" 1234567 ")).valid);
    }

    #[test]
    fn test_hard_length_counts_characters_not_bytes() {
        // Nine characters, more than ten bytes
        let result = OverrideValidator::default().validate(FrictionLevel::Hard, Some("ééééééééé"));
        assert!(!result.valid);
        assert!(result.message.contains("9 of 10"));
    }

    #[test]
    fn test_other_levels_always_accept() {
        let validator = OverrideValidator::default();
        for level in [FrictionLevel::None, FrictionLevel::Soft, FrictionLevel::Medium] {
            assert!(validator.validate(level, None).valid);
            assert!(validator.validate(level, Some("")).valid);
        }
    }

    #[test]
    fn test_validate_request() {
        let request = OverrideRequest {
            friction_level: FrictionLevel::Hard,
            user_reasoning: Some("Earnings already priced in, sizing small".to_string()),
        };
        assert!(OverrideValidator::default().validate_request(&request).valid);
    }

    #[test]
    fn test_custom_minimum() {
        let validator = OverrideValidator::new(20);
        assert!(!validator.validate(FrictionLevel::Hard, Some("fifteen chars!!")).valid);
    }

    fn override_at(user: &str, days_ago: i64) -> ProcessOverride {
        let decision = FrictionDecision::new(
            FrictionLevel::Soft,
            FrictionDimension::ResearchQuality,
            "Research quality is 50/100.",
            "Review",
        );
        ProcessOverride::from_decision(
            user,
            "AAPL",
            TradeAction::Buy,
            &decision,
            ScoresSnapshot {
                research_quality: 50.0,
                hours_in_development: 12.0,
                conviction_score: 60.0,
                conviction_swing: 0.0,
                base_level: FrictionLevel::Soft,
            },
            None,
            true,
            now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_count_recent_overrides_window() {
        let records = vec![
            override_at("u1", 0),
            override_at("u1", 3),
            override_at("u1", 6),
            override_at("u1", 7),
            override_at("u1", 10),
            override_at("u2", 1),
        ];
        assert_eq!(count_recent_overrides(&records, "u1", now()), 3);
        assert_eq!(count_recent_overrides(&records, "u2", now()), 1);
        assert_eq!(count_recent_overrides(&records, "u3", now()), 0);
    }

    #[test]
    fn test_from_decision_copies_shown_level() {
        let record = override_at("u1", 0);
        assert_eq!(record.friction_level, FrictionLevel::Soft);
        assert_eq!(record.dimension, FrictionDimension::ResearchQuality);
        assert!(record.id.0.starts_with("ovr_"));
    }
}
