//! Friction orchestration.
//!
//! Maps each dimension result to a friction level, selects the most severe,
//! and escalates by one step when the user has a recent habit of overriding.
//!
//! ```text
//! research ──┐
//! time ──────┼──> classify ──> most severe ──> escalate(override count) ──> FrictionDecision
//! conviction ┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{FrictionConfig, LevelThresholds};
use super::conviction::ConvictionResult;
use super::overrides::OVERRIDE_WINDOW_DAYS;
use super::research::ResearchQualityResult;
use super::thesis_time::{format_hours, suggested_wait, TimeMetrics};
use super::types::{ConvictionTrend, FrictionDimension, FrictionLevel};

/// A single friction verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrictionDecision {
    /// Severity
    pub level: FrictionLevel,
    /// Dimension responsible, or `combined`
    pub dimension: FrictionDimension,
    /// Explanation shown to the user
    pub message: String,
    /// What the user should do instead of proceeding right away
    pub suggested_action: String,
    /// Whether the user may proceed anyway
    pub can_override: bool,
    /// Extra warning shown in the override dialog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_warning: Option<String>,
    /// Every dimension that produced friction
    #[serde(default)]
    pub contributing_dimensions: Vec<FrictionDimension>,
    /// Level before override-history escalation, when escalation changed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_from: Option<FrictionLevel>,
}

impl FrictionDecision {
    /// Create a decision for one dimension.
    pub fn new(
        level: FrictionLevel,
        dimension: FrictionDimension,
        message: impl Into<String>,
        suggested_action: impl Into<String>,
    ) -> Self {
        Self {
            level,
            dimension,
            message: message.into(),
            suggested_action: suggested_action.into(),
            can_override: level.is_friction(),
            override_warning: None,
            contributing_dimensions: if level.is_friction() {
                vec![dimension]
            } else {
                Vec::new()
            },
            escalated_from: None,
        }
    }

    /// The "clear to proceed" decision.
    pub fn clear() -> Self {
        Self::new(
            FrictionLevel::None,
            FrictionDimension::Combined,
            "Research, thesis maturity and conviction all look healthy.",
            "Clear to proceed.",
        )
    }

    /// Whether the action may go ahead without an override.
    pub fn can_proceed(&self) -> bool {
        !self.level.is_friction()
    }
}

/// Combines dimension results into one [`FrictionDecision`].
#[derive(Debug, Clone, Default)]
pub struct FrictionOrchestrator {
    config: FrictionConfig,
}

impl FrictionOrchestrator {
    /// Create a new orchestrator.
    pub fn new(config: FrictionConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &FrictionConfig {
        &self.config
    }

    /// Classify research quality. `None` means no friction from this dimension.
    pub fn classify_research(&self, research: &ResearchQualityResult) -> Option<FrictionDecision> {
        let score = research.score;
        let level = level_below(score, &self.config.research);

        let (message, action) = match level {
            FrictionLevel::None => return None,
            FrictionLevel::Hard => (
                format!(
                    "Research quality is {:.0}/100. There is almost no documented research behind this trade.",
                    score
                ),
                "Complete a research session: use several tools, document your assumptions and engage the devil's advocate.".to_string(),
            ),
            FrictionLevel::Medium => (
                format!(
                    "Research quality is {:.0}/100. Key parts of the research process are missing.",
                    score
                ),
                research
                    .recommendations
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Fill the gaps in your research before trading.".to_string()),
            ),
            FrictionLevel::Soft => (
                format!(
                    "Research quality is {:.0}/100. A little more research would strengthen this thesis.",
                    score
                ),
                research
                    .recommendations
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Review your research once more.".to_string()),
            ),
        };

        Some(FrictionDecision::new(
            level,
            FrictionDimension::ResearchQuality,
            message,
            action,
        ))
    }

    /// Classify time in thesis.
    pub fn classify_time(&self, time: &TimeMetrics) -> Option<FrictionDecision> {
        let hours = time.hours_in_development;
        let level = level_below(hours, &self.config.time_hours);
        if !level.is_friction() {
            return None;
        }

        let mut message = format!(
            "This thesis is only {} old. {}",
            format_hours(hours),
            time.maturity_level.description()
        );
        if time.is_rushed {
            message.push_str(&format!(
                " It has been refined {} time(s), which looks rushed.",
                time.evolution_event_count
            ));
        }

        let action = match suggested_wait(hours, &self.config.time_hours) {
            Some(wait) => format!("Let the idea settle: {} before executing.", wait),
            None => "Revisit the thesis once more before executing.".to_string(),
        };

        Some(FrictionDecision::new(
            level,
            FrictionDimension::TimeInThesis,
            message,
            action,
        ))
    }

    /// Classify conviction integrity.
    ///
    /// A large swing is medium regardless of the absolute score; otherwise an
    /// overconfident score or a volatile trend is soft.
    pub fn classify_conviction(&self, conviction: &ConvictionResult) -> Option<FrictionDecision> {
        if conviction.swing > self.config.swing_threshold {
            let from = conviction
                .previous_score
                .map(|p| format!(" (from {:.0} to {:.0})", p, conviction.score))
                .unwrap_or_default();
            return Some(FrictionDecision::new(
                FrictionLevel::Medium,
                FrictionDimension::ConvictionIntegrity,
                format!(
                    "Your conviction swung {:.0} points{}. Swings this large usually come from emotion rather than new evidence.",
                    conviction.swing, from
                ),
                "Write down what changed your mind before acting.",
            ));
        }

        if conviction.score >= self.config.overconfidence_threshold {
            let cue = conviction
                .certainty_indicators
                .first()
                .map(|c| format!(" (\"{}\")", c))
                .unwrap_or_default();
            return Some(FrictionDecision::new(
                FrictionLevel::Soft,
                FrictionDimension::ConvictionIntegrity,
                format!(
                    "Your language signals near-total certainty{}: {:.0}/100. Markets rarely offer guarantees.",
                    cue, conviction.score
                ),
                "List what would prove this thesis wrong.",
            ));
        }

        if conviction.trend == ConvictionTrend::Volatile {
            return Some(FrictionDecision::new(
                FrictionLevel::Soft,
                FrictionDimension::ConvictionIntegrity,
                "Your conviction on this thesis keeps swinging back and forth.",
                "Review your thesis history to see what keeps changing.",
            ));
        }

        None
    }

    /// Select the most severe candidate. Ties keep the earliest candidate.
    pub fn combine(&self, candidates: Vec<FrictionDecision>) -> FrictionDecision {
        let triggered: Vec<FrictionDecision> = candidates
            .into_iter()
            .filter(|d| d.level.is_friction())
            .collect();

        let dimensions: Vec<FrictionDimension> = triggered.iter().map(|d| d.dimension).collect();

        let mut selected: Option<FrictionDecision> = None;
        for decision in triggered {
            match &selected {
                Some(current) if current.level >= decision.level => {}
                _ => selected = Some(decision),
            }
        }

        let Some(mut decision) = selected else {
            return FrictionDecision::clear();
        };

        if dimensions.len() >= 2 {
            let labels: Vec<&str> = dimensions.iter().map(|d| d.label()).collect();
            decision.message = format!(
                "{} Multiple factors flagged: {}.",
                decision.message,
                labels.join(", ")
            );
            decision.dimension = FrictionDimension::Combined;
        }
        decision.contributing_dimensions = dimensions;

        decision
    }

    /// Escalate one step when recent overrides reach the configured count.
    ///
    /// Never lowers severity and never turns a clear decision into friction.
    pub fn escalate(&self, mut decision: FrictionDecision, recent_override_count: u32) -> FrictionDecision {
        if !decision.level.is_friction()
            || recent_override_count < self.config.escalation_override_count
        {
            return decision;
        }

        let original = decision.level;
        let escalated = original.escalate();

        decision.message = format!(
            "{} This check was escalated because you have overridden friction {} times in the last {} days.",
            decision.message, recent_override_count, OVERRIDE_WINDOW_DAYS
        );

        if escalated != original {
            decision.level = escalated;
            decision.escalated_from = Some(original);
            if escalated == FrictionLevel::Hard {
                decision.override_warning = Some(format!(
                    "You have overridden process checks {} times in the last {} days. Repeated overrides are a pattern worth examining before this trade.",
                    recent_override_count, OVERRIDE_WINDOW_DAYS
                ));
            }
        }

        info!(
            from = %original,
            to = %decision.level,
            recent_override_count,
            "Friction escalated by override history"
        );

        decision
    }

    /// Classify every dimension, combine, then escalate once.
    pub fn decide(
        &self,
        research: &ResearchQualityResult,
        time: &TimeMetrics,
        conviction: &ConvictionResult,
        recent_override_count: u32,
    ) -> FrictionDecision {
        let candidates: Vec<FrictionDecision> = [
            self.classify_research(research),
            self.classify_time(time),
            self.classify_conviction(conviction),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(
            triggered = candidates.len(),
            research_score = research.score,
            hours = time.hours_in_development,
            conviction_score = conviction.score,
            "Dimensions classified"
        );

        let combined = self.combine(candidates);
        self.escalate(combined, recent_override_count)
    }
}

fn level_below(value: f64, thresholds: &LevelThresholds) -> FrictionLevel {
    match value {
        v if v < thresholds.hard => FrictionLevel::Hard,
        v if v < thresholds.medium => FrictionLevel::Medium,
        v if v < thresholds.soft => FrictionLevel::Soft,
        _ => FrictionLevel::None,
    }
}
