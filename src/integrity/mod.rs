//! Process-integrity engine.
//!
//! Decides whether a user is ready to execute a trading action by combining
//! three independently scored dimensions into a single friction verdict:
//!
//! - [`research`]: research quality (0-100)
//! - [`thesis_time`]: hours in development and maturity
//! - [`conviction`]: lexical conviction score and its trend
//!
//! [`friction`] turns those into a [`FrictionDecision`] and escalates it based
//! on recent override history; [`overrides`] validates attempts to proceed
//! anyway.
//!
//! Every operation is a pure function of its inputs. Historical rows
//! (sessions, evolution events, prior conviction scores, override counts)
//! are fetched by the caller beforehand.

pub mod config;
pub mod conviction;
pub mod friction;
pub mod overrides;
pub mod research;
pub mod thesis_time;
pub mod types;

pub use config::{FrictionConfig, LevelThresholds};
pub use conviction::{detect_trend, swing, ConvictionAnalyzer, ConvictionResult, StatementScore};
pub use friction::{FrictionDecision, FrictionOrchestrator};
pub use overrides::{
    count_recent_overrides, OverrideId, OverrideRequest, OverrideValidation, OverrideValidator,
    ProcessOverride, ScoresSnapshot, OVERRIDE_WINDOW_DAYS,
};
pub use research::{
    ResearchBreakdown, ResearchQualityResult, ResearchQualityScorer, ResearchSession,
    ToolUsageRecord,
};
pub use thesis_time::{suggested_wait, TimeInThesisCalculator, TimeMetrics};
pub use types::{
    ConvictionAnalysisRecord, ConvictionTrend, EvolutionEventType, FrictionDimension,
    FrictionLevel, MaturityLevel, StatementSource, ThesisEvolutionEvent, TradeAction,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request / Response
// ============================================================================

/// Identifies the action being gated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessIntegrityCheckRequest {
    /// Ticker symbol
    pub symbol: String,
    /// BUY or SELL
    pub action: TradeAction,
    /// Thesis backing the action, if any
    #[serde(default)]
    pub thesis_id: Option<String>,
    /// User attempting the action
    pub user_id: String,
}

/// Thesis timestamps used for time-in-thesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThesisTimestamps {
    /// When the idea was first mentioned
    #[serde(default)]
    pub first_mentioned_at: Option<DateTime<Utc>>,
    /// When the thesis row was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Everything a check needs, already fetched by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrityCheckInput {
    /// The action being gated
    pub request: ProcessIntegrityCheckRequest,
    /// Research activity for the thesis or conversation
    #[serde(default)]
    pub research_session: ResearchSession,
    /// Thesis timestamps
    #[serde(default)]
    pub thesis: ThesisTimestamps,
    /// Ordered thesis evolution events
    #[serde(default)]
    pub evolution_events: Vec<ThesisEvolutionEvent>,
    /// Statements to score for conviction
    #[serde(default)]
    pub statements: Vec<String>,
    /// Ordered prior conviction analyses for the thesis
    #[serde(default)]
    pub conviction_history: Vec<ConvictionAnalysisRecord>,
    /// Overrides by this user in the trailing 7 days
    #[serde(default)]
    pub recent_override_count: u32,
}

/// Full evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessIntegrityCheckResponse {
    /// Research dimension
    pub research_quality: ResearchQualityResult,
    /// Time dimension
    pub time_in_thesis: TimeMetrics,
    /// Conviction dimension
    pub conviction_integrity: ConvictionResult,
    /// Combined verdict
    pub friction: FrictionDecision,
    /// `friction.level == none`
    pub can_proceed: bool,
    /// `!can_proceed`
    pub override_required: bool,
}

impl ProcessIntegrityCheckResponse {
    /// Snapshot of the dimension scores for an override audit record.
    pub fn scores_snapshot(&self) -> ScoresSnapshot {
        ScoresSnapshot {
            research_quality: self.research_quality.score,
            hours_in_development: self.time_in_thesis.hours_in_development,
            conviction_score: self.conviction_integrity.score,
            conviction_swing: self.conviction_integrity.swing,
            base_level: self.friction.escalated_from.unwrap_or(self.friction.level),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Composes the scorers, the orchestrator and the override validator.
#[derive(Debug, Clone, Default)]
pub struct ProcessIntegrityEngine {
    research: ResearchQualityScorer,
    time: TimeInThesisCalculator,
    conviction: ConvictionAnalyzer,
    orchestrator: FrictionOrchestrator,
    validator: OverrideValidator,
}

impl ProcessIntegrityEngine {
    /// Create an engine with the given thresholds.
    pub fn new(config: FrictionConfig) -> Self {
        let validator = OverrideValidator::new(config.min_override_reasoning_chars);
        Self {
            research: ResearchQualityScorer::new(),
            time: TimeInThesisCalculator::new(),
            conviction: ConvictionAnalyzer::new(),
            orchestrator: FrictionOrchestrator::new(config),
            validator,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &FrictionConfig {
        self.orchestrator.config()
    }

    /// Research quality scorer.
    pub fn research(&self) -> &ResearchQualityScorer {
        &self.research
    }

    /// Time-in-thesis calculator.
    pub fn time(&self) -> &TimeInThesisCalculator {
        &self.time
    }

    /// Conviction analyzer.
    pub fn conviction(&self) -> &ConvictionAnalyzer {
        &self.conviction
    }

    /// Friction orchestrator.
    pub fn orchestrator(&self) -> &FrictionOrchestrator {
        &self.orchestrator
    }

    /// Run a full check as of `now`.
    pub fn evaluate(&self, input: &IntegrityCheckInput, now: DateTime<Utc>) -> ProcessIntegrityCheckResponse {
        let research_quality = self.research.score(&input.research_session, now);
        let time_in_thesis = self.time.calculate(
            input.thesis.first_mentioned_at,
            input.thesis.created_at,
            &input.evolution_events,
            now,
        );
        let conviction_integrity = self
            .conviction
            .analyze_with_history(input.statements.as_slice(), &input.conviction_history);

        let friction = self.orchestrator.decide(
            &research_quality,
            &time_in_thesis,
            &conviction_integrity,
            input.recent_override_count,
        );

        let can_proceed = friction.can_proceed();

        info!(
            user_id = %input.request.user_id,
            symbol = %input.request.symbol,
            action = %input.request.action,
            thesis_id = ?input.request.thesis_id,
            level = %friction.level,
            dimension = %friction.dimension,
            can_proceed,
            "Process integrity check completed"
        );

        ProcessIntegrityCheckResponse {
            research_quality,
            time_in_thesis,
            conviction_integrity,
            friction,
            can_proceed,
            override_required: !can_proceed,
        }
    }

    /// Validate an attempt to proceed despite friction.
    pub fn validate_override(&self, request: &OverrideRequest) -> OverrideValidation {
        self.validator.validate_request(request)
    }

    /// Build the audit record for an accepted override of `response`.
    pub fn record_override(
        &self,
        request: &ProcessIntegrityCheckRequest,
        response: &ProcessIntegrityCheckResponse,
        user_reasoning: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ProcessOverride {
        ProcessOverride::from_decision(
            request.user_id.clone(),
            request.symbol.clone(),
            request.action,
            &response.friction,
            response.scores_snapshot(),
            user_reasoning,
            true,
            created_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn input() -> IntegrityCheckInput {
        IntegrityCheckInput {
            request: ProcessIntegrityCheckRequest {
                symbol: "NVDA".to_string(),
                action: TradeAction::Buy,
                thesis_id: Some("thesis-1".to_string()),
                user_id: "user-1".to_string(),
            },
            research_session: ResearchSession::default(),
            thesis: ThesisTimestamps::default(),
            evolution_events: vec![],
            statements: vec![],
            conviction_history: vec![],
            recent_override_count: 0,
        }
    }

    #[test]
    fn test_empty_input_is_hard_friction() {
        let response = ProcessIntegrityEngine::default().evaluate(&input(), now());
        assert_eq!(response.research_quality.score, 0.0);
        assert_eq!(response.time_in_thesis.hours_in_development, 0.0);
        assert_eq!(response.friction.level, FrictionLevel::Hard);
        assert_eq!(response.friction.dimension, FrictionDimension::Combined);
        assert!(!response.can_proceed);
        assert!(response.override_required);
    }

    #[test]
    fn test_healthy_input_can_proceed() {
        let mut input = input();
        input.research_session = ResearchSession {
            unique_tools_used: 5,
            devils_advocate_engaged: true,
            assumptions_documented: 4,
            started_at: Some(now() - Duration::hours(1)),
            ended_at: Some(now()),
            ..Default::default()
        };
        input.thesis.first_mentioned_at = Some(now() - Duration::hours(48));
        input.statements = vec!["The margin story looks solid, though I could be wrong on timing.".to_string()];

        let response = ProcessIntegrityEngine::default().evaluate(&input, now());
        assert_eq!(response.research_quality.score, 100.0);
        assert_eq!(response.friction.level, FrictionLevel::None);
        assert!(response.can_proceed);
        assert!(!response.override_required);
    }

    #[test]
    fn test_scores_snapshot_records_base_level() {
        let mut input = input();
        input.research_session.unique_tools_used = 5;
        input.research_session.devils_advocate_engaged = true;
        input.thesis.first_mentioned_at = Some(now() - Duration::hours(48));
        input.recent_override_count = 3;

        let engine = ProcessIntegrityEngine::default();
        let response = engine.evaluate(&input, now());
        // 65 research points, mature thesis, neutral conviction
        assert_eq!(response.friction.level, FrictionLevel::None);

        input.research_session.devils_advocate_engaged = false;
        input.research_session.unique_tools_used = 4;
        let response = engine.evaluate(&input, now());
        assert_eq!(response.friction.level, FrictionLevel::Hard);
        assert_eq!(response.scores_snapshot().base_level, FrictionLevel::Medium);

        let record = engine.record_override(
            &input.request,
            &response,
            Some("Sized at 1% of book".to_string()),
            now(),
        );
        assert_eq!(record.friction_level, FrictionLevel::Hard);
        assert_eq!(record.scores_snapshot.base_level, FrictionLevel::Medium);
        assert_eq!(record.user_id, "user-1");
    }
}
