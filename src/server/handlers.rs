use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::error::{McpError, McpResult};
use crate::integrity::{
    suggested_wait, ConvictionAnalysisRecord, IntegrityCheckInput, OverrideRequest,
    OverrideValidation, ProcessIntegrityCheckRequest, ProcessIntegrityCheckResponse,
    ProcessOverride, ResearchSession, ThesisEvolutionEvent, TimeMetrics,
};

/// Route tool calls to appropriate handlers
pub fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "integrity_check" => handle_check(state, arguments),
        "integrity_validate_override" => handle_validate_override(state, arguments),
        "integrity_record_override" => handle_record_override(state, arguments),
        "integrity_analyze_conviction" => handle_analyze_conviction(state, arguments),
        "integrity_research_quality" => handle_research_quality(state, arguments),
        "integrity_time_in_thesis" => handle_time_in_thesis(state, arguments),
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for `integrity_check`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckParams {
    /// Check input assembled by the caller
    #[serde(flatten)]
    pub input: IntegrityCheckInput,
    /// Evaluation time (defaults to now)
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Parameters for `integrity_record_override`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordOverrideParams {
    /// Original check request
    pub request: ProcessIntegrityCheckRequest,
    /// Response the user chose to override
    pub response: ProcessIntegrityCheckResponse,
    /// Justification typed by the user
    #[serde(default)]
    pub user_reasoning: Option<String>,
    /// Override time (defaults to now)
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of `integrity_record_override`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordOverrideResult {
    /// Validation outcome
    pub validation: OverrideValidation,
    /// Audit record to persist, present only when validation passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ProcessOverride>,
}

/// Parameters for `integrity_analyze_conviction`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeConvictionParams {
    /// Statements to score
    #[serde(default)]
    pub statements: Vec<String>,
    /// Prior analyses for the same thesis
    #[serde(default)]
    pub history: Vec<ConvictionAnalysisRecord>,
}

/// Parameters for `integrity_research_quality`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchQualityParams {
    /// Session aggregate
    #[serde(flatten)]
    pub session: ResearchSession,
    /// Evaluation time (defaults to now)
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Parameters for `integrity_time_in_thesis`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeInThesisParams {
    /// When the idea was first mentioned
    #[serde(default)]
    pub first_mentioned_at: Option<DateTime<Utc>>,
    /// When the thesis row was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Evolution events for the thesis
    #[serde(default)]
    pub evolution_events: Vec<ThesisEvolutionEvent>,
    /// Event count, when the caller has only the count
    #[serde(default)]
    pub evolution_event_count: Option<usize>,
    /// Evaluation time (defaults to now)
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Result of `integrity_time_in_thesis`.
#[derive(Debug, Clone, Serialize)]
pub struct TimeInThesisResult {
    /// Timing metrics
    #[serde(flatten)]
    pub metrics: TimeMetrics,
    /// Suggested wait, if the thesis is still young
    pub suggested_wait: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Handle integrity_check - full process-integrity evaluation
fn handle_check(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("integrity_check", arguments, |params: CheckParams| {
        let now = params.evaluated_at.unwrap_or_else(Utc::now);
        state.engine.evaluate(&params.input, now)
    })
}

/// Handle integrity_validate_override
fn handle_validate_override(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "integrity_validate_override",
        arguments,
        |params: OverrideRequest| state.engine.validate_override(&params),
    )
}

/// Handle integrity_record_override - validate, then build the audit record
fn handle_record_override(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "integrity_record_override",
        arguments,
        |params: RecordOverrideParams| {
            let validation = state.engine.validate_override(&OverrideRequest {
                friction_level: params.response.friction.level,
                user_reasoning: params.user_reasoning.clone(),
            });

            let record = validation.valid.then(|| {
                state.engine.record_override(
                    &params.request,
                    &params.response,
                    params.user_reasoning,
                    params.created_at.unwrap_or_else(Utc::now),
                )
            });

            RecordOverrideResult { validation, record }
        },
    )
}

/// Handle integrity_analyze_conviction
fn handle_analyze_conviction(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "integrity_analyze_conviction",
        arguments,
        |params: AnalyzeConvictionParams| {
            state
                .engine
                .conviction()
                .analyze_with_history(params.statements.as_slice(), &params.history)
        },
    )
}

/// Handle integrity_research_quality
fn handle_research_quality(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "integrity_research_quality",
        arguments,
        |params: ResearchQualityParams| {
            let now = params.evaluated_at.unwrap_or_else(Utc::now);
            state.engine.research().score(&params.session, now)
        },
    )
}

/// Handle integrity_time_in_thesis
fn handle_time_in_thesis(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "integrity_time_in_thesis",
        arguments,
        |params: TimeInThesisParams| {
            let now = params.evaluated_at.unwrap_or_else(Utc::now);
            let count = params
                .evolution_event_count
                .unwrap_or(params.evolution_events.len());
            let metrics = state.engine.time().calculate_with_count(
                params.first_mentioned_at,
                params.created_at,
                count,
                now,
            );
            let suggested_wait = suggested_wait(
                metrics.hours_in_development,
                &state.engine.config().time_hours,
            );
            TimeInThesisResult {
                metrics,
                suggested_wait,
            }
        },
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Generic handler that runs an engine operation with consistent error handling.
///
/// Engine operations are total, so only argument parsing and result
/// serialization can fail here.
fn execute_handler<P, R, F>(tool_name: &str, arguments: Option<Value>, operation: F) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    F: FnOnce(P) -> R,
{
    let params: P = parse_arguments(tool_name, arguments)?;
    let result = operation(params);
    serde_json::to_value(result).map_err(McpError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::AppState;
    use serde_json::json;
    use std::sync::Arc;

    fn state() -> SharedState {
        Arc::new(AppState::new(Config::default()))
    }

    #[test]
    fn test_unknown_tool() {
        let err = handle_tool_call(&state(), "integrity_nope", None).unwrap_err();
        assert!(matches!(err, McpError::UnknownTool { .. }));
    }

    #[test]
    fn test_missing_arguments() {
        let err = handle_tool_call(&state(), "integrity_check", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameters for integrity_check: Missing arguments"
        );
    }

    #[test]
    fn test_check_missing_user_id_is_invalid_parameters() {
        let args = json!({ "request": { "symbol": "AAPL", "action": "BUY" } });
        let err = handle_tool_call(&state(), "integrity_check", Some(args)).unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters { .. }));
    }

    #[test]
    fn test_check_minimal_request() {
        let args = json!({
            "request": { "symbol": "AAPL", "action": "BUY", "user_id": "u1" },
            "evaluated_at": "2025-03-01T12:00:00Z"
        });
        let result = handle_tool_call(&state(), "integrity_check", Some(args)).unwrap();
        assert_eq!(result["friction"]["level"], "hard");
        assert_eq!(result["can_proceed"], false);
        assert_eq!(result["override_required"], true);
        assert_eq!(result["time_in_thesis"]["maturity_level"], "nascent");
    }

    #[test]
    fn test_validate_override_tool() {
        let args = json!({ "friction_level": "hard", "user_reasoning": "short" });
        let result = handle_tool_call(&state(), "integrity_validate_override", Some(args)).unwrap();
        assert_eq!(result["valid"], false);

        let args = json!({ "friction_level": "medium" });
        let result = handle_tool_call(&state(), "integrity_validate_override", Some(args)).unwrap();
        assert_eq!(result["valid"], true);
    }

    #[test]
    fn test_analyze_conviction_tool() {
        let args = json!({ "statements": ["This will definitely go up, guaranteed"] });
        let result = handle_tool_call(&state(), "integrity_analyze_conviction", Some(args)).unwrap();
        assert_eq!(result["score"], 90.0);
        assert_eq!(result["trend"], "stable");
        assert_eq!(result["swing"], 0.0);
    }

    #[test]
    fn test_research_quality_tool() {
        let args = json!({
            "unique_tools_used": 2,
            "devils_advocate_engaged": true,
            "assumptions_documented": 2
        });
        let result = handle_tool_call(&state(), "integrity_research_quality", Some(args)).unwrap();
        assert_eq!(result["score"], 51.0);
        assert_eq!(result["breakdown"]["devils_advocate"], 25.0);
    }

    #[test]
    fn test_time_in_thesis_tool() {
        let args = json!({
            "first_mentioned_at": "2025-03-01T11:30:00Z",
            "evolution_event_count": 1,
            "evaluated_at": "2025-03-01T12:00:00Z"
        });
        let result = handle_tool_call(&state(), "integrity_time_in_thesis", Some(args)).unwrap();
        assert_eq!(result["hours_in_development"], 0.5);
        assert_eq!(result["is_rushed"], true);
        assert_eq!(result["maturity_level"], "nascent");
        assert_eq!(result["suggested_wait"], "wait 4 hours");
    }

    #[test]
    fn test_time_in_thesis_uses_configured_thresholds() {
        let mut config = Config::default();
        config.friction.time_hours = crate::integrity::LevelThresholds::new(2.0, 12.0, 24.0);
        let state = Arc::new(AppState::new(config));

        let args = json!({
            "first_mentioned_at": "2025-03-01T02:00:00Z",
            "evaluated_at": "2025-03-01T12:00:00Z"
        });
        let result = handle_tool_call(&state, "integrity_time_in_thesis", Some(args)).unwrap();
        assert_eq!(result["hours_in_development"], 10.0);
        assert_eq!(result["suggested_wait"], "wait 2 more hours");
    }

    #[test]
    fn test_record_override_tool_rejects_then_accepts() {
        let state = state();
        let check = handle_tool_call(
            &state,
            "integrity_check",
            Some(json!({
                "request": { "symbol": "TSLA", "action": "SELL", "user_id": "u9" },
                "evaluated_at": "2025-03-01T12:00:00Z"
            })),
        )
        .unwrap();

        let rejected = handle_tool_call(
            &state,
            "integrity_record_override",
            Some(json!({
                "request": { "symbol": "TSLA", "action": "SELL", "user_id": "u9" },
                "response": check.clone(),
                "user_reasoning": "yolo"
            })),
        )
        .unwrap();
        assert_eq!(rejected["validation"]["valid"], false);
        assert!(rejected.get("record").is_none());

        let accepted = handle_tool_call(
            &state,
            "integrity_record_override",
            Some(json!({
                "request": { "symbol": "TSLA", "action": "SELL", "user_id": "u9" },
                "response": check,
                "user_reasoning": "Stop loss hit, exiting per plan",
                "created_at": "2025-03-01T12:05:00Z"
            })),
        )
        .unwrap();
        assert_eq!(accepted["validation"]["valid"], true);
        assert_eq!(accepted["record"]["friction_level"], "hard");
        assert_eq!(accepted["record"]["action_attempted"], "SELL");
    }
}
