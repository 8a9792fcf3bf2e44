//! Research quality scoring.
//!
//! Four independent sub-scores are computed against fixed category maxima
//! and summed into a 0-100 score:
//!
//! | Category | Max | Rule |
//! |---|---|---|
//! | Tool usage | 40 | 8 per distinct research tool |
//! | Devil's advocate | 25 | all-or-nothing |
//! | Assumptions | 20 | 5 per documented assumption |
//! | Time spent | 15 | stepped by session minutes |

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::clamp_score;

/// Maximum points for tool usage.
pub const TOOL_USAGE_MAX: f64 = 40.0;
/// Maximum points for devil's-advocate engagement.
pub const DEVILS_ADVOCATE_MAX: f64 = 25.0;
/// Maximum points for documented assumptions.
pub const ASSUMPTIONS_MAX: f64 = 20.0;
/// Maximum points for time spent.
pub const TIME_SPENT_MAX: f64 = 15.0;

const POINTS_PER_TOOL: f64 = 8.0;
const POINTS_PER_ASSUMPTION: f64 = 5.0;

/// One row per distinct research action taken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolUsageRecord {
    /// Tool identifier (e.g. "fundamentals", "chart", "news")
    pub tool: String,
    /// Number of times the tool was used
    #[serde(default)]
    pub count: u32,
    /// Symbols looked up with the tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
}

impl ToolUsageRecord {
    /// Create a new record.
    pub fn new(tool: impl Into<String>, count: u32) -> Self {
        Self {
            tool: tool.into(),
            count,
            symbols: None,
        }
    }
}

/// Aggregate of research activity for the active thesis or conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResearchSession {
    /// Per-tool usage rows
    #[serde(default)]
    pub tool_usage: Vec<ToolUsageRecord>,
    /// Total tool invocations
    #[serde(default)]
    pub tools_used_count: u32,
    /// Distinct tools used
    #[serde(default)]
    pub unique_tools_used: u32,
    /// Whether the devil's-advocate review was engaged
    #[serde(default)]
    pub devils_advocate_engaged: bool,
    /// Number of assumptions written down
    #[serde(default)]
    pub assumptions_documented: u32,
    /// Session start
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Session end (None while the session is still open)
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ResearchSession {
    /// Build a session from raw tool usage rows, deriving the counters.
    pub fn from_tool_usage(
        tool_usage: Vec<ToolUsageRecord>,
        devils_advocate_engaged: bool,
        assumptions_documented: u32,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        let tools_used_count = tool_usage
            .iter()
            .fold(0u32, |acc, r| acc.saturating_add(r.count));
        let unique_tools_used = distinct_tools(&tool_usage) as u32;

        Self {
            tool_usage,
            tools_used_count,
            unique_tools_used,
            devils_advocate_engaged,
            assumptions_documented,
            started_at,
            ended_at,
        }
    }

    /// Minutes between start and end (or `now` for an open session).
    pub fn minutes_spent(&self, now: DateTime<Utc>) -> f64 {
        match self.started_at {
            Some(start) => {
                let end = self.ended_at.unwrap_or(now);
                ((end - start).num_seconds() as f64 / 60.0).max(0.0)
            }
            None => 0.0,
        }
    }
}

fn distinct_tools(tool_usage: &[ToolUsageRecord]) -> usize {
    tool_usage
        .iter()
        .filter(|r| r.count > 0)
        .map(|r| r.tool.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

/// Per-category sub-scores.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ResearchBreakdown {
    /// Tool usage points (0-40)
    pub tool_usage: f64,
    /// Devil's advocate points (0-25)
    pub devils_advocate: f64,
    /// Assumption points (0-20)
    pub assumptions: f64,
    /// Time spent points (0-15)
    pub time_spent: f64,
}

impl ResearchBreakdown {
    /// Sum of the sub-scores, clamped to 0-100.
    pub fn total(&self) -> f64 {
        clamp_score(self.tool_usage + self.devils_advocate + self.assumptions + self.time_spent)
    }
}

/// Result of research quality scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchQualityResult {
    /// Overall score (0-100)
    pub score: f64,
    /// Per-category sub-scores
    pub breakdown: ResearchBreakdown,
    /// Suggestions for categories below their maximum
    pub recommendations: Vec<String>,
}

/// Scores a research session. Pure and total: an empty session scores 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResearchQualityScorer;

impl ResearchQualityScorer {
    /// Create a new scorer.
    pub fn new() -> Self {
        Self
    }

    /// Score a session as of `now`.
    pub fn score(&self, session: &ResearchSession, now: DateTime<Utc>) -> ResearchQualityResult {
        let unique_tools = (session.unique_tools_used as usize).max(distinct_tools(&session.tool_usage));
        let minutes = session.minutes_spent(now);

        let breakdown = ResearchBreakdown {
            tool_usage: tool_usage_points(unique_tools),
            devils_advocate: if session.devils_advocate_engaged {
                DEVILS_ADVOCATE_MAX
            } else {
                0.0
            },
            assumptions: (session.assumptions_documented as f64 * POINTS_PER_ASSUMPTION)
                .min(ASSUMPTIONS_MAX),
            time_spent: time_spent_points(minutes),
        };

        let mut recommendations = Vec::new();
        if breakdown.tool_usage < TOOL_USAGE_MAX {
            recommendations.push(format!(
                "Use more research tools: {} of {} distinct tools used.",
                unique_tools,
                (TOOL_USAGE_MAX / POINTS_PER_TOOL) as u32
            ));
        }
        if breakdown.devils_advocate < DEVILS_ADVOCATE_MAX {
            recommendations
                .push("Engage the devil's advocate to stress-test the thesis.".to_string());
        }
        if breakdown.assumptions < ASSUMPTIONS_MAX {
            recommendations.push(format!(
                "Document your key assumptions: {} of {} written down.",
                session.assumptions_documented,
                (ASSUMPTIONS_MAX / POINTS_PER_ASSUMPTION) as u32
            ));
        }
        if breakdown.time_spent < TIME_SPENT_MAX {
            recommendations.push(format!(
                "Spend at least 30 minutes on research (currently {:.0} minutes).",
                minutes
            ));
        }

        let score = breakdown.total();
        debug!(score, unique_tools, minutes, "Research quality scored");

        ResearchQualityResult {
            score,
            breakdown,
            recommendations,
        }
    }
}

fn tool_usage_points(unique_tools: usize) -> f64 {
    (unique_tools as f64 * POINTS_PER_TOOL).min(TOOL_USAGE_MAX)
}

fn time_spent_points(minutes: f64) -> f64 {
    match minutes {
        m if m >= 30.0 => TIME_SPENT_MAX,
        m if m >= 15.0 => 10.0,
        m if m >= 5.0 => 5.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_empty_session_scores_zero() {
        let result = ResearchQualityScorer::new().score(&ResearchSession::default(), now());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.breakdown, ResearchBreakdown::default());
        assert_eq!(result.recommendations.len(), 4);
    }

    #[test]
    fn test_full_session_scores_hundred() {
        let session = ResearchSession::from_tool_usage(
            vec![
                ToolUsageRecord::new("fundamentals", 2),
                ToolUsageRecord::new("chart", 5),
                ToolUsageRecord::new("news", 1),
                ToolUsageRecord::new("filings", 1),
                ToolUsageRecord::new("peers", 3),
                ToolUsageRecord::new("options_flow", 1),
            ],
            true,
            6,
            Some(now() - Duration::minutes(45)),
            Some(now()),
        );

        let result = ResearchQualityScorer::new().score(&session, now());
        assert_eq!(result.breakdown.tool_usage, TOOL_USAGE_MAX);
        assert_eq!(result.breakdown.assumptions, ASSUMPTIONS_MAX);
        assert_eq!(result.score, 100.0);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_partial_session() {
        let session = ResearchSession::from_tool_usage(
            vec![
                ToolUsageRecord::new("chart", 3),
                ToolUsageRecord::new("news", 1),
            ],
            false,
            1,
            Some(now() - Duration::minutes(10)),
            None,
        );

        let result = ResearchQualityScorer::new().score(&session, now());
        assert_eq!(result.breakdown.tool_usage, 16.0);
        assert_eq!(result.breakdown.devils_advocate, 0.0);
        assert_eq!(result.breakdown.assumptions, 5.0);
        assert_eq!(result.breakdown.time_spent, 5.0);
        assert_eq!(result.score, 26.0);
    }

    #[test]
    fn test_from_tool_usage_derives_counters() {
        let session = ResearchSession::from_tool_usage(
            vec![
                ToolUsageRecord::new("chart", 3),
                ToolUsageRecord::new("Chart", 1),
                ToolUsageRecord::new("news", 0),
            ],
            false,
            0,
            None,
            None,
        );
        assert_eq!(session.tools_used_count, 4);
        assert_eq!(session.unique_tools_used, 1);
    }

    #[test]
    fn test_from_tool_usage_saturates_huge_counts() {
        let session = ResearchSession::from_tool_usage(
            vec![ToolUsageRecord::new("screener", u32::MAX), ToolUsageRecord::new("news", 1)],
            false,
            0,
            None,
            None,
        );
        assert_eq!(session.tools_used_count, u32::MAX);
        assert_eq!(session.unique_tools_used, 2);

        let result = ResearchQualityScorer::new().score(&session, now());
        assert_eq!(result.breakdown.tool_usage, 16.0);
    }

    #[test]
    fn test_time_spent_steps() {
        assert_eq!(time_spent_points(0.0), 0.0);
        assert_eq!(time_spent_points(4.9), 0.0);
        assert_eq!(time_spent_points(5.0), 5.0);
        assert_eq!(time_spent_points(15.0), 10.0);
        assert_eq!(time_spent_points(29.9), 10.0);
        assert_eq!(time_spent_points(30.0), 15.0);
    }

    #[test]
    fn test_end_before_start_counts_as_zero_minutes() {
        let session = ResearchSession {
            started_at: Some(now()),
            ended_at: Some(now() - Duration::minutes(20)),
            ..Default::default()
        };
        assert_eq!(session.minutes_spent(now()), 0.0);
    }

    #[test]
    fn test_sub_scores_never_exceed_maxima() {
        let session = ResearchSession {
            unique_tools_used: 50,
            devils_advocate_engaged: true,
            assumptions_documented: 100,
            started_at: Some(now() - Duration::days(3)),
            ..Default::default()
        };
        let result = ResearchQualityScorer::new().score(&session, now());
        assert!(result.breakdown.tool_usage <= TOOL_USAGE_MAX);
        assert!(result.breakdown.devils_advocate <= DEVILS_ADVOCATE_MAX);
        assert!(result.breakdown.assumptions <= ASSUMPTIONS_MAX);
        assert!(result.breakdown.time_spent <= TIME_SPENT_MAX);
        assert_eq!(result.score, result.breakdown.total());
    }
}
