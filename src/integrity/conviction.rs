//! Conviction integrity analysis.
//!
//! Two responsibilities:
//! - **Statement scoring**: lexical certainty and hedging cues are matched
//!   against declarative `(pattern, weight)` tables. The score starts at a
//!   neutral 50, certainty adds, hedging subtracts, and the result is clamped
//!   to 0-100.
//! - **Trend detection**: consecutive deltas over the conviction history
//!   classify the trend as stable, increasing, decreasing or volatile.
//!
//! # Rule evaluation
//!
//! Hedging rules run before certainty rules, each in table order. A match
//! claims its byte span; a later rule whose match overlaps a claimed span is
//! ignored. This keeps "will definitely" from also scoring "definitely" and
//! "not certain" from scoring "certain". Each rule counts at most once per
//! statement.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{clamp_score, ConvictionAnalysisRecord, ConvictionTrend, StatementSource};

/// Neutral starting score.
pub const NEUTRAL_SCORE: f64 = 50.0;
/// A single delta beyond this magnitude counts as a spike.
pub const SPIKE_DELTA: f64 = 15.0;
/// Mean delta beyond this magnitude counts as a directional trend.
pub const TREND_DELTA: f64 = 5.0;

/// Certainty cues and their weights.
pub const CERTAINTY_PATTERNS: &[(&str, f64)] = &[
    (r"\bwill definitely\b", 20.0),
    (r"\bguarantee[ds]?\b", 20.0),
    (r"\b100\s*(?:%|percent)", 20.0),
    (r"\b(?:can't|cannot|can not) (?:lose|fail|go wrong)\b", 20.0),
    (r"\b(?:no doubt|without (?:a )?doubt)\b", 15.0),
    (r"\bdefinitely\b", 15.0),
    (r"\bcertain(?:ly)?\b", 15.0),
    (r"\babsolutely\b", 15.0),
    (r"\b(?:sure thing|easy money|free money)\b", 15.0),
    (r"\bno way (?:it|this|that)\b", 12.0),
    (r"\bobvious(?:ly)?\b", 12.0),
    (r"\bwill (?:go|hit|reach|rise|fall|drop|moon|double|explode)\b", 10.0),
    (r"\bclearly\b", 8.0),
    (r"\bi know\b", 8.0),
];

/// Hedging cues and their weights.
pub const HEDGING_PATTERNS: &[(&str, f64)] = &[
    (r"\bnot (?:sure|certain|convinced)\b", 10.0),
    (r"\b(?:don't|do not) know\b", 10.0),
    (r"\bi (?:could|might) be wrong\b", 10.0),
    (r"\b(?:uncertain|unsure)\b", 10.0),
    (r"\bno idea\b", 10.0),
    (r"\bmight\b", 8.0),
    (r"\bmaybe\b", 8.0),
    (r"\bperhaps\b", 8.0),
    (r"\bpossibly\b", 8.0),
    (r"\bprobably\b", 5.0),
    (r"\bcould\b", 5.0),
    (r"\bseems?\b", 5.0),
    (r"\bhopefully\b", 5.0),
    (r"\bi think\b", 3.0),
    (r"\bi believe\b", 3.0),
    (r"\bi feel\b", 3.0),
    (r"\b(?:kind|sort) of\b", 3.0),
];

struct Rule {
    regex: Regex,
    weight: f64,
}

fn compile(table: &[(&str, f64)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, weight)| Rule {
            regex: Regex::new(pattern).expect("valid conviction pattern"),
            weight: *weight,
        })
        .collect()
}

static CERTAINTY_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(CERTAINTY_PATTERNS));
static HEDGING_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(HEDGING_PATTERNS));

/// Score for one statement (or the aggregate over several).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementScore {
    /// Conviction score (0-100)
    pub score: f64,
    /// Matched certainty phrases
    pub certainty_indicators: Vec<String>,
    /// Matched hedging phrases
    pub hedging_indicators: Vec<String>,
}

impl Default for StatementScore {
    fn default() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            certainty_indicators: Vec::new(),
            hedging_indicators: Vec::new(),
        }
    }
}

/// Result of conviction integrity analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvictionResult {
    /// Current conviction score (0-100)
    pub score: f64,
    /// Matched certainty phrases, deduplicated
    pub certainty_indicators: Vec<String>,
    /// Matched hedging phrases, deduplicated
    pub hedging_indicators: Vec<String>,
    /// Trend over history plus the current score
    pub trend: ConvictionTrend,
    /// Score immediately preceding the current one
    pub previous_score: Option<f64>,
    /// `|score - previous_score|`, or 0 without a previous score
    pub swing: f64,
}

impl Default for ConvictionResult {
    fn default() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            certainty_indicators: Vec::new(),
            hedging_indicators: Vec::new(),
            trend: ConvictionTrend::Stable,
            previous_score: None,
            swing: 0.0,
        }
    }
}

/// Deterministic lexical conviction analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvictionAnalyzer;

impl ConvictionAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Score a single statement. Empty or malformed text scores neutral.
    pub fn score_statement(&self, text: &str) -> StatementScore {
        let normalized = text.replace(['\u{2019}', '\u{2018}'], "'").to_lowercase();
        let mut claimed: Vec<Range<usize>> = Vec::new();

        let (hedging, hedging_indicators) = apply_rules(&HEDGING_RULES, &normalized, &mut claimed);
        let (certainty, certainty_indicators) =
            apply_rules(&CERTAINTY_RULES, &normalized, &mut claimed);

        StatementScore {
            score: clamp_score(NEUTRAL_SCORE + certainty - hedging),
            certainty_indicators,
            hedging_indicators,
        }
    }

    /// Score several statements: mean score, deduplicated indicators.
    pub fn score_statements<S: AsRef<str>>(&self, statements: &[S]) -> StatementScore {
        if statements.is_empty() {
            return StatementScore::default();
        }

        let mut total = 0.0;
        let mut certainty_indicators = Vec::new();
        let mut hedging_indicators = Vec::new();

        for statement in statements {
            let scored = self.score_statement(statement.as_ref());
            total += scored.score;
            extend_unique(&mut certainty_indicators, scored.certainty_indicators);
            extend_unique(&mut hedging_indicators, scored.hedging_indicators);
        }

        StatementScore {
            score: clamp_score(total / statements.len() as f64),
            certainty_indicators,
            hedging_indicators,
        }
    }

    /// Score statements and place the result on the thesis' conviction history.
    ///
    /// The current score is appended to the history series before trend and
    /// swing detection. Without statements, the newest history row stands in
    /// for the current score.
    pub fn analyze_with_history<S: AsRef<str>>(
        &self,
        statements: &[S],
        history: &[ConvictionAnalysisRecord],
    ) -> ConvictionResult {
        let mut ordered: Vec<&ConvictionAnalysisRecord> = history.iter().collect();
        ordered.sort_by_key(|r| r.analyzed_at);
        let mut series: Vec<f64> = ordered
            .iter()
            .map(|r| clamp_score(r.conviction_score))
            .collect();

        let current = if statements.is_empty() {
            match ordered.last() {
                Some(latest) => StatementScore {
                    score: clamp_score(latest.conviction_score),
                    certainty_indicators: latest.certainty_indicators.clone(),
                    hedging_indicators: latest.hedging_indicators.clone(),
                },
                None => StatementScore::default(),
            }
        } else {
            let scored = self.score_statements(statements);
            series.push(scored.score);
            scored
        };

        let previous_score = if series.len() >= 2 {
            Some(series[series.len() - 2])
        } else {
            None
        };

        let result = ConvictionResult {
            score: current.score,
            certainty_indicators: current.certainty_indicators,
            hedging_indicators: current.hedging_indicators,
            trend: detect_trend(&series),
            previous_score,
            swing: swing(&series),
        };

        debug!(
            score = result.score,
            trend = %result.trend,
            swing = result.swing,
            history_len = history.len(),
            "Conviction analyzed"
        );

        result
    }

    /// Build the record a caller would persist for one analyzed statement.
    pub fn to_record(
        &self,
        statement: &str,
        source_type: StatementSource,
        analyzed_at: DateTime<Utc>,
    ) -> ConvictionAnalysisRecord {
        let scored = self.score_statement(statement);
        ConvictionAnalysisRecord {
            statement_text: statement.to_string(),
            source_type,
            conviction_score: scored.score,
            certainty_indicators: scored.certainty_indicators,
            hedging_indicators: scored.hedging_indicators,
            analyzed_at,
        }
    }
}

fn apply_rules(rules: &[Rule], text: &str, claimed: &mut Vec<Range<usize>>) -> (f64, Vec<String>) {
    let mut total = 0.0;
    let mut indicators = Vec::new();

    for rule in rules {
        let hit = rule
            .regex
            .find_iter(text)
            .find(|m| !claimed.iter().any(|c| m.start() < c.end && c.start < m.end()));

        if let Some(m) = hit {
            claimed.push(m.range());
            total += rule.weight;
            indicators.push(m.as_str().trim().to_string());
        }
    }

    (total, indicators)
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Classify the trend of an ascending score series.
///
/// Fewer than two points is stable. A delta above +15 together with one
/// below -15 is volatile; otherwise the mean delta decides.
pub fn detect_trend(series: &[f64]) -> ConvictionTrend {
    if series.len() < 2 {
        return ConvictionTrend::Stable;
    }

    let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let spiked_up = deltas.iter().any(|d| *d > SPIKE_DELTA);
    let spiked_down = deltas.iter().any(|d| *d < -SPIKE_DELTA);

    if spiked_up && spiked_down {
        return ConvictionTrend::Volatile;
    }

    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    match mean {
        m if m > TREND_DELTA => ConvictionTrend::Increasing,
        m if m < -TREND_DELTA => ConvictionTrend::Decreasing,
        _ => ConvictionTrend::Stable,
    }
}

/// Absolute difference between the last two points, or 0.
pub fn swing(series: &[f64]) -> f64 {
    match series {
        [.., previous, latest] => clamp_score((latest - previous).abs()),
        _ => 0.0,
    }
}
