//! Core types for the process-integrity engine.
//!
//! This module defines the closed enumerations and records shared by the
//! scorers and the friction orchestrator:
//! - [`FrictionLevel`] / [`FrictionDimension`]: the verdict vocabulary
//! - [`MaturityLevel`] / [`ConvictionTrend`]: per-dimension classifications
//! - [`ThesisEvolutionEvent`] / [`ConvictionAnalysisRecord`]: append-only history rows
//!   supplied by the caller's persistence layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Friction Level
// ============================================================================

/// Graded intervention inserted before a trading action.
///
/// Levels form a total order `None < Soft < Medium < Hard`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum FrictionLevel {
    /// No friction - clear to proceed
    #[default]
    None = 0,
    /// Gentle nudge, proceed freely after acknowledging
    Soft = 1,
    /// Explicit confirmation expected
    Medium = 2,
    /// Written justification required to override
    Hard = 3,
}

impl FrictionLevel {
    /// Move one severity step up. `Hard` stays `Hard`, `None` stays `None`.
    pub fn escalate(self) -> Self {
        match self {
            FrictionLevel::None => FrictionLevel::None,
            FrictionLevel::Soft => FrictionLevel::Medium,
            FrictionLevel::Medium => FrictionLevel::Hard,
            FrictionLevel::Hard => FrictionLevel::Hard,
        }
    }

    /// Whether this level represents any friction at all.
    pub fn is_friction(&self) -> bool {
        !matches!(self, FrictionLevel::None)
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrictionLevel::None => "none",
            FrictionLevel::Soft => "soft",
            FrictionLevel::Medium => "medium",
            FrictionLevel::Hard => "hard",
        }
    }
}

impl std::fmt::Display for FrictionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FrictionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(FrictionLevel::None),
            "soft" => Ok(FrictionLevel::Soft),
            "medium" => Ok(FrictionLevel::Medium),
            "hard" => Ok(FrictionLevel::Hard),
            _ => Err(format!("Unknown friction level: {}", s)),
        }
    }
}

// ============================================================================
// Friction Dimension
// ============================================================================

/// Which dimension produced a friction decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FrictionDimension {
    /// Research quality score
    ResearchQuality,
    /// Time the thesis has been in development
    TimeInThesis,
    /// Lexical conviction integrity
    ConvictionIntegrity,
    /// Emotional state gate (decided upstream, carried through for display)
    EmotionalFirewall,
    /// Two or more dimensions triggered together
    Combined,
}

impl FrictionDimension {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrictionDimension::ResearchQuality => "research_quality",
            FrictionDimension::TimeInThesis => "time_in_thesis",
            FrictionDimension::ConvictionIntegrity => "conviction_integrity",
            FrictionDimension::EmotionalFirewall => "emotional_firewall",
            FrictionDimension::Combined => "combined",
        }
    }

    /// Human-readable label used in combined messages.
    pub fn label(&self) -> &'static str {
        match self {
            FrictionDimension::ResearchQuality => "research quality",
            FrictionDimension::TimeInThesis => "time in thesis",
            FrictionDimension::ConvictionIntegrity => "conviction integrity",
            FrictionDimension::EmotionalFirewall => "emotional state",
            FrictionDimension::Combined => "multiple factors",
        }
    }
}

impl std::fmt::Display for FrictionDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FrictionDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "research_quality" => Ok(FrictionDimension::ResearchQuality),
            "time_in_thesis" => Ok(FrictionDimension::TimeInThesis),
            "conviction_integrity" => Ok(FrictionDimension::ConvictionIntegrity),
            "emotional_firewall" => Ok(FrictionDimension::EmotionalFirewall),
            "combined" => Ok(FrictionDimension::Combined),
            _ => Err(format!("Unknown friction dimension: {}", s)),
        }
    }
}

// ============================================================================
// Trade Action
// ============================================================================

/// The trading action being gated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    /// Open or add to a long position
    Buy,
    /// Close or reduce a position
    Sell,
}

impl TradeAction {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Maturity and Trend
// ============================================================================

/// How long a thesis has been under development.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MaturityLevel {
    /// Under 4 hours old
    Nascent,
    /// Between 4 and 24 hours old
    Developing,
    /// At least 24 hours old
    Mature,
}

impl MaturityLevel {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaturityLevel::Nascent => "nascent",
            MaturityLevel::Developing => "developing",
            MaturityLevel::Mature => "mature",
        }
    }

    /// One-line description for messaging.
    pub fn description(&self) -> &'static str {
        match self {
            MaturityLevel::Nascent => "This thesis is brand new and has not had time to settle.",
            MaturityLevel::Developing => "This thesis is still developing.",
            MaturityLevel::Mature => "This thesis has had time to mature.",
        }
    }
}

impl std::fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of conviction over the recorded history.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConvictionTrend {
    /// No meaningful drift
    #[default]
    Stable,
    /// Conviction rising on average
    Increasing,
    /// Conviction falling on average
    Decreasing,
    /// Large swings in both directions
    Volatile,
}

impl ConvictionTrend {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvictionTrend::Stable => "stable",
            ConvictionTrend::Increasing => "increasing",
            ConvictionTrend::Decreasing => "decreasing",
            ConvictionTrend::Volatile => "volatile",
        }
    }
}

impl std::fmt::Display for ConvictionTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// History Records
// ============================================================================

/// Kind of refinement captured by a thesis evolution event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionEventType {
    /// Hypothesis text was rewritten
    HypothesisRefined,
    /// Price or time target changed
    TargetAdjusted,
    /// Invalidation criteria added or changed
    InvalidationUpdated,
    /// Supporting evidence attached
    EvidenceAdded,
    /// Explicit confidence change
    ConfidenceChanged,
    /// Lifecycle status change (drafting, active, validated, invalidated)
    StatusChanged,
}

/// Append-only record of one thesis refinement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThesisEvolutionEvent {
    /// What changed
    pub event_type: EvolutionEventType,
    /// Value before the change
    #[serde(default)]
    pub previous_value: Option<String>,
    /// Value after the change
    #[serde(default)]
    pub new_value: Option<String>,
    /// When the change was recorded
    pub created_at: DateTime<Utc>,
    /// Signed confidence delta, when the event carries one
    #[serde(default)]
    pub confidence_delta: Option<f64>,
}

/// Where an analyzed statement came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatementSource {
    /// Chat message
    #[default]
    Chat,
    /// Thesis hypothesis text
    ThesisHypothesis,
    /// Journal entry
    Journal,
}

/// Persisted snapshot of one conviction analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvictionAnalysisRecord {
    /// Analyzed text
    #[serde(default)]
    pub statement_text: String,
    /// Origin of the text
    #[serde(default)]
    pub source_type: StatementSource,
    /// Score at analysis time (0-100)
    pub conviction_score: f64,
    /// Certainty phrases matched
    #[serde(default)]
    pub certainty_indicators: Vec<String>,
    /// Hedging phrases matched
    #[serde(default)]
    pub hedging_indicators: Vec<String>,
    /// When the analysis ran
    pub analyzed_at: DateTime<Utc>,
}

/// Clamp a score into `[0, 100]`. NaN collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
