//! Time-in-thesis calculation.
//!
//! Measures how long a thesis has been under development, classifies its
//! maturity, and flags rushed theses (under an hour old with fewer than
//! three recorded refinements).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::LevelThresholds;
use super::types::{MaturityLevel, ThesisEvolutionEvent};

/// Hours below which a thesis is nascent.
pub const DEVELOPING_AFTER_HOURS: f64 = 4.0;
/// Hours at which a thesis becomes mature.
pub const MATURE_AFTER_HOURS: f64 = 24.0;
/// A thesis younger than this may be rushed.
pub const RUSHED_UNDER_HOURS: f64 = 1.0;
/// Evolution events needed to escape the rushed flag.
pub const RUSHED_MIN_EVENTS: usize = 3;

/// Derived timing metrics for a thesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeMetrics {
    /// When the idea was first mentioned (preferred start)
    pub first_mentioned_at: Option<DateTime<Utc>>,
    /// When the thesis row was explicitly created
    pub explicit_created_at: Option<DateTime<Utc>>,
    /// Hours since the effective start, never negative
    pub hours_in_development: f64,
    /// Number of recorded refinements
    pub evolution_event_count: usize,
    /// Under an hour old with fewer than three refinements
    pub is_rushed: bool,
    /// Maturity classification
    pub maturity_level: MaturityLevel,
}

/// Calculates [`TimeMetrics`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeInThesisCalculator;

impl TimeInThesisCalculator {
    /// Create a new calculator.
    pub fn new() -> Self {
        Self
    }

    /// Compute metrics from thesis timestamps and its evolution history.
    pub fn calculate(
        &self,
        first_mentioned_at: Option<DateTime<Utc>>,
        explicit_created_at: Option<DateTime<Utc>>,
        events: &[ThesisEvolutionEvent],
        now: DateTime<Utc>,
    ) -> TimeMetrics {
        self.calculate_with_count(first_mentioned_at, explicit_created_at, events.len(), now)
    }

    /// Compute metrics when only the event count is known.
    ///
    /// Without any timestamp the thesis counts as brand new: zero hours.
    pub fn calculate_with_count(
        &self,
        first_mentioned_at: Option<DateTime<Utc>>,
        explicit_created_at: Option<DateTime<Utc>>,
        evolution_event_count: usize,
        now: DateTime<Utc>,
    ) -> TimeMetrics {
        let hours_in_development = first_mentioned_at
            .or(explicit_created_at)
            .map(|start| hours_between(start, now))
            .unwrap_or(0.0);

        let metrics = TimeMetrics {
            first_mentioned_at,
            explicit_created_at,
            hours_in_development,
            evolution_event_count,
            is_rushed: is_rushed(hours_in_development, evolution_event_count),
            maturity_level: maturity_for_hours(hours_in_development),
        };

        debug!(
            hours = metrics.hours_in_development,
            events = metrics.evolution_event_count,
            maturity = %metrics.maturity_level,
            rushed = metrics.is_rushed,
            "Time in thesis calculated"
        );

        metrics
    }
}

fn hours_between(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    // Clock skew can put the start in the future.
    ((now - start).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
}

/// Classify maturity by hours in development.
pub fn maturity_for_hours(hours: f64) -> MaturityLevel {
    match hours {
        h if h >= MATURE_AFTER_HOURS => MaturityLevel::Mature,
        h if h >= DEVELOPING_AFTER_HOURS => MaturityLevel::Developing,
        _ => MaturityLevel::Nascent,
    }
}

/// Rushed: younger than an hour and refined fewer than three times.
pub fn is_rushed(hours: f64, evolution_event_count: usize) -> bool {
    hours < RUSHED_UNDER_HOURS && evolution_event_count < RUSHED_MIN_EVENTS
}

/// Human-readable wait suggestion for friction messaging.
///
/// Under the hard threshold the full wait to the medium threshold is
/// suggested; otherwise the remaining hours to the next threshold. Returns
/// `None` once the thesis has reached the soft threshold.
pub fn suggested_wait(hours: f64, thresholds: &LevelThresholds) -> Option<String> {
    let whole_hours = |h: f64| h.ceil().max(1.0) as u32;

    match hours {
        h if h < thresholds.hard => match whole_hours(thresholds.medium) {
            1 => Some("wait 1 hour".to_string()),
            n => Some(format!("wait {} hours", n)),
        },
        h if h < thresholds.medium => Some(wait_more(whole_hours(thresholds.medium - h))),
        h if h < thresholds.soft => Some(wait_more(whole_hours(thresholds.soft - h))),
        _ => None,
    }
}

fn wait_more(hours: u32) -> String {
    if hours == 1 {
        "wait 1 more hour".to_string()
    } else {
        format!("wait {} more hours", hours)
    }
}

/// Format hours as a short duration ("45 minutes", "3.5 hours").
pub fn format_hours(hours: f64) -> String {
    if hours < 1.0 {
        let minutes = (hours * 60.0).round() as u32;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    } else if (hours - hours.round()).abs() < 0.05 {
        let h = hours.round() as u32;
        if h == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", h)
        }
    } else {
        format!("{:.1} hours", hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::types::EvolutionEventType;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn event(minutes_ago: i64) -> ThesisEvolutionEvent {
        ThesisEvolutionEvent {
            event_type: EvolutionEventType::HypothesisRefined,
            previous_value: Some("old".to_string()),
            new_value: Some("new".to_string()),
            created_at: now() - Duration::minutes(minutes_ago),
            confidence_delta: None,
        }
    }

    #[test]
    fn test_rushed_nascent_thesis() {
        let calc = TimeInThesisCalculator::new();
        let metrics =
            calc.calculate(Some(now() - Duration::minutes(30)), None, &[event(10)], now());

        assert!((metrics.hours_in_development - 0.5).abs() < 1e-9);
        assert_eq!(metrics.evolution_event_count, 1);
        assert!(metrics.is_rushed);
        assert_eq!(metrics.maturity_level, MaturityLevel::Nascent);
    }

    #[test]
    fn test_young_but_refined_is_not_rushed() {
        let calc = TimeInThesisCalculator::new();
        let events = vec![event(20), event(10), event(5)];
        let metrics = calc.calculate(Some(now() - Duration::minutes(30)), None, &events, now());
        assert!(!metrics.is_rushed);
    }

    #[test]
    fn test_first_mentioned_preferred_over_created() {
        let calc = TimeInThesisCalculator::new();
        let metrics = calc.calculate(
            Some(now() - Duration::hours(30)),
            Some(now() - Duration::hours(2)),
            &[],
            now(),
        );
        assert!((metrics.hours_in_development - 30.0).abs() < 1e-9);
        assert_eq!(metrics.maturity_level, MaturityLevel::Mature);
    }

    #[test]
    fn test_falls_back_to_created_at() {
        let calc = TimeInThesisCalculator::new();
        let metrics = calc.calculate(None, Some(now() - Duration::hours(6)), &[], now());
        assert!((metrics.hours_in_development - 6.0).abs() < 1e-9);
        assert_eq!(metrics.maturity_level, MaturityLevel::Developing);
    }

    #[test]
    fn test_no_timestamps_is_zero_hours() {
        let metrics = TimeInThesisCalculator::new().calculate(None, None, &[], now());
        assert_eq!(metrics.hours_in_development, 0.0);
        assert!(metrics.is_rushed);
        assert_eq!(metrics.maturity_level, MaturityLevel::Nascent);
        assert_eq!(
            suggested_wait(0.0, &LevelThresholds::new(1.0, 4.0, 8.0)).as_deref(),
            Some("wait 4 hours")
        );
    }

    #[test]
    fn test_future_start_clamps_to_zero() {
        let metrics = TimeInThesisCalculator::new().calculate(
            Some(now() + Duration::hours(2)),
            None,
            &[],
            now(),
        );
        assert_eq!(metrics.hours_in_development, 0.0);
    }

    #[test]
    fn test_maturity_boundaries() {
        assert_eq!(maturity_for_hours(0.0), MaturityLevel::Nascent);
        assert_eq!(maturity_for_hours(3.99), MaturityLevel::Nascent);
        assert_eq!(maturity_for_hours(4.0), MaturityLevel::Developing);
        assert_eq!(maturity_for_hours(23.99), MaturityLevel::Developing);
        assert_eq!(maturity_for_hours(24.0), MaturityLevel::Mature);
    }

    #[test]
    fn test_suggested_wait() {
        let t = LevelThresholds::new(1.0, 4.0, 8.0);
        assert_eq!(suggested_wait(0.5, &t).as_deref(), Some("wait 4 hours"));
        assert_eq!(suggested_wait(1.5, &t).as_deref(), Some("wait 3 more hours"));
        assert_eq!(suggested_wait(3.5, &t).as_deref(), Some("wait 1 more hour"));
        assert_eq!(suggested_wait(5.0, &t).as_deref(), Some("wait 3 more hours"));
        assert_eq!(suggested_wait(8.0, &t), None);
    }

    #[test]
    fn test_suggested_wait_follows_custom_thresholds() {
        let t = LevelThresholds::new(2.0, 12.0, 24.0);
        assert_eq!(suggested_wait(1.0, &t).as_deref(), Some("wait 12 hours"));
        assert_eq!(suggested_wait(5.0, &t).as_deref(), Some("wait 7 more hours"));
        assert_eq!(suggested_wait(10.0, &t).as_deref(), Some("wait 2 more hours"));
        assert_eq!(suggested_wait(20.0, &t).as_deref(), Some("wait 4 more hours"));
        assert_eq!(suggested_wait(24.0, &t), None);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(0.5), "30 minutes");
        assert_eq!(format_hours(1.0), "1 hour");
        assert_eq!(format_hours(3.0), "3 hours");
        assert_eq!(format_hours(3.5), "3.5 hours");
    }
}
