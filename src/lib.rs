//! # Process Integrity
//!
//! A decision-gating engine that sits between an investor and a trade. Before
//! a buy or sell goes through, it scores the quality of the research behind
//! the decision, how long the thesis has had to mature, and whether the
//! investor's language shows overconfidence or unstable conviction. The
//! scores are mapped to a friction level that can warn, ask for
//! confirmation, or demand a written justification.
//!
//! ## Dimensions
//!
//! - **Research quality**: tool diversity, devil's advocate, documented assumptions, time spent
//! - **Time in thesis**: hours since first mention, maturity and rushed detection
//! - **Conviction integrity**: certainty/hedging language, trend and swing across history
//! - **Override escalation**: repeated overrides within seven days raise the friction level
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (stdio) → ProcessIntegrityEngine
//!                                        ↓
//!                  scorers → FrictionOrchestrator → OverrideValidator
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use process_integrity::integrity::{
//!     IntegrityCheckInput, ProcessIntegrityCheckRequest, ProcessIntegrityEngine, TradeAction,
//! };
//!
//! let engine = ProcessIntegrityEngine::default();
//! let input = IntegrityCheckInput {
//!     request: ProcessIntegrityCheckRequest {
//!         symbol: "AAPL".to_string(),
//!         action: TradeAction::Buy,
//!         thesis_id: None,
//!         user_id: "user-1".to_string(),
//!     },
//!     research_session: Default::default(),
//!     thesis: Default::default(),
//!     evolution_events: vec![],
//!     statements: vec![],
//!     conviction_history: vec![],
//!     recent_override_count: 0,
//! };
//!
//! let response = engine.evaluate(&input, Utc::now());
//! assert!(response.override_required);
//! ```

#![warn(missing_docs)]

/// Command-line interface.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Scoring, friction classification and override handling.
pub mod integrity;
/// MCP server implementation and request handling.
pub mod server;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use integrity::ProcessIntegrityEngine;
pub use server::{AppState, McpServer, SharedState};
