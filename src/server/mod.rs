//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::integrity::ProcessIntegrityEngine;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Process-integrity engine built from the friction configuration.
    pub engine: ProcessIntegrityEngine,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> Self {
        tracing::info!(
            research_hard = config.friction.research.hard,
            time_hard_hours = config.friction.time_hours.hard,
            escalation_overrides = config.friction.escalation_override_count,
            "AppState initializing with friction configuration"
        );

        let engine = ProcessIntegrityEngine::new(config.friction.clone());
        Self { config, engine }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
