//! Command-line interface.
//!
//! `serve` (the default) runs the MCP server on stdio. `check` and
//! `validate-override` run the engine once against local input, which is
//! handy for scripting and for inspecting threshold changes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::error::{AppError, AppResult};
use crate::integrity::{
    FrictionLevel, IntegrityCheckInput, OverrideRequest, ProcessIntegrityEngine,
};

/// Top-level CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "process-integrity", version, about = "Decision-gating engine for trading actions")]
pub struct Cli {
    /// Subcommand to run (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the MCP server over stdio
    Serve,

    /// Evaluate a check input read from a JSON file
    Check {
        /// Path to a JSON file holding an integrity check input
        #[arg(long)]
        input: PathBuf,

        /// Evaluation time (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Validate an override attempt
    ValidateOverride {
        /// Friction level being overridden: none, soft, medium, hard
        #[arg(long)]
        level: FrictionLevel,

        /// Justification for proceeding
        #[arg(long)]
        reasoning: Option<String>,
    },
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create a result with a non-zero exit code.
    pub fn failure(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }
}

/// Read a check input file and evaluate it.
pub fn run_check(
    engine: &ProcessIntegrityEngine,
    input: &Path,
    at: Option<DateTime<Utc>>,
) -> AppResult<CliResult> {
    let raw = std::fs::read_to_string(input)?;
    let check: IntegrityCheckInput =
        serde_json::from_str(&raw).map_err(|e| AppError::InvalidInput {
            message: format!("{}: {}", input.display(), e),
        })?;

    let response = engine.evaluate(&check, at.unwrap_or_else(Utc::now));
    let text = serde_json::to_string_pretty(&response).map_err(|e| AppError::Internal {
        message: e.to_string(),
    })?;

    Ok(CliResult::success(text))
}

/// Validate an override from the command line. Exit code 2 when rejected.
pub fn run_validate_override(
    engine: &ProcessIntegrityEngine,
    level: FrictionLevel,
    reasoning: Option<String>,
) -> CliResult {
    let validation = engine.validate_override(&OverrideRequest {
        friction_level: level,
        user_reasoning: reasoning,
    });

    if validation.valid {
        CliResult::success(validation.message)
    } else {
        CliResult::failure(2, validation.message)
    }
}
