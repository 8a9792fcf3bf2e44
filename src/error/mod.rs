use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Caller-supplied input could not be parsed
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Filesystem or stdio failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    /// Tool name not registered
    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    /// Tool arguments missing or malformed
    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    /// Result could not be serialized
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");

        let err = AppError::InvalidInput {
            message: "check.json: missing field `request`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid input: check.json: missing field `request`"
        );
    }

    #[test]
    fn test_mcp_error_display() {
        let err = McpError::UnknownTool {
            tool_name: "nonexistent".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: nonexistent");

        let err = McpError::InvalidParameters {
            tool_name: "integrity_check".to_string(),
            message: "missing request".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameters for integrity_check: missing request"
        );
    }

    #[test]
    fn test_json_error_conversion_to_mcp_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mcp_err: McpError = json_err.into();
        assert!(matches!(mcp_err, McpError::Json(_)));
    }

    #[test]
    fn test_io_error_conversion_to_app_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("missing.json"));
    }
}
