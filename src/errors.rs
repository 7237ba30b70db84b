use thiserror::Error;

/// Main error type for the windgen crate
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No files found matching the provided patterns")]
    NoFilesFound,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A plugin failed during setup. `index` is its zero-based position in the plugin list.
    #[error("Plugin failure at position {index} ({name}): {message}")]
    PluginFailure {
        index: usize,
        name: String,
        message: String,
    },

    #[error("Failed to write output to {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Security violation: {0}")]
    SecurityError(String),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_failure_names_position() {
        let err = GeneratorError::PluginFailure {
            index: 1,
            name: "scrollbar".to_string(),
            message: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("position 1"));
        assert!(msg.contains("scrollbar"));
        assert!(msg.contains("boom"));
    }
}
