/// Domain-specific error types for bench-analyzer
///
/// Two variants are expected operator conditions (no input file, no successful
/// rows) and are reported without failing the process. Everything else is a
/// genuine failure and propagates out of `main`.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No input file matching '{pattern}' found")]
    InputNotFound {
        pattern: String
    },

    #[error("No successful test data found in {path}")]
    EmptyInput {
        path: String
    },

    #[error("CSV error in {path} at line {line}: {message}")]
    Csv {
        path: String,
        line: u64,
        message: String,
    },

    #[error("I/O error on {path}: {message}")]
    Io {
        path: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<glob::PatternError> for AnalysisError {
    fn from(e: glob::PatternError) -> Self {
        AnalysisError::Config(format!("Invalid input pattern: {}", e))
    }
}

impl AnalysisError {
    /// Helper to wrap an I/O failure with the path it happened on
    ///
    /// Example:
    /// ```
    /// use bench_analyzer::errors::AnalysisError;
    /// let err = AnalysisError::io("out/report.txt", "permission denied");
    /// assert!(!err.is_recoverable());
    /// ```
    pub fn io(path: impl AsRef<Path>, message: impl ToString) -> Self {
        AnalysisError::Io {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Map a csv crate error onto the file it came from, keeping the line number.
    pub fn csv(path: impl AsRef<Path>, e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        AnalysisError::Csv {
            path: path.as_ref().display().to_string(),
            line,
            message: e.to_string(),
        }
    }

    /// Whether this is an expected operator condition rather than a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InputNotFound { .. } | AnalysisError::EmptyInput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        let not_found = AnalysisError::InputNotFound { pattern: "*.csv".into() };
        let empty = AnalysisError::EmptyInput { path: "a.csv".into() };
        assert!(not_found.is_recoverable());
        assert!(empty.is_recoverable());
        assert!(!AnalysisError::Config("bad".into()).is_recoverable());
        assert!(!AnalysisError::io("x", "boom").is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::Csv {
            path: "results.csv".into(),
            line: 4,
            message: "invalid float literal".into(),
        };
        assert_eq!(
            err.to_string(),
            "CSV error in results.csv at line 4: invalid float literal"
        );
    }
}
