//! Generic ScriptEngine Trait
//!
//! The interface the command line front end and tests drive scripts through.
//! [`crate::scripting::RhaiEngine`] is the only backend.
//!
//! # Async Support
//!
//! Execution methods are async so that a backend can move blocking work (here:
//! native I2C reads made by the script) off the async runtime's worker threads.
//!
//! # Error Handling
//!
//! All backend failures are mapped to [`ScriptError`].

use async_trait::async_trait;
use std::any::Any;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during script execution
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    /// Compilation or parsing error
    #[error("Compilation error: {message}{}", location(.line, .column))]
    CompilationError {
        /// Parser message
        message: String,
        /// 1-based line, when known
        line: Option<usize>,
        /// 1-based column, when known
        column: Option<usize>,
    },

    /// Runtime execution error, including errors thrown by the `BH1730` module
    #[error("Runtime error: {message}")]
    RuntimeError {
        /// Error message
        message: String,
    },

    /// Script stopped by the operation safety limit
    #[error("Script terminated: {reason}")]
    Terminated {
        /// Reason given by the progress callback
        reason: String,
    },

    /// Type conversion error between Rust and script types
    #[error("Type conversion error: expected {expected}, found {found}")]
    TypeConversionError {
        /// Expected type name
        expected: String,
        /// Actual type name
        found: String,
    },

    /// Variable not found in global scope
    #[error("Variable not found: {name}")]
    VariableNotFound {
        /// Variable name
        name: String,
    },

    /// Script file could not be read
    #[error("Cannot read script {path}: {message}")]
    Io {
        /// Script path
        path: String,
        /// I/O error message
        message: String,
    },

    /// Error during async operation
    #[error("Async error: {message}")]
    AsyncError {
        /// Join error message
        message: String,
    },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(col)) => format!(" at line {}, column {}", line, col),
        (Some(line), None) => format!(" at line {}", line),
        _ => String::new(),
    }
}

// =============================================================================
// ScriptValue - Type-Erased Value Container
// =============================================================================

/// A type-erased container for values passed between Rust and scripts
///
/// # Example
///
/// ```rust
/// use bh1730_script::scripting::ScriptValue;
///
/// let value = ScriptValue::new(42_i64);
/// let num: i64 = value.downcast().unwrap();
/// assert_eq!(num, 42);
/// ```
#[derive(Debug)]
pub struct ScriptValue {
    inner: Box<dyn Any + Send + Sync>,
}

impl ScriptValue {
    /// Create a new ScriptValue from any type that is Send + Sync + 'static
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    /// Attempt to downcast to a concrete type
    pub fn downcast<T: Any>(self) -> Result<T, ScriptError> {
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ScriptError::TypeConversionError {
                expected: std::any::type_name::<T>().to_string(),
                found: "unknown".to_string(),
            })
    }

    /// Attempt to get a reference to the inner value
    pub fn downcast_ref<T: Any>(&self) -> Result<&T, ScriptError> {
        self.inner
            .downcast_ref::<T>()
            .ok_or_else(|| ScriptError::TypeConversionError {
                expected: std::any::type_name::<T>().to_string(),
                found: "unknown".to_string(),
            })
    }
}

// =============================================================================
// ScriptEngine Trait
// =============================================================================

/// Interface for scripting backends
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Execute a script and return the value of its final expression.
    async fn execute_script(&mut self, script: &str) -> Result<ScriptValue, ScriptError>;

    /// Validate script syntax without executing it.
    async fn validate_script(&self, script: &str) -> Result<(), ScriptError>;

    /// Set a global variable that persists across executions.
    fn set_global(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError>;

    /// Get a global variable set by [`set_global`](Self::set_global) or by a
    /// script.
    fn get_global(&self, name: &str) -> Result<ScriptValue, ScriptError>;

    /// Remove all global variables.
    fn clear_globals(&mut self);

    /// Name of the backend, for logs.
    fn backend_name(&self) -> &str;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_value_creation() {
        let value = ScriptValue::new(42_i64);
        let num: i64 = value.downcast().unwrap();
        assert_eq!(num, 42);
    }

    #[test]
    fn test_script_value_downcast_error() {
        let value = ScriptValue::new(42_i64);
        let result: Result<String, _> = value.downcast();
        assert!(result.is_err());
    }

    #[test]
    fn test_script_value_downcast_ref() {
        let value = ScriptValue::new(0.5_f64);
        let num_ref: &f64 = value.downcast_ref().unwrap();
        assert_eq!(*num_ref, 0.5);
    }

    #[test]
    fn test_script_error_display() {
        let error = ScriptError::CompilationError {
            message: "unexpected token".to_string(),
            line: Some(10),
            column: Some(5),
        };
        let display = format!("{}", error);
        assert!(display.contains("line 10"));
        assert!(display.contains("column 5"));

        let error = ScriptError::CompilationError {
            message: "unexpected token".to_string(),
            line: None,
            column: None,
        };
        assert_eq!(error.to_string(), "Compilation error: unexpected token");
    }

    #[test]
    fn test_terminated_display() {
        let error = ScriptError::Terminated {
            reason: "Safety limit exceeded: maximum 100 operations".to_string(),
        };
        assert!(error.to_string().contains("Safety limit"));
    }
}
