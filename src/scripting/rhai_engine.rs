//! Rhai Implementation of ScriptEngine Trait
//!
//! [`RhaiEngine`] hosts BH1730 scripts. It keeps one persistent scope across
//! executions and enforces an operation budget so a runaway loop cannot hang
//! the host.
//!
//! Scripts run on [`tokio::task::spawn_blocking`]: every `read_lux()` made by a
//! script is a blocking I2C transaction in the native driver.
//!
//! `print` and `debug` output from scripts is forwarded to `tracing` under the
//! `bh1730_script::script` target.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bh1730_script::mock::MockDriver;
//! use bh1730_script::scripting::{RhaiEngine, ScriptEngine};
//! use bh1730_script::sensor::Bh1730;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = Arc::new(MockDriver::new().with_sensor(0x29, 0x1000, 250.0));
//! let mut engine = RhaiEngine::with_sensor(Bh1730::new(driver), 10_000);
//! let result = engine
//!     .execute_script("let s = BH1730::create(0x29); let lux = s.read_lux(); s.close(); lux")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use super::bindings::register_bh1730;
use super::script_engine::{ScriptEngine, ScriptError, ScriptValue};
use crate::sensor::Bh1730;
use async_trait::async_trait;
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default operation budget per script execution
pub const DEFAULT_MAX_OPERATIONS: u64 = 10_000;

// =============================================================================
// RhaiEngine Implementation
// =============================================================================

/// Rhai-based implementation of ScriptEngine
///
/// The engine and scope sit behind `Arc<Mutex<>>` so an execution can be
/// moved to a blocking worker thread. One execution runs at a time.
pub struct RhaiEngine {
    engine: Arc<Mutex<Engine>>,
    scope: Arc<Mutex<Scope<'static>>>,
}

impl RhaiEngine {
    /// Create a new RhaiEngine with the default operation budget and no sensor
    /// bindings.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_OPERATIONS)
    }

    /// Create a new RhaiEngine with a custom operation budget
    pub fn with_limit(max_operations: u64) -> Self {
        let mut engine = Engine::new();

        engine.on_progress(move |count| {
            if count > max_operations {
                Some(
                    format!(
                        "Safety limit exceeded: maximum {} operations",
                        max_operations
                    )
                    .into(),
                )
            } else {
                None
            }
        });

        engine.on_print(|text| {
            tracing::info!(target: "bh1730_script::script", "{}", text);
        });
        engine.on_debug(|text, source, pos| {
            tracing::debug!(
                target: "bh1730_script::script",
                source = source.unwrap_or("<script>"),
                line = pos.line().unwrap_or(0),
                "{}",
                text
            );
        });

        Self {
            engine: Arc::new(Mutex::new(engine)),
            scope: Arc::new(Mutex::new(Scope::new())),
        }
    }

    /// Create an engine with the `BH1730` module registered against `factory`
    pub fn with_sensor(factory: Bh1730, max_operations: u64) -> Self {
        let host = Self::with_limit(max_operations);
        register_bh1730(&mut lock(&host.engine), factory);
        host
    }

    /// Get mutable access to the underlying Rhai engine
    ///
    /// Don't hold the returned guard across await points.
    pub fn engine_mut(&mut self) -> MutexGuard<'_, Engine> {
        lock(&self.engine)
    }

    /// Read a script file and execute it
    pub async fn execute_file(&mut self, path: &Path) -> Result<ScriptValue, ScriptError> {
        let script = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScriptError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        self.execute_script(&script).await
    }
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// ScriptEngine Trait Implementation
// =============================================================================

#[async_trait]
impl ScriptEngine for RhaiEngine {
    async fn execute_script(&mut self, script: &str) -> Result<ScriptValue, ScriptError> {
        let engine = self.engine.clone();
        let scope = self.scope.clone();
        let script = script.to_string();

        // Native reads block, so keep them off the async workers
        tokio::task::spawn_blocking(move || {
            let engine = lock(&engine);
            let mut scope = lock(&scope);

            let result: Dynamic = engine
                .eval_with_scope(&mut scope, &script)
                .map_err(convert_rhai_error)?;

            Ok(ScriptValue::new(result))
        })
        .await
        .map_err(|e| ScriptError::AsyncError {
            message: format!("Task join error: {}", e),
        })?
    }

    async fn validate_script(&self, script: &str) -> Result<(), ScriptError> {
        let engine = self.engine.clone();
        let script = script.to_string();

        tokio::task::spawn_blocking(move || {
            let engine = lock(&engine);
            engine
                .compile(&script)
                .map_err(|e| convert_rhai_error(e.into()))?;
            Ok(())
        })
        .await
        .map_err(|e| ScriptError::AsyncError {
            message: format!("Task join error: {}", e),
        })?
    }

    fn set_global(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError> {
        let dynamic = value
            .downcast::<Dynamic>()
            .map_err(|_| ScriptError::TypeConversionError {
                expected: "rhai::Dynamic".to_string(),
                found: "unknown".to_string(),
            })?;

        lock(&self.scope).push(name.to_string(), dynamic);
        Ok(())
    }

    fn get_global(&self, name: &str) -> Result<ScriptValue, ScriptError> {
        lock(&self.scope)
            .get_value::<Dynamic>(name)
            .ok_or_else(|| ScriptError::VariableNotFound {
                name: name.to_string(),
            })
            .map(ScriptValue::new)
    }

    fn clear_globals(&mut self) {
        lock(&self.scope).clear();
    }

    fn backend_name(&self) -> &str {
        "Rhai"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Convert Rhai's EvalAltResult to our ScriptError type
fn convert_rhai_error(error: Box<EvalAltResult>) -> ScriptError {
    match *error {
        EvalAltResult::ErrorParsing(parse_error, pos) => ScriptError::CompilationError {
            message: format!("{}", parse_error),
            line: pos.line(),
            column: pos.position(),
        },
        EvalAltResult::ErrorRuntime(message, _) => ScriptError::RuntimeError {
            message: message.to_string(),
        },
        EvalAltResult::ErrorTerminated(reason, _) => ScriptError::Terminated {
            reason: reason.to_string(),
        },
        EvalAltResult::ErrorMismatchDataType(expected, actual, _) => {
            ScriptError::TypeConversionError {
                expected,
                found: actual,
            }
        }
        other => ScriptError::RuntimeError {
            message: format!("{}", other),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
