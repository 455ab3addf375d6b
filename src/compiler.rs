//! Compiler adapter.
//!
//! Wraps the injected [`Transformer`] so that no failure escapes: compile
//! and eval errors are captured into [`CompileResult`] fields and rendered
//! inline by the view. The adapter itself has no side effects beyond calling
//! the transformer.

use tracing::debug;

use crate::{CompileError, EvalError};

/// Options handed to the transformer for one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Package ids of the presets to apply, in registry order. Only presets
    /// that are both enabled and loaded appear here.
    pub presets: Vec<String>,
    /// Whether to execute the compiled output afterwards.
    pub evaluate: bool,
    /// Whether to prettify the output.
    pub prettify: bool,
}

/// Outcome of one compile (and optional evaluate) pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileResult {
    /// Compiled text, `None` when compilation failed.
    pub compiled: Option<String>,
    /// Compile-phase error, `None` on success.
    pub compile_error: Option<CompileError>,
    /// Execution-phase error; only ever set when evaluate was requested and
    /// compilation succeeded.
    pub eval_error: Option<EvalError>,
}

/// Port to the external compile/evaluate facility.
pub trait Transformer: Send {
    /// Transform `source` under `options`, returning the compiled text.
    fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, CompileError>;

    /// Execute previously compiled output.
    fn evaluate(&self, compiled: &str) -> Result<(), EvalError>;
}

/// Run one compile pass, capturing every failure into the result.
pub fn run_compile(
    transformer: &dyn Transformer,
    source: &str,
    options: &TransformOptions,
) -> CompileResult {
    debug!(presets = ?options.presets, evaluate = options.evaluate, "compiling");

    let mut result = CompileResult::default();
    match transformer.transform(source, options) {
        Ok(compiled) => {
            if options.evaluate {
                if let Err(error) = transformer.evaluate(&compiled) {
                    result.eval_error = Some(error);
                }
            }
            result.compiled = Some(compiled);
        }
        Err(error) => {
            debug!(%error, "compile failed");
            result.compile_error = Some(error);
        }
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Transformer that upper-cases source, failing on marker strings.
    struct FakeTransformer;

    impl Transformer for FakeTransformer {
        fn transform(
            &self,
            source: &str,
            _options: &TransformOptions,
        ) -> Result<String, CompileError> {
            if source.contains("syntax!") {
                Err(CompileError("unexpected token".to_string()))
            } else {
                Ok(source.to_uppercase())
            }
        }

        fn evaluate(&self, compiled: &str) -> Result<(), EvalError> {
            if compiled.contains("THROW") {
                Err(EvalError("thrown at runtime".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_successful_compile() {
        let result = run_compile(&FakeTransformer, "let x", &TransformOptions::default());
        assert_eq!(result.compiled.as_deref(), Some("LET X"));
        assert!(result.compile_error.is_none());
        assert!(result.eval_error.is_none());
    }

    #[test]
    fn test_compile_error_captured() {
        let result = run_compile(&FakeTransformer, "syntax!", &TransformOptions::default());
        assert!(result.compiled.is_none());
        assert_eq!(
            result.compile_error,
            Some(CompileError("unexpected token".to_string()))
        );
    }

    #[test]
    fn test_eval_error_only_when_requested() {
        let options = TransformOptions::default();
        let result = run_compile(&FakeTransformer, "throw", &options);
        assert!(result.eval_error.is_none());

        let options = TransformOptions {
            evaluate: true,
            ..TransformOptions::default()
        };
        let result = run_compile(&FakeTransformer, "throw", &options);
        // Compiled output is kept even when evaluation fails.
        assert_eq!(result.compiled.as_deref(), Some("THROW"));
        assert!(result.eval_error.is_some());
    }

    #[test]
    fn test_no_eval_after_compile_failure() {
        let options = TransformOptions {
            evaluate: true,
            ..TransformOptions::default()
        };
        let result = run_compile(&FakeTransformer, "syntax!", &options);
        assert!(result.compile_error.is_some());
        assert!(result.eval_error.is_none());
    }
}
