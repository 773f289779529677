//! Error type for rendering operations.
//!
//! [`RenderError`] is the single error type every public engine operation
//! returns. Compile-time failures from the compiler crate are wrapped
//! transparently; all variants are fatal to the render that raised them and
//! propagate synchronously with no retries.

use thiserror::Error;

pub use stencil_compiler::CompileError;

/// Error type for template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template name did not resolve to a readable source file.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Template source failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A filter name with no registration was applied.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// A registered filter rejected its input.
    #[error("filter `{filter}` failed: {reason}")]
    Filter { filter: String, reason: String },

    /// Template data did not serialize to an object.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading template source or writing a cache artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_template() {
        let err = RenderError::TemplateNotFound("pages.home".to_string());
        assert!(err.to_string().contains("template not found"));
        assert!(err.to_string().contains("pages.home"));
    }

    #[test]
    fn display_names_the_unknown_filter() {
        let err = RenderError::UnknownFilter("sparkle".to_string());
        assert!(err.to_string().contains("unknown filter"));
        assert!(err.to_string().contains("sparkle"));
    }

    #[test]
    fn compile_errors_pass_through() {
        let err: RenderError = CompileError::UnknownDirective("widget".to_string()).into();
        assert!(err.to_string().contains("widget"));
    }
}
