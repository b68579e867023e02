//! Structured diagnostics for the rue checker.
//!
//! Records are structured, not strings: the external printer decides the
//! presentation, the checker only supplies the facts. Note that resolving
//! an unknown variable or constant to `untyped` is the designed gradual
//! fallback, not a diagnostic; only the kinds defined here are reportable.

mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Severity};
