//! Diagnostic records.
//!
//! The checker appends these and never reads them back; rendering beyond
//! the terse `Display` summary belongs to the external printer. Every
//! record keeps the structured fields a printer needs: the node, its span,
//! and for subtyping failures the full relation chain.

use std::fmt;
use std::rc::Rc;

use rue_ir::{NodeId, Span, TypeName};
use rue_types::{MethodType, Relation, Type};

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Stable diagnostic codes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Method definition cannot accept what its signature declares.
    E1001,
    /// Concrete parameter with no declared counterpart.
    E1002,
    /// Concrete parameter matched a declared slot of a different kind.
    E1003,
    /// A required subtyping relation does not hold.
    E2001,
    /// A constant name did not resolve.
    E2002,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What went wrong, with the message-relevant fields.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticKind {
    /// The concrete parameter list as a whole cannot satisfy the declared
    /// signature's arity.
    MethodArityMismatch { method_type: MethodType },
    /// A concrete parameter with no declared counterpart of any kind.
    MethodParameterMismatch { name: Rc<str> },
    /// A concrete parameter consumed declared capacity of a different
    /// syntactic kind.
    DifferentMethodParameterKind { name: Rc<str> },
    /// `actual <: declared` does not hold; the chain records every
    /// sub-relation attempted, the failed one last.
    SubtypingFailure {
        declared: Type,
        actual: Type,
        chain: Vec<Relation>,
    },
    UnresolvedConstant { name: TypeName },
}

impl DiagnosticKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            DiagnosticKind::MethodArityMismatch { .. } => ErrorCode::E1001,
            DiagnosticKind::MethodParameterMismatch { .. } => ErrorCode::E1002,
            DiagnosticKind::DifferentMethodParameterKind { .. } => ErrorCode::E1003,
            DiagnosticKind::SubtypingFailure { .. } => ErrorCode::E2001,
            DiagnosticKind::UnresolvedConstant { .. } => ErrorCode::E2002,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::UnresolvedConstant { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MethodArityMismatch { method_type } => {
                write!(f, "method parameters are incompatible with `{method_type}`")
            }
            DiagnosticKind::MethodParameterMismatch { name } => {
                write!(f, "parameter `{name}` has no declared counterpart")
            }
            DiagnosticKind::DifferentMethodParameterKind { name } => {
                write!(f, "parameter `{name}` differs in kind from its declaration")
            }
            DiagnosticKind::SubtypingFailure { declared, actual, .. } => {
                write!(f, "`{actual}` is not a subtype of `{declared}`")
            }
            DiagnosticKind::UnresolvedConstant { name } => {
                write!(f, "cannot resolve constant `{name}`")
            }
        }
    }
}

/// One diagnostic, anchored to the node it was produced for.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub node: NodeId,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, node: NodeId, span: Span) -> Self {
        Diagnostic { kind, node, span }
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_kind(&self, code: ErrorCode) -> bool {
        self.code() == code
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity(), self.code(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rue_types::Type;

    use super::*;

    #[test]
    fn test_codes_and_severity() {
        let kind = DiagnosticKind::UnresolvedConstant {
            name: TypeName::new("::Foo"),
        };
        assert_eq!(kind.code(), ErrorCode::E2002);
        assert_eq!(kind.severity(), Severity::Warning);

        let kind = DiagnosticKind::SubtypingFailure {
            declared: Type::nominal("::Integer"),
            actual: Type::nominal("::String"),
            chain: vec![],
        };
        assert_eq!(kind.code(), ErrorCode::E2001);
        assert_eq!(kind.severity(), Severity::Error);
    }

    #[test]
    fn test_display_summary() {
        let d = Diagnostic::new(
            DiagnosticKind::SubtypingFailure {
                declared: Type::nominal("::Integer"),
                actual: Type::nominal("::String"),
                chain: vec![],
            },
            NodeId::new(3),
            Span::new(0, 4),
        );
        assert_eq!(
            d.to_string(),
            "error[E2001]: `::String` is not a subtype of `::Integer`"
        );
    }
}
