//! Concrete method parameter lists.
//!
//! The external parser hands the checker one `ParamList` per method
//! definition: the parameters as written, tagged with their syntactic
//! kind. The matcher in `rue_infer` lines this list up against a declared
//! method-type signature.

use std::fmt;
use std::rc::Rc;

use crate::node::NodeId;
use crate::span::Span;

/// Syntactic kind of a concrete method parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParamKind {
    /// `def foo(x)`
    RequiredPositional,
    /// `def foo(x = 1)`
    OptionalPositional,
    /// `def foo(*x)`
    RestPositional,
    /// `def foo(x:)`
    RequiredKeyword,
    /// `def foo(x: 1)`
    OptionalKeyword,
    /// `def foo(**x)`
    RestKeyword,
    /// `def foo(&x)`
    Block,
    /// `def foo(...)`
    Forward,
}

impl ParamKind {
    /// Whether this kind occupies a positional slot.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            ParamKind::RequiredPositional
                | ParamKind::OptionalPositional
                | ParamKind::RestPositional
        )
    }

    /// Whether this kind occupies a keyword slot.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            ParamKind::RequiredKeyword | ParamKind::OptionalKeyword | ParamKind::RestKeyword
        )
    }
}

/// One concrete parameter as supplied by the external parser.
#[derive(Clone, Debug)]
pub struct Param {
    /// Parameter name; absent for anonymous rest/block/forwarding forms.
    pub name: Option<Rc<str>>,
    pub kind: ParamKind,
    /// Identity of the parameter node, carried into slots and diagnostics.
    pub node: NodeId,
    pub span: Span,
}

impl Param {
    pub fn new(kind: ParamKind, name: Option<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param {
            name,
            kind,
            node,
            span,
        }
    }

    pub fn required(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::RequiredPositional, Some(name.into()), node, span)
    }

    pub fn optional(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::OptionalPositional, Some(name.into()), node, span)
    }

    pub fn rest(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::RestPositional, Some(name.into()), node, span)
    }

    pub fn keyword(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::RequiredKeyword, Some(name.into()), node, span)
    }

    pub fn optional_keyword(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::OptionalKeyword, Some(name.into()), node, span)
    }

    pub fn rest_keyword(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::RestKeyword, Some(name.into()), node, span)
    }

    pub fn block(name: impl Into<Rc<str>>, node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::Block, Some(name.into()), node, span)
    }

    pub fn forward(node: NodeId, span: Span) -> Self {
        Param::new(ParamKind::Forward, None, node, span)
    }
}

/// The ordered concrete parameter list of one method definition.
#[derive(Clone, Debug, Default)]
pub struct ParamList(Vec<Param>);

impl ParamList {
    pub fn new(params: Vec<Param>) -> Self {
        ParamList(params)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Param> {
        self.0.get(index)
    }
}

impl<'a> IntoIterator for &'a ParamList {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Param> for ParamList {
    fn from_iter<T: IntoIterator<Item = Param>>(iter: T) -> Self {
        ParamList(iter.into_iter().collect())
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::RequiredPositional => "required positional",
            ParamKind::OptionalPositional => "optional positional",
            ParamKind::RestPositional => "rest positional",
            ParamKind::RequiredKeyword => "required keyword",
            ParamKind::OptionalKeyword => "optional keyword",
            ParamKind::RestKeyword => "rest keyword",
            ParamKind::Block => "block",
            ParamKind::Forward => "forwarding",
        };
        f.write_str(s)
    }
}
