//! Declared method-type signatures.
//!
//! These are the shapes the signature database hands the checker: the
//! positional/keyword parameter lists of a method type, its optional block,
//! and its return type. Display renders the declaration syntax
//! (`(A, ?B, *C, x: D, ?y: E, **F)`), which diagnostics and the forwarding
//! remainder rely on.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ty::{Subst, Type, TypeVar, VarFactory};

/// Positional and keyword parameter types of one signature.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Params {
    pub required: Vec<Type>,
    pub optional: Vec<Type>,
    pub rest: Option<Type>,
    /// Required keywords in declaration order.
    pub required_keywords: Vec<(Rc<str>, Type)>,
    /// Optional keywords in declaration order.
    pub optional_keywords: Vec<(Rc<str>, Type)>,
    pub rest_keywords: Option<Type>,
}

impl Params {
    pub fn empty() -> Self {
        Params::default()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
            && self.optional.is_empty()
            && self.rest.is_none()
            && self.required_keywords.is_empty()
            && self.optional_keywords.is_empty()
            && self.rest_keywords.is_none()
    }

    /// Minimum number of positional arguments a call must pass.
    pub fn min_positional(&self) -> usize {
        self.required.len()
    }

    /// Maximum number of positional arguments, `None` with a rest.
    pub fn max_positional(&self) -> Option<usize> {
        if self.rest.is_some() {
            None
        } else {
            Some(self.required.len() + self.optional.len())
        }
    }

    /// The type accepted at positional index `idx`, falling through
    /// required, optional, then rest.
    pub fn positional(&self, idx: usize) -> Option<&Type> {
        if idx < self.required.len() {
            return Some(&self.required[idx]);
        }
        let idx = idx - self.required.len();
        if idx < self.optional.len() {
            return Some(&self.optional[idx]);
        }
        self.rest.as_ref()
    }

    /// Look up a keyword by name. The flag is true for a required keyword.
    pub fn keyword(&self, name: &str) -> Option<(&Type, bool)> {
        if let Some((_, ty)) = self
            .required_keywords
            .iter()
            .find(|(n, _)| n.as_ref() == name)
        {
            return Some((ty, true));
        }
        self.optional_keywords
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, ty)| (ty, false))
    }

    pub fn for_each_type(&self, f: &mut impl FnMut(&Type)) {
        for t in &self.required {
            f(t);
        }
        for t in &self.optional {
            f(t);
        }
        if let Some(t) = &self.rest {
            f(t);
        }
        for (_, t) in &self.required_keywords {
            f(t);
        }
        for (_, t) in &self.optional_keywords {
            f(t);
        }
        if let Some(t) = &self.rest_keywords {
            f(t);
        }
    }

    #[must_use]
    pub fn map_types(&self, f: &mut impl FnMut(&Type) -> Type) -> Params {
        Params {
            required: self.required.iter().map(&mut *f).collect(),
            optional: self.optional.iter().map(&mut *f).collect(),
            rest: self.rest.as_ref().map(&mut *f),
            required_keywords: self
                .required_keywords
                .iter()
                .map(|(n, t)| (n.clone(), f(t)))
                .collect(),
            optional_keywords: self
                .optional_keywords
                .iter()
                .map(|(n, t)| (n.clone(), f(t)))
                .collect(),
            rest_keywords: self.rest_keywords.as_ref().map(&mut *f),
        }
    }

    #[must_use]
    pub fn subst(&self, s: &Subst) -> Params {
        self.map_types(&mut |t| t.subst(s))
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if first {
                first = false;
                Ok(())
            } else {
                f.write_str(", ")
            }
        };
        for t in &self.required {
            sep(f)?;
            write!(f, "{t}")?;
        }
        for t in &self.optional {
            sep(f)?;
            write!(f, "?{t}")?;
        }
        if let Some(t) = &self.rest {
            sep(f)?;
            write!(f, "*{t}")?;
        }
        for (n, t) in &self.required_keywords {
            sep(f)?;
            write!(f, "{n}: {t}")?;
        }
        for (n, t) in &self.optional_keywords {
            sep(f)?;
            write!(f, "?{n}: {t}")?;
        }
        if let Some(t) = &self.rest_keywords {
            sep(f)?;
            write!(f, "**{t}")?;
        }
        f.write_str(")")
    }
}

/// The functional part of a signature or proc type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionType {
    pub params: Params,
    /// A block the function itself accepts, as in `^() { () -> void } -> void`.
    pub block: Option<Box<BlockType>>,
    pub return_type: Type,
}

impl FunctionType {
    pub fn new(params: Params, return_type: Type) -> Self {
        FunctionType {
            params,
            block: None,
            return_type,
        }
    }

    #[must_use]
    pub fn with_block(mut self, block: BlockType) -> Self {
        self.block = Some(Box::new(block));
        self
    }

    pub fn for_each_type(&self, f: &mut impl FnMut(&Type)) {
        self.params.for_each_type(f);
        if let Some(block) = &self.block {
            block.function.for_each_type(f);
            if let Some(s) = &block.self_type {
                f(s);
            }
        }
        f(&self.return_type);
    }

    #[must_use]
    pub fn map_types(&self, f: &mut impl FnMut(&Type) -> Type) -> FunctionType {
        FunctionType {
            params: self.params.map_types(f),
            block: self.block.as_ref().map(|b| Box::new(b.map_types(f))),
            return_type: f(&self.return_type),
        }
    }

    #[must_use]
    pub fn subst(&self, s: &Subst) -> FunctionType {
        self.map_types(&mut |t| t.subst(s))
    }
}

/// A declared block signature.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct BlockType {
    pub function: FunctionType,
    /// False for `?{ ... }` blocks.
    pub required: bool,
    /// `self` binding inside the block, as in `{ () [self: T] -> void }`.
    pub self_type: Option<Type>,
}

impl BlockType {
    pub fn new(function: FunctionType, required: bool) -> Self {
        BlockType {
            function,
            required,
            self_type: None,
        }
    }

    #[must_use]
    pub fn with_self_type(mut self, self_type: Type) -> Self {
        self.self_type = Some(self_type);
        self
    }

    #[must_use]
    pub fn map_types(&self, f: &mut impl FnMut(&Type) -> Type) -> BlockType {
        BlockType {
            function: self.function.map_types(f),
            required: self.required,
            self_type: self.self_type.as_ref().map(&mut *f),
        }
    }

    #[must_use]
    pub fn subst(&self, s: &Subst) -> BlockType {
        self.map_types(&mut |t| t.subst(s))
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.required {
            f.write_str("?")?;
        }
        write!(f, "{{ {}", self.function.params)?;
        if let Some(s) = &self.self_type {
            write!(f, " [self: {s}]")?;
        }
        write!(f, " -> {} }}", self.function.return_type)
    }
}

/// The parameter shape of a method type: a concrete parameter list or the
/// unconstrained `(?)` placeholder whose arity is never checked.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParamsShape {
    Typed(Params),
    Untyped,
}

impl ParamsShape {
    pub fn as_params(&self) -> Option<&Params> {
        match self {
            ParamsShape::Typed(p) => Some(p),
            ParamsShape::Untyped => None,
        }
    }

    #[must_use]
    pub fn map_types(&self, f: &mut impl FnMut(&Type) -> Type) -> ParamsShape {
        match self {
            ParamsShape::Typed(p) => ParamsShape::Typed(p.map_types(f)),
            ParamsShape::Untyped => ParamsShape::Untyped,
        }
    }
}

impl fmt::Display for ParamsShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsShape::Typed(p) => write!(f, "{p}"),
            ParamsShape::Untyped => f.write_str("(?)"),
        }
    }
}

/// A declared method type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MethodType {
    /// Generic parameters, instantiated with fresh variables before use.
    pub type_params: Vec<TypeVar>,
    pub params: ParamsShape,
    pub block: Option<BlockType>,
    pub return_type: Type,
}

impl MethodType {
    pub fn new(params: Params, block: Option<BlockType>, return_type: Type) -> Self {
        MethodType {
            type_params: Vec::new(),
            params: ParamsShape::Typed(params),
            block,
            return_type,
        }
    }

    /// The `(?) -> T` placeholder signature.
    pub fn untyped(return_type: Type) -> Self {
        MethodType {
            type_params: Vec::new(),
            params: ParamsShape::Untyped,
            block: None,
            return_type,
        }
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<TypeVar>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self.params, ParamsShape::Untyped)
    }

    /// Replace the generic parameters with fresh variables from `factory`.
    #[must_use]
    pub fn instantiate(&self, factory: &mut VarFactory) -> MethodType {
        if self.type_params.is_empty() {
            return self.clone();
        }
        let s: Subst = self
            .type_params
            .iter()
            .map(|v| (*v, Type::var(factory.fresh())))
            .collect();
        MethodType {
            type_params: Vec::new(),
            params: self.params.map_types(&mut |t| t.subst(&s)),
            block: self.block.as_ref().map(|b| b.subst(&s)),
            return_type: self.return_type.subst(&s),
        }
    }

    /// Substitute free variables, leaving the bound generic parameters
    /// untouched.
    #[must_use]
    pub fn subst(&self, s: &Subst) -> MethodType {
        let filtered;
        let s = if self.type_params.iter().any(|v| s.get(v).is_some()) {
            let mut copy = s.clone();
            for v in &self.type_params {
                copy.remove(v);
            }
            filtered = copy;
            &filtered
        } else {
            s
        };
        MethodType {
            type_params: self.type_params.clone(),
            params: self.params.map_types(&mut |t| t.subst(s)),
            block: self.block.as_ref().map(|b| b.subst(s)),
            return_type: self.return_type.subst(s),
        }
    }

    pub fn free_variables(&self) -> FxHashSet<TypeVar> {
        let mut out = FxHashSet::default();
        let mut visit = |t: &Type| out.extend(t.free_variables());
        if let ParamsShape::Typed(p) = &self.params {
            p.for_each_type(&mut visit);
        }
        if let Some(b) = &self.block {
            b.function.for_each_type(&mut visit);
            if let Some(s) = &b.self_type {
                visit(s);
            }
        }
        visit(&self.return_type);
        for v in &self.type_params {
            out.remove(v);
        }
        out
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.params)?;
        if let Some(b) = &self.block {
            write!(f, " {b}")?;
        }
        write!(f, " -> {}", self.return_type)
    }
}
