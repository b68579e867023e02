//! The algebraic type representation.
//!
//! `Type` is an immutable value: every operation returns a new value and
//! shares unaffected subtrees through `Rc`. Equality and hashing are purely
//! structural over the constructor and payload; the optional source span is
//! metadata and never participates, so two types built at different source
//! positions are interchangeable.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use rue_ir::{Span, TypeName};

use crate::flags::TypeFlags;
use crate::method_type::{FunctionType, Params};

/// A type variable.
///
/// The `depth` tag records the generic-instantiation nesting level the
/// variable was issued at, keeping numbering unambiguous when one
/// instantiation happens inside another.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct TypeVar {
    pub id: u32,
    pub depth: u32,
}

impl TypeVar {
    pub const fn new(id: u32) -> Self {
        TypeVar { id, depth: 0 }
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}", self.id)?;
        if self.depth > 0 {
            write!(f, "@{}", self.depth)?;
        }
        Ok(())
    }
}

/// Issues fresh type variables for one instantiation scope.
#[derive(Clone, Debug, Default)]
pub struct VarFactory {
    next: u32,
    depth: u32,
}

impl VarFactory {
    pub fn new() -> Self {
        VarFactory::default()
    }

    pub fn fresh(&mut self) -> TypeVar {
        let var = TypeVar {
            id: self.next,
            depth: self.depth,
        };
        self.next += 1;
        var
    }

    /// Factory for a nested generic instantiation. Ids restart, but the
    /// deeper level keeps them distinct from the enclosing scope's.
    #[must_use]
    pub fn nested(&self) -> VarFactory {
        VarFactory {
            next: 0,
            depth: self.depth + 1,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// Underlying value of a literal type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum LiteralValue {
    Int(i64),
    Str(Rc<str>),
    Sym(Rc<str>),
    Bool(bool),
}

impl LiteralValue {
    /// The nominal type backing this literal's value kind.
    ///
    /// # Panics
    /// Panics on a literal kind with no nominal backing (booleans):
    /// reaching this is a bug in the caller, not a property of the
    /// program being checked.
    pub fn back_type(&self) -> Type {
        match self {
            LiteralValue::Int(_) => Type::nominal("::Integer"),
            LiteralValue::Str(_) => Type::nominal("::String"),
            LiteralValue::Sym(_) => Type::nominal("::Symbol"),
            LiteralValue::Bool(_) => panic!("unexpected literal kind: {self}"),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::Str(v) => write!(f, "\"{v}\""),
            LiteralValue::Sym(v) => write!(f, ":{v}"),
            LiteralValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// The closed set of type constructors.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    /// The dynamic type, compatible in both directions.
    Any,
    /// A result nobody looks at.
    Void,
    Nil,
    /// The enclosing `self` type, resolved through a [`SelfContext`].
    SelfType,
    Instance,
    Class,
    Literal(LiteralValue),
    /// Nominal instance type, possibly applied: `::Array[::Integer]`.
    Name { name: TypeName, args: Vec<Type> },
    Union(Vec<Type>),
    Intersection(Vec<Type>),
    Function {
        function: FunctionType,
        /// `self` binding override, as in `^() [self: T] -> void`.
        self_type: Option<Type>,
    },
    Var(TypeVar),
}

/// An immutable type value with cached property flags and an optional
/// source span.
#[derive(Clone)]
pub struct Type {
    kind: Rc<TypeKind>,
    flags: TypeFlags,
    span: Option<Span>,
}

impl Type {
    fn from_kind(kind: TypeKind) -> Type {
        let flags = flags_of(&kind);
        Type {
            kind: Rc::new(kind),
            flags,
            span: None,
        }
    }

    pub fn any() -> Type {
        Type::from_kind(TypeKind::Any)
    }

    pub fn void() -> Type {
        Type::from_kind(TypeKind::Void)
    }

    pub fn nil() -> Type {
        Type::from_kind(TypeKind::Nil)
    }

    pub fn self_type() -> Type {
        Type::from_kind(TypeKind::SelfType)
    }

    pub fn instance() -> Type {
        Type::from_kind(TypeKind::Instance)
    }

    pub fn class() -> Type {
        Type::from_kind(TypeKind::Class)
    }

    pub fn literal(value: LiteralValue) -> Type {
        Type::from_kind(TypeKind::Literal(value))
    }

    /// Nominal instance type without arguments.
    pub fn nominal(name: impl Into<TypeName>) -> Type {
        Type::generic(name, Vec::new())
    }

    /// Nominal instance type with arguments.
    pub fn generic(name: impl Into<TypeName>, args: Vec<Type>) -> Type {
        Type::from_kind(TypeKind::Name {
            name: name.into(),
            args,
        })
    }

    /// Build a union, flattening nested unions, removing duplicates, and
    /// collapsing singletons. An empty member list collapses to `void`.
    pub fn union(types: Vec<Type>) -> Type {
        let mut members = Vec::new();
        let mut seen = FxHashSet::default();
        flatten_into(types, &mut members, &mut seen, union_members);
        match members.len() {
            0 => Type::void(),
            1 => members.swap_remove(0),
            _ => Type::from_kind(TypeKind::Union(members)),
        }
    }

    /// Build an intersection with the same normalization as [`Type::union`].
    pub fn intersection(types: Vec<Type>) -> Type {
        let mut members = Vec::new();
        let mut seen = FxHashSet::default();
        flatten_into(types, &mut members, &mut seen, intersection_members);
        match members.len() {
            0 => Type::void(),
            1 => members.swap_remove(0),
            _ => Type::from_kind(TypeKind::Intersection(members)),
        }
    }

    pub fn function(function: FunctionType) -> Type {
        Type::from_kind(TypeKind::Function {
            function,
            self_type: None,
        })
    }

    pub fn function_with_self(function: FunctionType, self_type: Option<Type>) -> Type {
        Type::from_kind(TypeKind::Function {
            function,
            self_type,
        })
    }

    pub fn var(var: TypeVar) -> Type {
        Type::from_kind(TypeKind::Var(var))
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    #[inline]
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn is_any(&self) -> bool {
        matches!(*self.kind, TypeKind::Any)
    }

    pub fn is_nil(&self) -> bool {
        matches!(*self.kind, TypeKind::Nil)
    }

    /// Attach a source span. The value identity is unchanged: spans never
    /// participate in comparison or hashing.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Type {
        self.span = Some(span);
        self
    }

    /// The set of type variables occurring free in this type.
    pub fn free_variables(&self) -> FxHashSet<TypeVar> {
        let mut out = FxHashSet::default();
        self.collect_free_variables(&mut out);
        out
    }

    fn collect_free_variables(&self, out: &mut FxHashSet<TypeVar>) {
        if !self.flags.contains(TypeFlags::HAS_VAR) {
            return;
        }
        match self.kind() {
            TypeKind::Var(v) => {
                out.insert(*v);
            }
            TypeKind::Name { args, .. } => {
                for arg in args {
                    arg.collect_free_variables(out);
                }
            }
            TypeKind::Union(ts) | TypeKind::Intersection(ts) => {
                for t in ts {
                    t.collect_free_variables(out);
                }
            }
            TypeKind::Function {
                function,
                self_type,
            } => {
                function.for_each_type(&mut |t| t.collect_free_variables(out));
                if let Some(s) = self_type {
                    s.collect_free_variables(out);
                }
            }
            _ => {}
        }
    }

    /// Replace free variables per the mapping. Subtrees the mapping cannot
    /// affect are shared, not copied.
    #[must_use]
    pub fn subst(&self, s: &Subst) -> Type {
        if s.is_empty() || !self.flags.contains(TypeFlags::HAS_VAR) {
            return self.clone();
        }
        match self.kind() {
            TypeKind::Var(v) => match s.get(v) {
                Some(t) => t.clone(),
                None => self.clone(),
            },
            TypeKind::Name { name, args } => {
                Type::generic(name.clone(), args.iter().map(|a| a.subst(s)).collect())
            }
            TypeKind::Union(ts) => Type::union(ts.iter().map(|t| t.subst(s)).collect()),
            TypeKind::Intersection(ts) => {
                Type::intersection(ts.iter().map(|t| t.subst(s)).collect())
            }
            TypeKind::Function {
                function,
                self_type,
            } => Type::function_with_self(
                function.map_types(&mut |t| t.subst(s)),
                self_type.as_ref().map(|t| t.subst(s)),
            ),
            _ => self.clone(),
        }
    }

    /// Resolve `self`/`instance`/`class` occurrences against the context.
    /// Replacements are installed as-is, never re-resolved, so an identity
    /// context is a no-op.
    #[must_use]
    pub fn with_self_context(&self, ctx: &SelfContext) -> Type {
        if !self.flags.intersects(TypeFlags::HAS_SELF_CONTEXT) {
            return self.clone();
        }
        match self.kind() {
            TypeKind::SelfType => ctx.self_type.clone(),
            TypeKind::Instance => ctx.instance_type.clone(),
            TypeKind::Class => ctx.class_type.clone(),
            TypeKind::Name { name, args } => Type::generic(
                name.clone(),
                args.iter().map(|a| a.with_self_context(ctx)).collect(),
            ),
            TypeKind::Union(ts) => {
                Type::union(ts.iter().map(|t| t.with_self_context(ctx)).collect())
            }
            TypeKind::Intersection(ts) => {
                Type::intersection(ts.iter().map(|t| t.with_self_context(ctx)).collect())
            }
            TypeKind::Function {
                function,
                self_type,
            } => Type::function_with_self(
                function.map_types(&mut |t| t.with_self_context(ctx)),
                self_type.as_ref().map(|t| t.with_self_context(ctx)),
            ),
            _ => self.clone(),
        }
    }
}

fn union_members(kind: &TypeKind) -> Option<&Vec<Type>> {
    match kind {
        TypeKind::Union(ts) => Some(ts),
        _ => None,
    }
}

fn intersection_members(kind: &TypeKind) -> Option<&Vec<Type>> {
    match kind {
        TypeKind::Intersection(ts) => Some(ts),
        _ => None,
    }
}

fn flatten_into(
    types: Vec<Type>,
    members: &mut Vec<Type>,
    seen: &mut FxHashSet<Type>,
    nested: fn(&TypeKind) -> Option<&Vec<Type>>,
) {
    for ty in types {
        if let Some(inner) = nested(ty.kind()) {
            flatten_into(inner.clone(), members, seen, nested);
        } else if seen.insert(ty.clone()) {
            members.push(ty);
        }
    }
}

fn flags_of(kind: &TypeKind) -> TypeFlags {
    match kind {
        TypeKind::Any | TypeKind::Void | TypeKind::Nil | TypeKind::Literal(_) => {
            TypeFlags::empty()
        }
        TypeKind::SelfType => TypeFlags::HAS_SELF,
        TypeKind::Instance => TypeFlags::HAS_INSTANCE,
        TypeKind::Class => TypeFlags::HAS_CLASS,
        TypeKind::Var(_) => TypeFlags::HAS_VAR,
        TypeKind::Name { args, .. } => args
            .iter()
            .fold(TypeFlags::empty(), |acc, t| acc | t.flags()),
        TypeKind::Union(ts) | TypeKind::Intersection(ts) => ts
            .iter()
            .fold(TypeFlags::empty(), |acc, t| acc | t.flags()),
        TypeKind::Function {
            function,
            self_type,
        } => {
            let mut acc = TypeFlags::empty();
            function.for_each_type(&mut |t| acc |= t.flags());
            if let Some(s) = self_type {
                acc |= s.flags();
            }
            acc
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.kind, &other.kind) || self.kind == other.kind
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.kind, f)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Any => f.write_str("untyped"),
            TypeKind::Void => f.write_str("void"),
            TypeKind::Nil => f.write_str("nil"),
            TypeKind::SelfType => f.write_str("self"),
            TypeKind::Instance => f.write_str("instance"),
            TypeKind::Class => f.write_str("class"),
            TypeKind::Literal(v) => write!(f, "{v}"),
            TypeKind::Name { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            TypeKind::Union(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
            TypeKind::Intersection(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
            TypeKind::Function {
                function,
                self_type,
            } => {
                write!(f, "^{}", function.params)?;
                if let Some(block) = &function.block {
                    write!(f, " {block}")?;
                }
                if let Some(s) = self_type {
                    write!(f, " [self: {s}]")?;
                }
                write!(f, " -> {}", function.return_type)
            }
            TypeKind::Var(v) => write!(f, "{v}"),
        }
    }
}

/// A substitution from type variables to types.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: FxHashMap<TypeVar, Type>,
}

impl Subst {
    pub fn new() -> Self {
        Subst::default()
    }

    pub fn insert(&mut self, var: TypeVar, ty: Type) {
        self.map.insert(var, ty);
    }

    pub fn get(&self, var: &TypeVar) -> Option<&Type> {
        self.map.get(var)
    }

    pub fn remove(&mut self, var: &TypeVar) -> Option<Type> {
        self.map.remove(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeVar, &Type)> {
        self.map.iter()
    }
}

impl FromIterator<(TypeVar, Type)> for Subst {
    fn from_iter<T: IntoIterator<Item = (TypeVar, Type)>>(iter: T) -> Self {
        Subst {
            map: iter.into_iter().collect(),
        }
    }
}

/// The self/instance/class type triple a relation is checked under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfContext {
    pub self_type: Type,
    pub instance_type: Type,
    pub class_type: Type,
}

impl SelfContext {
    pub fn new(self_type: Type, instance_type: Type, class_type: Type) -> Self {
        SelfContext {
            self_type,
            instance_type,
            class_type,
        }
    }

    /// Identity context: `self`/`instance`/`class` resolve to themselves.
    pub fn unresolved() -> Self {
        SelfContext::new(Type::self_type(), Type::instance(), Type::class())
    }
}
