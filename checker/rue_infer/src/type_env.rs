//! The layered type environment.
//!
//! Tracks the declared types of instance variables, global variables, and
//! constants. Environments are persistent: every mutator derives a new
//! environment layered over the receiver through an `Rc` parent chain, so
//! snapshots taken earlier stay valid however the walk proceeds. This is
//! what lets the typing store keep one environment per speculative layer.
//!
//! Mismatches are advisory, never blocking: `assign` always hands back the
//! declared (widened) type, and `with_annotations` installs a narrowing
//! even when it conflicts with the declaration. The caller decides what to
//! surface.


use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use rue_ir::{GvarName, IvarName, TypeName};
use rue_types::{Failure, Relation, SelfContext, SignatureRegistry, SubtypeChecker, Type};

use crate::const_env::ConstantEnv;

/// A key into the environment's three key spaces.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum EnvKey {
    Ivar(IvarName),
    Gvar(GvarName),
    Const(TypeName),
}

impl EnvKey {
    pub fn ivar(name: impl Into<Rc<str>>) -> Self {
        EnvKey::Ivar(IvarName::new(name))
    }

    pub fn gvar(name: impl Into<Rc<str>>) -> Self {
        EnvKey::Gvar(GvarName::new(name))
    }

    pub fn constant(name: impl Into<TypeName>) -> Self {
        EnvKey::Const(name.into())
    }
}

impl fmt::Display for EnvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvKey::Ivar(n) => write!(f, "{n}"),
            EnvKey::Gvar(n) => write!(f, "{n}"),
            EnvKey::Const(n) => write!(f, "{n}"),
        }
    }
}

/// Outcome of [`TypeEnv::get`].
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    Declared(Type),
    /// No declaration: the key is treated as `untyped`. This is the
    /// designed gradual fallback, not an error.
    Unknown,
}

impl Lookup {
    pub fn is_declared(&self) -> bool {
        matches!(self, Lookup::Declared(_))
    }

    /// The usable type: the declared one, or `untyped`.
    pub fn into_type(self) -> Type {
        match self {
            Lookup::Declared(ty) => ty,
            Lookup::Unknown => Type::any(),
        }
    }
}

/// Outcome of [`TypeEnv::assign`]. The carried type is always usable;
/// checking continues with it whatever the compatibility verdict was.
#[derive(Clone, Debug, PartialEq)]
pub enum Assign {
    /// No declaration exists; the assignment is `untyped`.
    Unknown { ty: Type },
    /// The incoming type is compatible; `ty` is the declared (widened) type.
    Ok { ty: Type },
    /// The incoming type is incompatible; `ty` is still the declared type,
    /// and the failure chain is for the caller to report or ignore.
    Mismatch { ty: Type, failure: Failure },
}

impl Assign {
    pub fn ty(&self) -> &Type {
        match self {
            Assign::Unknown { ty } | Assign::Ok { ty } | Assign::Mismatch { ty, .. } => ty,
        }
    }

    pub fn into_type(self) -> Type {
        match self {
            Assign::Unknown { ty } | Assign::Ok { ty } | Assign::Mismatch { ty, .. } => ty,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Assign::Mismatch { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Explicit annotations collected from the source.
#[derive(Clone, Debug, Default)]
pub struct Annotations {
    pub ivar_types: Vec<(IvarName, Type)>,
    pub gvar_types: Vec<(GvarName, Type)>,
    pub const_types: Vec<(TypeName, Type)>,
}

impl Annotations {
    pub fn new() -> Self {
        Annotations::default()
    }

    #[must_use]
    pub fn ivar(mut self, name: impl Into<Rc<str>>, ty: Type) -> Self {
        self.ivar_types.push((IvarName::new(name), ty));
        self
    }

    #[must_use]
    pub fn gvar(mut self, name: impl Into<Rc<str>>, ty: Type) -> Self {
        self.gvar_types.push((GvarName::new(name), ty));
        self
    }

    #[must_use]
    pub fn constant(mut self, name: impl Into<TypeName>, ty: Type) -> Self {
        self.const_types.push((name.into(), ty));
        self
    }
}

/// A narrowing annotation that contradicts the declared type. Advisory:
/// the narrowing was installed anyway.
#[derive(Clone, Debug)]
pub struct AnnotationConflict {
    pub key: EnvKey,
    pub failure: Failure,
}

#[derive(Debug)]
struct TypeEnvInner {
    ivars: FxHashMap<IvarName, Type>,
    gvars: FxHashMap<GvarName, Type>,
    consts: FxHashMap<TypeName, Type>,
    parent: Option<TypeEnv>,
    const_env: Rc<ConstantEnv>,
}

impl TypeEnvInner {
    fn root(const_env: Rc<ConstantEnv>) -> Self {
        TypeEnvInner {
            ivars: FxHashMap::default(),
            gvars: FxHashMap::default(),
            consts: FxHashMap::default(),
            parent: None,
            const_env,
        }
    }

    fn child_of(env: &TypeEnv) -> Self {
        TypeEnvInner {
            ivars: FxHashMap::default(),
            gvars: FxHashMap::default(),
            consts: FxHashMap::default(),
            parent: Some(env.clone()),
            const_env: env.0.const_env.clone(),
        }
    }
}

/// The persistent environment. Cloning is O(1); derivation never touches
/// the receiver.
#[derive(Clone, Debug)]
pub struct TypeEnv(Rc<TypeEnvInner>);

impl TypeEnv {
    pub fn new(const_env: Rc<ConstantEnv>) -> Self {
        TypeEnv(Rc::new(TypeEnvInner::root(const_env)))
    }

    /// Seed an environment: explicit annotations install verbatim, and
    /// global variables declared in the signature database obtain their
    /// declared types. Constants resolve lazily through the constant
    /// resolver on first query.
    pub fn build(
        annotations: &Annotations,
        registry: &SignatureRegistry,
        const_env: Rc<ConstantEnv>,
    ) -> TypeEnv {
        let mut root = TypeEnvInner::root(const_env);
        for (name, ty) in registry.globals() {
            root.gvars.insert(name.clone(), ty.clone());
        }
        for (name, ty) in &annotations.ivar_types {
            root.ivars.insert(name.clone(), ty.clone());
        }
        for (name, ty) in &annotations.gvar_types {
            root.gvars.insert(name.clone(), ty.clone());
        }
        for (name, ty) in &annotations.const_types {
            root.consts.insert(name.clone(), ty.clone());
        }
        TypeEnv(Rc::new(root))
    }

    pub fn const_env(&self) -> &ConstantEnv {
        &self.0.const_env
    }

    /// The declared type for a key, walking the layer chain; constants
    /// additionally fall back to the constant resolver.
    fn declared(&self, key: &EnvKey) -> Option<Type> {
        let mut env = self;
        loop {
            let found = match key {
                EnvKey::Ivar(n) => env.0.ivars.get(n),
                EnvKey::Gvar(n) => env.0.gvars.get(n),
                EnvKey::Const(n) => env.0.consts.get(n),
            };
            if let Some(ty) = found {
                return Some(ty.clone());
            }
            match &env.0.parent {
                Some(parent) => env = parent,
                None => break,
            }
        }
        match key {
            EnvKey::Const(name) => self.0.const_env.resolve(name),
            _ => None,
        }
    }

    /// Look up the declared type. An unset key is [`Lookup::Unknown`],
    /// which reads as `untyped`.
    pub fn get(&self, key: &EnvKey) -> Lookup {
        match self.declared(key) {
            Some(ty) => Lookup::Declared(ty),
            None => Lookup::Unknown,
        }
    }

    /// Replace the declared type unconditionally in a derived environment.
    #[must_use]
    pub fn set(&self, key: EnvKey, ty: Type) -> TypeEnv {
        let mut child = TypeEnvInner::child_of(self);
        match key {
            EnvKey::Ivar(n) => {
                child.ivars.insert(n, ty);
            }
            EnvKey::Gvar(n) => {
                child.gvars.insert(n, ty);
            }
            EnvKey::Const(n) => {
                child.consts.insert(n, ty);
            }
        }
        TypeEnv(Rc::new(child))
    }

    /// Record an assignment. With no declaration the result is `untyped`
    /// and nothing is checked. With one, the incoming type is checked
    /// against it and the declared type is returned either way (widening):
    /// an incompatible assignment reports through the outcome but never
    /// blocks the walk.
    pub fn assign(
        &self,
        key: &EnvKey,
        incoming: &Type,
        ctx: &SelfContext,
        checker: &SubtypeChecker<'_>,
    ) -> Assign {
        let Some(declared) = self.declared(key) else {
            return Assign::Unknown { ty: Type::any() };
        };
        match checker.check(&Relation::new(incoming.clone(), declared.clone()), ctx) {
            Ok(_) => Assign::Ok { ty: declared },
            Err(failure) => {
                tracing::debug!(key = %key, %failure, "incompatible assignment widened");
                Assign::Mismatch {
                    ty: declared,
                    failure,
                }
            }
        }
    }

    /// Layer narrowing annotations over this environment. Every override
    /// installs; an override incompatible with its declaration is reported
    /// in the conflict list, purely advisorily.
    #[must_use]
    pub fn with_annotations(
        &self,
        annotations: &Annotations,
        ctx: &SelfContext,
        checker: &SubtypeChecker<'_>,
    ) -> (TypeEnv, Vec<AnnotationConflict>) {
        let mut conflicts = Vec::new();
        let mut child = TypeEnvInner::child_of(self);

        for (name, ty) in &annotations.ivar_types {
            let key = EnvKey::Ivar(name.clone());
            self.note_conflict(&key, ty, ctx, checker, &mut conflicts);
            child.ivars.insert(name.clone(), ty.clone());
        }
        for (name, ty) in &annotations.gvar_types {
            let key = EnvKey::Gvar(name.clone());
            self.note_conflict(&key, ty, ctx, checker, &mut conflicts);
            child.gvars.insert(name.clone(), ty.clone());
        }
        for (name, ty) in &annotations.const_types {
            let key = EnvKey::Const(name.clone());
            self.note_conflict(&key, ty, ctx, checker, &mut conflicts);
            child.consts.insert(name.clone(), ty.clone());
        }

        (TypeEnv(Rc::new(child)), conflicts)
    }

    fn note_conflict(
        &self,
        key: &EnvKey,
        override_ty: &Type,
        ctx: &SelfContext,
        checker: &SubtypeChecker<'_>,
        conflicts: &mut Vec<AnnotationConflict>,
    ) {
        let Some(declared) = self.declared(key) else {
            return;
        };
        if let Err(failure) = checker.check(&Relation::new(override_ty.clone(), declared), ctx) {
            tracing::debug!(key = %key, %failure, "narrowing conflicts with declaration");
            conflicts.push(AnnotationConflict {
                key: key.clone(),
                failure,
            });
        }
    }
}
