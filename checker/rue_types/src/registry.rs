//! Read-only signature registry.
//!
//! The external signature database loader fills one of these per session;
//! the checker only queries it. Nominal entries carry variance-annotated
//! formal type parameters and an ancestor chain whose argument types are
//! expressed over those formals, so walking the chain is a matter of
//! substitution.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use rue_ir::{GvarName, TypeName};

use crate::method_type::MethodType;
use crate::ty::{Subst, Type, TypeVar, VarFactory};

/// Variance of one type-parameter position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

/// A formal type parameter of a nominal type.
#[derive(Clone, Debug)]
pub struct TypeParam {
    pub var: TypeVar,
    pub variance: Variance,
}

impl TypeParam {
    pub fn covariant(var: TypeVar) -> Self {
        TypeParam {
            var,
            variance: Variance::Covariant,
        }
    }

    pub fn contravariant(var: TypeVar) -> Self {
        TypeParam {
            var,
            variance: Variance::Contravariant,
        }
    }

    pub fn invariant(var: TypeVar) -> Self {
        TypeParam {
            var,
            variance: Variance::Invariant,
        }
    }
}

/// One step of an ancestor chain. `args` are expressed over the declaring
/// entry's formal type parameters.
#[derive(Clone, Debug)]
pub struct Ancestor {
    pub name: TypeName,
    pub args: Vec<Type>,
}

impl Ancestor {
    pub fn new(name: impl Into<TypeName>, args: Vec<Type>) -> Self {
        Ancestor {
            name: name.into(),
            args,
        }
    }
}

/// A nominal type declaration.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    /// Direct ancestors only; transitive chains are walked on demand.
    pub ancestors: Vec<Ancestor>,
}

impl TypeEntry {
    pub fn new(name: impl Into<TypeName>) -> Self {
        TypeEntry {
            name: name.into(),
            type_params: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<TypeParam>) -> Self {
        self.type_params = type_params;
        self
    }

    #[must_use]
    pub fn with_ancestor(mut self, ancestor: Ancestor) -> Self {
        self.ancestors.push(ancestor);
        self
    }
}

/// The queries the checker makes against the signature database.
#[derive(Clone, Debug, Default)]
pub struct SignatureRegistry {
    types: FxHashMap<TypeName, TypeEntry>,
    methods: FxHashMap<TypeName, FxHashMap<Rc<str>, MethodType>>,
    constants: FxHashMap<TypeName, Type>,
    globals: FxHashMap<GvarName, Type>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        SignatureRegistry::default()
    }

    /// Registry pre-seeded with the builtin nominal skeleton the engine
    /// relies on (`::Integer`, `::String`, `::Symbol`, containers, ...).
    pub fn core() -> Self {
        let mut registry = SignatureRegistry::new();
        let mut vars = VarFactory::new();

        let object = |name: &str| TypeEntry::new(name).with_ancestor(Ancestor::new("::Object", vec![]));

        registry.insert_type(TypeEntry::new("::BasicObject"));
        registry.insert_type(
            TypeEntry::new("::Object").with_ancestor(Ancestor::new("::BasicObject", vec![])),
        );
        registry.insert_type(object("::Numeric"));
        registry.insert_type(
            TypeEntry::new("::Integer").with_ancestor(Ancestor::new("::Numeric", vec![])),
        );
        registry.insert_type(
            TypeEntry::new("::Float").with_ancestor(Ancestor::new("::Numeric", vec![])),
        );
        registry.insert_type(object("::String"));
        registry.insert_type(object("::Symbol"));
        registry.insert_type(object("::Regexp"));
        registry.insert_type(object("::Proc"));
        registry.insert_type(object("::NilClass"));

        let elem = vars.fresh();
        registry.insert_type(
            TypeEntry::new("::Array")
                .with_type_params(vec![TypeParam::covariant(elem)])
                .with_ancestor(Ancestor::new("::Object", vec![])),
        );

        let key = vars.fresh();
        let value = vars.fresh();
        registry.insert_type(
            TypeEntry::new("::Hash")
                .with_type_params(vec![TypeParam::covariant(key), TypeParam::covariant(value)])
                .with_ancestor(Ancestor::new("::Object", vec![])),
        );

        registry
    }

    pub fn insert_type(&mut self, entry: TypeEntry) {
        self.types.insert(entry.name.clone(), entry);
    }

    pub fn insert_method(
        &mut self,
        receiver: impl Into<TypeName>,
        method: impl Into<Rc<str>>,
        method_type: MethodType,
    ) {
        self.methods
            .entry(receiver.into())
            .or_default()
            .insert(method.into(), method_type);
    }

    pub fn insert_constant(&mut self, name: impl Into<TypeName>, ty: Type) {
        self.constants.insert(name.into(), ty);
    }

    pub fn insert_global(&mut self, name: impl Into<GvarName>, ty: Type) {
        self.globals.insert(name.into(), ty);
    }

    pub fn type_entry(&self, name: &TypeName) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    pub fn method_type(&self, receiver: &TypeName, method: &str) -> Option<&MethodType> {
        self.methods.get(receiver)?.get(method)
    }

    pub fn constant_type(&self, name: &TypeName) -> Option<&Type> {
        self.constants.get(name)
    }

    pub fn global_type(&self, name: &GvarName) -> Option<&Type> {
        self.globals.get(name)
    }

    /// All declared global-variable signatures.
    pub fn globals(&self) -> impl Iterator<Item = (&GvarName, &Type)> {
        self.globals.iter()
    }

    /// Instantiated type arguments that `name[args]` passes to `target`
    /// somewhere along its ancestor chain, or `None` when `target` is not
    /// an ancestor. `name == target` answers with `args` itself.
    pub fn ancestor_args(
        &self,
        name: &TypeName,
        args: &[Type],
        target: &TypeName,
    ) -> Option<Vec<Type>> {
        let mut visited = FxHashSet::default();
        self.ancestor_args_inner(name, args, target, &mut visited)
    }

    fn ancestor_args_inner(
        &self,
        name: &TypeName,
        args: &[Type],
        target: &TypeName,
        visited: &mut FxHashSet<TypeName>,
    ) -> Option<Vec<Type>> {
        if name == target {
            return Some(args.to_vec());
        }
        if !visited.insert(name.clone()) {
            return None;
        }
        let entry = self.types.get(name)?;
        let s: Subst = entry
            .type_params
            .iter()
            .zip(args.iter())
            .map(|(p, a)| (p.var, a.clone()))
            .collect();
        for ancestor in &entry.ancestors {
            let anc_args: Vec<Type> = ancestor.args.iter().map(|t| t.subst(&s)).collect();
            if let Some(found) =
                self.ancestor_args_inner(&ancestor.name, &anc_args, target, visited)
            {
                return Some(found);
            }
        }
        None
    }
}
