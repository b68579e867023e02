//! The subtyping relation checker.
//!
//! Decides `A <: B` under a self/instance/class context, by case on `B`
//! then `A`. Free variables on either side become constraints instead of
//! immediate answers; a visited-relation set treats a pair revisited while
//! still pending as holding, which keeps recursive nominal hierarchies
//! terminating.
//!
//! The primary output on failure is not a boolean but the relation chain:
//! the sequence of sub-relations attempted down to the first that failed,
//! carried verbatim into diagnostics.

mod constraints;

pub use constraints::{Bounds, Constraints};

use std::fmt;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::method_type::FunctionType;
use crate::registry::{SignatureRegistry, Variance};
use crate::stack::ensure_sufficient_stack;
use crate::ty::{SelfContext, Subst, Type, TypeKind};

/// One asserted relation `sub_type <: super_type`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Relation {
    pub sub_type: Type,
    pub super_type: Type,
}

impl Relation {
    pub fn new(sub_type: Type, super_type: Type) -> Self {
        Relation {
            sub_type,
            super_type,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <: {}", self.sub_type, self.super_type)
    }
}

/// A disproved relation: the chain of sub-relations attempted, outermost
/// first. The final entry is the relation that failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub chain: Vec<Relation>,
}

impl Failure {
    /// The innermost relation, the one that could not be established.
    pub fn failed(&self) -> Option<&Relation> {
        self.chain.last()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rel) in self.chain.iter().enumerate() {
            if i > 0 {
                f.write_str(" <== ")?;
            }
            write!(f, "{rel}")?;
        }
        Ok(())
    }
}

struct CheckState {
    /// Relations currently being established; a revisit holds coinductively.
    assumptions: FxHashSet<Relation>,
    /// Relations entered and not yet proven, outermost first.
    trail: SmallVec<[Relation; 4]>,
    constraints: Constraints,
    /// Set while validating solved bounds: remaining variables are free
    /// by construction and accepted as-is.
    solving: bool,
}

impl CheckState {
    fn new(solving: bool) -> Self {
        CheckState {
            assumptions: FxHashSet::default(),
            trail: SmallVec::new(),
            constraints: Constraints::new(),
            solving,
        }
    }
}

/// Decides subtyping relations against one signature registry.
pub struct SubtypeChecker<'a> {
    registry: &'a SignatureRegistry,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(registry: &'a SignatureRegistry) -> Self {
        SubtypeChecker { registry }
    }

    pub fn registry(&self) -> &SignatureRegistry {
        self.registry
    }

    /// Check `relation` under `ctx`, resolving `self`/`instance`/`class`
    /// up front. On success the substitution solving any recorded variable
    /// constraints is returned (empty when no variables were involved).
    #[tracing::instrument(level = "trace", skip_all, fields(relation = %relation))]
    pub fn check(&self, relation: &Relation, ctx: &SelfContext) -> Result<Subst, Failure> {
        let relation = Relation::new(
            relation.sub_type.with_self_context(ctx),
            relation.super_type.with_self_context(ctx),
        );
        let mut state = CheckState::new(false);
        self.check_rel(&mut state, &relation)?;
        let subst = state.constraints.solve(self)?;
        Ok(subst)
    }

    /// Convenience: does the relation hold at all.
    pub fn holds(&self, relation: &Relation, ctx: &SelfContext) -> bool {
        self.check(relation, ctx).is_ok()
    }

    /// Check a relation whose variables are already accounted for
    /// (used when validating solved constraint bounds).
    pub(crate) fn check_closed(&self, relation: &Relation) -> Result<(), Failure> {
        let mut state = CheckState::new(true);
        self.check_rel(&mut state, relation)
    }

    fn check_rel(&self, state: &mut CheckState, rel: &Relation) -> Result<(), Failure> {
        ensure_sufficient_stack(|| self.check_rel_inner(state, rel))
    }

    fn check_rel_inner(&self, state: &mut CheckState, rel: &Relation) -> Result<(), Failure> {
        if rel.sub_type == rel.super_type {
            return Ok(());
        }
        if state.assumptions.contains(rel) {
            tracing::trace!(relation = %rel, "pending relation revisited, assumed to hold");
            return Ok(());
        }
        state.trail.push(rel.clone());
        state.assumptions.insert(rel.clone());
        let result = self.dispatch(state, rel);
        state.assumptions.remove(rel);
        if result.is_ok() {
            state.trail.pop();
        }
        result
    }

    fn dispatch(&self, state: &mut CheckState, rel: &Relation) -> Result<(), Failure> {
        use TypeKind as K;
        let sub = &rel.sub_type;
        let sup = &rel.super_type;
        match (sub.kind(), sup.kind()) {
            // The dynamic type is compatible in both directions.
            (K::Any, _) | (_, K::Any) => Ok(()),
            // A value whose result nobody looks at.
            (_, K::Void) => Ok(()),
            (K::Var(v), _) => {
                if !state.solving {
                    state.constraints.add_upper(*v, sup.clone());
                }
                Ok(())
            }
            (_, K::Var(v)) => {
                if !state.solving {
                    state.constraints.add_lower(*v, sub.clone());
                }
                Ok(())
            }
            (_, K::Union(members)) => {
                for member in members {
                    if self
                        .try_branch(state, &Relation::new(sub.clone(), member.clone()))
                        .is_ok()
                    {
                        return Ok(());
                    }
                }
                // No single member admits `sub`; a union still passes when
                // each of its members does individually.
                if let K::Union(sub_members) = sub.kind() {
                    for m in sub_members {
                        self.check_rel(state, &Relation::new(m.clone(), sup.clone()))?;
                    }
                    return Ok(());
                }
                Err(self.failure(state))
            }
            (K::Union(members), _) => {
                for m in members {
                    self.check_rel(state, &Relation::new(m.clone(), sup.clone()))?;
                }
                Ok(())
            }
            (_, K::Intersection(members)) => {
                for m in members {
                    self.check_rel(state, &Relation::new(sub.clone(), m.clone()))?;
                }
                Ok(())
            }
            (K::Intersection(members), _) => {
                for m in members {
                    if self
                        .try_branch(state, &Relation::new(m.clone(), sup.clone()))
                        .is_ok()
                    {
                        return Ok(());
                    }
                }
                Err(self.failure(state))
            }
            (
                K::Function { function: f1, .. },
                K::Function { function: f2, .. },
            ) => self.check_function(state, f1, f2),
            (K::Name { name: n1, args: a1 }, K::Name { name: n2, args: a2 }) => {
                self.check_nominal(state, n1, a1, n2, a2)
            }
            // A literal is a subtype of its backing type and anything above.
            (K::Literal(lit), _) => {
                self.check_rel(state, &Relation::new(lit.back_type(), sup.clone()))
            }
            _ => Err(self.failure(state)),
        }
    }

    /// `A <: B` for functions: every call valid for `B` must be valid for
    /// `A`. Parameters check contravariantly, the return type covariantly.
    fn check_function(
        &self,
        state: &mut CheckState,
        f1: &FunctionType,
        f2: &FunctionType,
    ) -> Result<(), Failure> {
        let p1 = &f1.params;
        let p2 = &f2.params;

        if p1.min_positional() > p2.min_positional() {
            return Err(self.failure(state));
        }
        match (p1.max_positional(), p2.max_positional()) {
            (Some(_), None) => return Err(self.failure(state)),
            (Some(a_max), Some(b_max)) if a_max < b_max => return Err(self.failure(state)),
            _ => {}
        }

        let b_positions = p2.required.len() + p2.optional.len();
        for idx in 0..b_positions {
            match (p2.positional(idx), p1.positional(idx)) {
                (Some(b_ty), Some(a_ty)) => {
                    self.check_rel(state, &Relation::new(b_ty.clone(), a_ty.clone()))?;
                }
                _ => return Err(self.failure(state)),
            }
        }
        if let Some(b_rest) = &p2.rest {
            let Some(a_rest) = &p1.rest else {
                return Err(self.failure(state));
            };
            self.check_rel(state, &Relation::new(b_rest.clone(), a_rest.clone()))?;
        }

        for (name, b_ty) in p2.required_keywords.iter().chain(&p2.optional_keywords) {
            if let Some((a_ty, _)) = p1.keyword(name) {
                self.check_rel(state, &Relation::new(b_ty.clone(), a_ty.clone()))?;
            } else if let Some(a_rest) = &p1.rest_keywords {
                self.check_rel(state, &Relation::new(b_ty.clone(), a_rest.clone()))?;
            } else {
                return Err(self.failure(state));
            }
        }
        if let Some(b_rest) = &p2.rest_keywords {
            let Some(a_rest) = &p1.rest_keywords else {
                return Err(self.failure(state));
            };
            self.check_rel(state, &Relation::new(b_rest.clone(), a_rest.clone()))?;
        }
        // A keyword A insists on must be guaranteed by B.
        for (name, _) in &p1.required_keywords {
            match p2.keyword(name) {
                Some((_, true)) => {}
                _ => return Err(self.failure(state)),
            }
        }

        // A block A insists on must be guaranteed by B; block bodies are
        // arguments, so they check contravariantly as functions.
        if let Some(a_block) = &f1.block {
            if a_block.required && !f2.block.as_ref().is_some_and(|b| b.required) {
                return Err(self.failure(state));
            }
        }
        if let (Some(a_block), Some(b_block)) = (&f1.block, &f2.block) {
            self.check_rel(
                state,
                &Relation::new(
                    Type::function(b_block.function.clone()),
                    Type::function(a_block.function.clone()),
                ),
            )?;
        }

        self.check_rel(
            state,
            &Relation::new(f1.return_type.clone(), f2.return_type.clone()),
        )
    }

    /// Nominal subtyping through the registry's ancestor chain, with each
    /// argument position checked under its declared variance.
    fn check_nominal(
        &self,
        state: &mut CheckState,
        n1: &rue_ir::TypeName,
        a1: &[Type],
        n2: &rue_ir::TypeName,
        a2: &[Type],
    ) -> Result<(), Failure> {
        let Some(args) = self.registry.ancestor_args(n1, a1, n2) else {
            return Err(self.failure(state));
        };
        if args.len() != a2.len() {
            return Err(self.failure(state));
        }
        let entry = self.registry.type_entry(n2);
        for (idx, (actual, declared)) in args.iter().zip(a2.iter()).enumerate() {
            let variance = entry
                .and_then(|e| e.type_params.get(idx))
                .map_or(Variance::Invariant, |p| p.variance);
            match variance {
                Variance::Covariant => {
                    self.check_rel(state, &Relation::new(actual.clone(), declared.clone()))?;
                }
                Variance::Contravariant => {
                    self.check_rel(state, &Relation::new(declared.clone(), actual.clone()))?;
                }
                Variance::Invariant => {
                    self.check_rel(state, &Relation::new(actual.clone(), declared.clone()))?;
                    self.check_rel(state, &Relation::new(declared.clone(), actual.clone()))?;
                }
            }
        }
        Ok(())
    }

    /// Attempt a relation that is allowed to fail: on failure the trail,
    /// assumptions, and constraints are rolled back so the next branch
    /// starts clean.
    fn try_branch(&self, state: &mut CheckState, rel: &Relation) -> Result<(), Failure> {
        let trail_len = state.trail.len();
        let saved_assumptions = state.assumptions.clone();
        let saved_constraints = state.constraints.clone();
        match self.check_rel(state, rel) {
            Ok(()) => Ok(()),
            Err(failure) => {
                state.trail.truncate(trail_len);
                state.assumptions = saved_assumptions;
                state.constraints = saved_constraints;
                Err(failure)
            }
        }
    }

    fn failure(&self, state: &CheckState) -> Failure {
        Failure {
            chain: state.trail.iter().cloned().collect(),
        }
    }
}
