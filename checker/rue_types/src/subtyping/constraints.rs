//! Constraint sets over free type variables.
//!
//! A relation involving a free variable is never decided on the spot: the
//! pairwise relation is recorded as a bound and the whole set is solved
//! once the walk finishes. Solving fails exactly when some lower bound is
//! not a subtype of some upper bound for the same variable.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::subtyping::{Failure, Relation, SubtypeChecker};
use crate::ty::{Subst, Type, TypeVar};

/// Bounds recorded for one variable: `lower <: var <: upper`.
#[derive(Clone, Debug, Default)]
pub struct Bounds {
    pub lower: SmallVec<[Type; 2]>,
    pub upper: SmallVec<[Type; 2]>,
}

/// All bounds accumulated during one check.
#[derive(Clone, Debug, Default)]
pub struct Constraints {
    bounds: FxHashMap<TypeVar, Bounds>,
    order: Vec<TypeVar>,
}

impl Constraints {
    pub fn new() -> Self {
        Constraints::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    fn entry(&mut self, var: TypeVar) -> &mut Bounds {
        if !self.bounds.contains_key(&var) {
            self.order.push(var);
        }
        self.bounds.entry(var).or_default()
    }

    pub fn add_lower(&mut self, var: TypeVar, ty: Type) {
        self.entry(var).lower.push(ty);
    }

    pub fn add_upper(&mut self, var: TypeVar, ty: Type) {
        self.entry(var).upper.push(ty);
    }

    pub fn bounds(&self, var: &TypeVar) -> Option<&Bounds> {
        self.bounds.get(var)
    }

    pub fn vars(&self) -> impl Iterator<Item = &TypeVar> {
        self.order.iter()
    }

    /// Solve the set: verify every lower/upper pair is consistent and pick
    /// a witness per variable (union of lower bounds when any, else the
    /// upper-bound intersection, else `untyped`).
    pub(crate) fn solve(&self, checker: &SubtypeChecker<'_>) -> Result<Subst, Failure> {
        let mut subst = Subst::new();
        for var in &self.order {
            let Some(bounds) = self.bounds.get(var) else {
                continue;
            };
            for lower in &bounds.lower {
                for upper in &bounds.upper {
                    checker.check_closed(&Relation::new(lower.clone(), upper.clone()))?;
                }
            }
            let ty = if !bounds.lower.is_empty() {
                Type::union(bounds.lower.to_vec())
            } else if !bounds.upper.is_empty() {
                Type::intersection(bounds.upper.to_vec())
            } else {
                Type::any()
            };
            tracing::trace!(var = %var, solution = %ty, "solved constraint variable");
            subst.insert(*var, ty);
        }
        Ok(subst)
    }
}
