//! Type system for the rue checker.
//!
//! This crate owns the algebraic type representation, declared method-type
//! signatures, the read-only signature registry boundary, and the
//! constraint-based subtyping checker. Everything here is an immutable
//! value: types are `Rc`-backed, every operation derives a new value, and
//! sharing needs no synchronization.
//!
//! # Main entry points
//!
//! - [`Type`] / [`TypeKind`]: the type algebra
//! - [`MethodType`] / [`Params`]: declared signatures
//! - [`SignatureRegistry`]: the signature database boundary
//! - [`SubtypeChecker`]: decides `A <: B`, yielding a relation chain on
//!   failure and a constraint solution on success

mod flags;
mod method_type;
mod registry;
mod stack;
mod subtyping;
mod ty;

pub use flags::TypeFlags;
pub use method_type::{BlockType, FunctionType, MethodType, Params, ParamsShape};
pub use registry::{Ancestor, SignatureRegistry, TypeEntry, TypeParam, Variance};
pub use stack::ensure_sufficient_stack;
pub use subtyping::{Bounds, Constraints, Failure, Relation, SubtypeChecker};
pub use ty::{LiteralValue, SelfContext, Subst, Type, TypeKind, TypeVar, VarFactory};

// Size assertion: Type is stored per AST node in the typing store.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    const _: () = assert!(std::mem::size_of::<super::Type>() <= 32);
}
