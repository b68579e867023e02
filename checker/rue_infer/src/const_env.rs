//! Constant resolution.
//!
//! Resolves qualified names to their declared types through the signature
//! registry, trying the namespace context innermost first and falling back
//! to the root namespace. Results are memoized per environment: a checking
//! session resolves the same constants over and over.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use rue_ir::TypeName;
use rue_types::{SignatureRegistry, Type};

/// Read-only resolver from qualified names to declared constant types.
#[derive(Debug)]
pub struct ConstantEnv {
    registry: Rc<SignatureRegistry>,
    /// Namespace context, innermost first (`"::Foo::Bar"`, `"::Foo"`).
    /// The root namespace is always tried last.
    context: Vec<Rc<str>>,
    cache: RefCell<FxHashMap<TypeName, Option<Type>>>,
}

impl ConstantEnv {
    pub fn new(registry: Rc<SignatureRegistry>, context: Vec<Rc<str>>) -> Self {
        ConstantEnv {
            registry,
            context,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Resolver with no namespace context: relative names resolve against
    /// the root namespace only.
    pub fn root(registry: Rc<SignatureRegistry>) -> Self {
        ConstantEnv::new(registry, Vec::new())
    }

    pub fn registry(&self) -> &SignatureRegistry {
        &self.registry
    }

    /// Resolve a constant name to its declared type. `None` is not an
    /// error: callers treat an unresolved constant as `untyped` and may
    /// report it advisorily.
    pub fn resolve(&self, name: &TypeName) -> Option<Type> {
        if let Some(hit) = self.cache.borrow().get(name) {
            return hit.clone();
        }
        let resolved = self.resolve_uncached(name);
        self.cache
            .borrow_mut()
            .insert(name.clone(), resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, name: &TypeName) -> Option<Type> {
        if name.is_absolute() {
            return self.registry.constant_type(name).cloned();
        }
        for namespace in &self.context {
            let qualified = name.qualified_in(namespace);
            if let Some(ty) = self.registry.constant_type(&qualified) {
                return Some(ty.clone());
            }
        }
        self.registry.constant_type(&name.qualified_in("")).cloned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn registry() -> Rc<SignatureRegistry> {
        let mut registry = SignatureRegistry::core();
        registry.insert_constant("::VERSION", Type::nominal("::String"));
        registry.insert_constant("::App::VERSION", Type::nominal("::Integer"));
        Rc::new(registry)
    }

    #[test]
    fn test_absolute_resolution() {
        let env = ConstantEnv::root(registry());
        assert_eq!(
            env.resolve(&TypeName::new("::VERSION")),
            Some(Type::nominal("::String"))
        );
        assert_eq!(env.resolve(&TypeName::new("::MISSING")), None);
    }

    #[test]
    fn test_context_order_innermost_first() {
        let env = ConstantEnv::new(registry(), vec!["::App".into()]);
        assert_eq!(
            env.resolve(&TypeName::new("VERSION")),
            Some(Type::nominal("::Integer"))
        );

        // Without the namespace the root declaration wins.
        let env = ConstantEnv::root(registry());
        assert_eq!(
            env.resolve(&TypeName::new("VERSION")),
            Some(Type::nominal("::String"))
        );
    }

    #[test]
    fn test_memoization() {
        let env = ConstantEnv::root(registry());
        assert_eq!(env.resolve(&TypeName::new("::MISSING")), None);
        // A second query must answer from the cache, including negatives.
        assert!(env.cache.borrow().contains_key(&TypeName::new("::MISSING")));
    }
}
