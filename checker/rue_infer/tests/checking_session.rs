//! One simulated checking session: the walker-facing APIs working
//! together against a small signature registry.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use rue_infer::{
    Annotations, Assign, ConstantEnv, Context, EnvKey, Lookup, MethodParams, ParamSlot, TypeEnv,
    Typing, TypingError,
};
use rue_ir::{NodeId, Param, ParamList, Span, TypeName};
use rue_types::{
    FunctionType, LiteralValue, MethodType, Params, Relation, SelfContext, SignatureRegistry,
    SubtypeChecker, Type,
};

fn registry() -> Rc<SignatureRegistry> {
    let mut registry = SignatureRegistry::core();
    registry.insert_method(
        "::Counter",
        "increment",
        MethodType::new(
            Params {
                required: vec![Type::nominal("::Integer")],
                ..Params::default()
            },
            None,
            Type::nominal("::Integer"),
        ),
    );
    registry.insert_constant("::Counter::LIMIT", Type::nominal("::Integer"));
    registry.insert_global("$counters", Type::generic(
        "::Array",
        vec![Type::nominal("::Integer")],
    ));
    Rc::new(registry)
}

fn session(registry: &Rc<SignatureRegistry>) -> (Typing, Context) {
    let const_env = Rc::new(ConstantEnv::new(
        registry.clone(),
        vec!["::Counter".into()],
    ));
    let annotations = Annotations::new().ivar("@total", Type::nominal("::Integer"));
    let type_env = TypeEnv::build(&annotations, registry, const_env);
    let context = Context::new(
        SelfContext::new(
            Type::nominal("::Counter"),
            Type::nominal("::Counter"),
            Type::nominal("::Object"),
        ),
        type_env,
    );
    let typing = Typing::new(context.clone());
    (typing, context)
}

#[test]
fn assignments_widen_and_never_block() {
    let registry = registry();
    let checker = SubtypeChecker::new(&registry);
    let (_, context) = session(&registry);
    let env = &context.type_env;

    // Compatible assignment to the annotated ivar.
    let outcome = env.assign(
        &EnvKey::ivar("@total"),
        &Type::literal(LiteralValue::Int(1)),
        &context.self_context,
        &checker,
    );
    assert_eq!(
        outcome,
        Assign::Ok {
            ty: Type::nominal("::Integer")
        }
    );

    // Incompatible assignment still yields the declared type; the
    // relation chain is there for a diagnostic if the walker wants one.
    let outcome = env.assign(
        &EnvKey::ivar("@total"),
        &Type::nominal("::String"),
        &context.self_context,
        &checker,
    );
    assert_eq!(outcome.ty(), &Type::nominal("::Integer"));
    let failure = outcome.failure().cloned();
    assert!(failure.is_some_and(|f| !f.chain.is_empty()));

    // Globals declared in signatures are visible without annotations,
    // and constants resolve through the namespace context.
    assert!(env.get(&EnvKey::gvar("$counters")).is_declared());
    assert_eq!(
        env.get(&EnvKey::constant("LIMIT")),
        Lookup::Declared(Type::nominal("::Integer"))
    );
}

#[test]
fn method_definition_matches_its_signature() {
    let registry = registry();
    let method_type = registry
        .method_type(&TypeName::new("::Counter"), "increment")
        .cloned();
    let method_type = match method_type {
        Some(mt) => mt,
        None => panic!("signature registered above"),
    };

    let params = MethodParams::build(
        NodeId::new(10),
        Span::new(0, 24),
        &ParamList::new(vec![Param::required("by", NodeId::new(11), Span::new(14, 16))]),
        &method_type,
    );
    assert_eq!(params.len(), 1);
    assert!(params.diagnostics().is_empty());
    match params.get("by") {
        Some(slot @ ParamSlot::Positional(_)) => {
            assert_eq!(slot.var_type(), Type::nominal("::Integer"));
        }
        other => panic!("unexpected slot {other:?}"),
    }
}

#[test]
fn speculative_branches_commit_or_vanish() {
    let registry = registry();
    let checker = SubtypeChecker::new(&registry);
    let (mut typing, context) = session(&registry);
    let root = typing.root();

    let call_node = NodeId::new(1);
    let arm_node = NodeId::new(2);

    typing
        .add_typing(root, call_node, Type::nominal("::Integer"))
        .ok();

    // First attempt: an arm typed under a narrowed environment, abandoned.
    let (narrowed_env, conflicts) = context.type_env.with_annotations(
        &Annotations::new().ivar("@total", Type::literal(LiteralValue::Int(0))),
        &context.self_context,
        &checker,
    );
    assert!(conflicts.is_empty());
    let attempt = typing.new_child_with_context(
        root,
        Context::new(context.self_context.clone(), narrowed_env),
    );
    typing
        .add_typing(attempt, arm_node, Type::nominal("::String"))
        .ok();

    // The attempt is simply never saved: nothing reaches the root.
    assert_eq!(
        typing.type_of(root, arm_node),
        Err(TypingError::UnknownNode { node: arm_node })
    );

    // Second attempt succeeds and commits.
    let attempt = typing.new_child(root);
    typing
        .add_typing(attempt, arm_node, Type::nominal("::Integer"))
        .ok();
    assert_eq!(typing.save(attempt), Ok(()));
    assert_eq!(
        typing.type_of(root, arm_node),
        Ok(&Type::nominal("::Integer"))
    );

    // Downstream consumers read the committed store.
    assert_eq!(
        typing.type_of(root, call_node),
        Ok(&Type::nominal("::Integer"))
    );

    // And the subtyping engine agrees the committed type fits the
    // declared ivar on a subsequent assignment.
    let committed = match typing.type_of(root, arm_node) {
        Ok(ty) => ty.clone(),
        Err(err) => panic!("just committed: {err}"),
    };
    assert!(checker.holds(
        &Relation::new(committed, Type::nominal("::Integer")),
        &context.self_context
    ));
}

#[test]
fn literal_narrowing_conflict_is_advisory() {
    let registry = registry();
    let checker = SubtypeChecker::new(&registry);
    let (_, context) = session(&registry);

    // Narrowing @total to a String literal contradicts the ::Integer
    // declaration; the override still takes effect.
    let (narrowed, conflicts) = context.type_env.with_annotations(
        &Annotations::new().ivar("@total", Type::literal(LiteralValue::Str("oops".into()))),
        &context.self_context,
        &checker,
    );
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        narrowed.get(&EnvKey::ivar("@total")),
        Lookup::Declared(Type::literal(LiteralValue::Str("oops".into())))
    );

    // A function type built from the block signature participates too.
    let proc_ty = Type::function(FunctionType::new(Params::default(), Type::void()));
    assert!(checker.holds(
        &Relation::new(proc_ty, Type::any()),
        &context.self_context
    ));
}
