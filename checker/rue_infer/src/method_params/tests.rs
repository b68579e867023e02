use pretty_assertions::assert_eq;
use rue_diagnostic::ErrorCode;
use rue_types::{BlockType, FunctionType, MethodType, Params, Type};

use super::*;

fn int() -> Type {
    Type::nominal("Integer")
}

fn str_() -> Type {
    Type::nominal("String")
}

fn sym() -> Type {
    Type::nominal("Symbol")
}

fn build(params: Vec<Param>, method_type: &MethodType) -> MethodParams {
    MethodParams::build(
        NodeId::new(0),
        Span::DUMMY,
        &ParamList::new(params),
        method_type,
    )
}

fn positional(required: Vec<Type>, optional: Vec<Type>, rest: Option<Type>) -> MethodType {
    MethodType::new(
        Params {
            required,
            optional,
            rest,
            ..Params::default()
        },
        None,
        Type::void(),
    )
}

fn keywords(
    required: Vec<(&str, Type)>,
    optional: Vec<(&str, Type)>,
    rest: Option<Type>,
) -> MethodType {
    MethodType::new(
        Params {
            required_keywords: required.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            optional_keywords: optional.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            rest_keywords: rest,
            ..Params::default()
        },
        None,
        Type::void(),
    )
}

fn codes(params: &MethodParams) -> Vec<ErrorCode> {
    params.diagnostics().iter().map(Diagnostic::code).collect()
}

fn x(kind: ParamKind) -> Param {
    Param::new(kind, Some("x".into()), NodeId::new(1), Span::new(4, 5))
}

#[test]
fn test_empty_definition_empty_signature() {
    let params = build(vec![], &positional(vec![], vec![], None));
    assert_eq!(params.len(), 0);
    assert!(params.diagnostics().is_empty());
}

#[test]
fn test_required_positional() {
    // def foo(x) against (Integer) -> void: clean.
    let params = build(
        vec![x(ParamKind::RequiredPositional)],
        &positional(vec![int()], vec![], None),
    );
    assert_eq!(params.len(), 1);
    assert!(params.diagnostics().is_empty());
    assert_eq!(
        params.get("x"),
        Some(&ParamSlot::Positional(PositionalParam {
            name: Some("x".into()),
            ty: Some(int()),
            node: NodeId::new(1),
        }))
    );

    // Against (?Integer) -> void: best-effort type, different kind.
    let params = build(
        vec![x(ParamKind::RequiredPositional)],
        &positional(vec![], vec![int()], None),
    );
    assert_eq!(params.len(), 1);
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);
    match params.get("x") {
        Some(ParamSlot::Positional(p)) => assert_eq!(p.ty, Some(int())),
        other => panic!("unexpected slot {other:?}"),
    }

    // Against (*Integer) -> void: the rest's element type, different kind.
    let params = build(
        vec![x(ParamKind::RequiredPositional)],
        &positional(vec![], vec![], Some(int())),
    );
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);

    // Against () -> void: no counterpart at all.
    let params = build(
        vec![x(ParamKind::RequiredPositional)],
        &positional(vec![], vec![], None),
    );
    assert_eq!(params.len(), 1);
    assert_eq!(codes(&params), vec![ErrorCode::E1002]);
    match params.get("x") {
        Some(slot @ ParamSlot::Positional(p)) => {
            assert_eq!(p.ty, None);
            assert_eq!(slot.var_type(), Type::any());
        }
        other => panic!("unexpected slot {other:?}"),
    }
}

#[test]
fn test_optional_positional() {
    // def foo(x = 1) against (Integer) -> void: different kind.
    let params = build(
        vec![x(ParamKind::OptionalPositional)],
        &positional(vec![int()], vec![], None),
    );
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);

    // Against (?Integer) -> void: clean.
    let params = build(
        vec![x(ParamKind::OptionalPositional)],
        &positional(vec![], vec![int()], None),
    );
    assert!(params.diagnostics().is_empty());

    // Against (*Integer) -> void: different kind.
    let params = build(
        vec![x(ParamKind::OptionalPositional)],
        &positional(vec![], vec![], Some(int())),
    );
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);

    // Against () -> void: no counterpart.
    let params = build(
        vec![x(ParamKind::OptionalPositional)],
        &positional(vec![], vec![], None),
    );
    assert_eq!(codes(&params), vec![ErrorCode::E1002]);
}

#[test]
fn test_rest_positional() {
    // def foo(*x) against (Integer) -> void: consumes the leftover
    // required slot with a kind complaint; binds Array[Integer].
    let params = build(
        vec![x(ParamKind::RestPositional)],
        &positional(vec![int()], vec![], None),
    );
    assert_eq!(params.len(), 1);
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);
    match params.get("x") {
        Some(slot @ ParamSlot::PositionalRest(p)) => {
            assert_eq!(p.ty, Some(int()));
            assert_eq!(slot.var_type(), Type::generic("::Array", vec![int()]));
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // Against (*Integer) -> void: exact.
    let params = build(
        vec![x(ParamKind::RestPositional)],
        &positional(vec![], vec![], Some(int())),
    );
    assert!(params.diagnostics().is_empty());

    // Against () -> void: nothing declared, nothing to complain about.
    let params = build(
        vec![x(ParamKind::RestPositional)],
        &positional(vec![], vec![], None),
    );
    assert!(params.diagnostics().is_empty());
    match params.get("x") {
        Some(slot @ ParamSlot::PositionalRest(p)) => {
            assert_eq!(p.ty, None);
            assert_eq!(slot.var_type(), Type::generic("::Array", vec![Type::any()]));
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // Against (A, ?B, *C): the rest swallows everything as a union.
    let params = build(
        vec![x(ParamKind::RestPositional)],
        &positional(vec![int()], vec![str_()], Some(sym())),
    );
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);
    match params.get("x") {
        Some(ParamSlot::PositionalRest(p)) => {
            assert_eq!(p.ty, Some(Type::union(vec![int(), str_(), sym()])));
        }
        other => panic!("unexpected slot {other:?}"),
    }
}

#[test]
fn test_empty_definition_against_nonempty_signatures() {
    for method_type in [
        positional(vec![int()], vec![], None),
        positional(vec![], vec![int()], None),
        positional(vec![], vec![], Some(int())),
        keywords(vec![("foo", str_())], vec![], None),
        keywords(vec![], vec![("foo", sym())], None),
        keywords(vec![], vec![], Some(sym())),
    ] {
        let params = build(vec![], &method_type);
        assert_eq!(params.len(), 0, "for {method_type}");
        assert_eq!(codes(&params), vec![ErrorCode::E1001], "for {method_type}");
    }
}

#[test]
fn test_required_keyword() {
    let foo = || Param::new(
        ParamKind::RequiredKeyword,
        Some("foo".into()),
        NodeId::new(2),
        Span::new(4, 8),
    );

    // Against (foo: String) -> void: clean.
    let params = build(vec![foo()], &keywords(vec![("foo", str_())], vec![], None));
    assert_eq!(params.len(), 1);
    assert!(params.diagnostics().is_empty());
    assert_eq!(
        params.get("foo"),
        Some(&ParamSlot::Keyword(KeywordParam {
            name: Some("foo".into()),
            ty: Some(str_()),
            node: NodeId::new(2),
        }))
    );

    // Against (?foo: String) -> void: different kind.
    let params = build(vec![foo()], &keywords(vec![], vec![("foo", str_())], None));
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);

    // Against (**String) -> void: matched via the keyword rest.
    let params = build(vec![foo()], &keywords(vec![], vec![], Some(str_())));
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);
    match params.get("foo") {
        Some(ParamSlot::Keyword(p)) => assert_eq!(p.ty, Some(str_())),
        other => panic!("unexpected slot {other:?}"),
    }

    // Against () -> void: no counterpart.
    let params = build(vec![foo()], &keywords(vec![], vec![], None));
    assert_eq!(codes(&params), vec![ErrorCode::E1002]);
}

#[test]
fn test_optional_keyword() {
    let foo = || Param::new(
        ParamKind::OptionalKeyword,
        Some("foo".into()),
        NodeId::new(2),
        Span::new(4, 8),
    );

    let params = build(vec![foo()], &keywords(vec![("foo", str_())], vec![], None));
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);

    let params = build(vec![foo()], &keywords(vec![], vec![("foo", str_())], None));
    assert!(params.diagnostics().is_empty());

    let params = build(vec![foo()], &keywords(vec![], vec![], Some(str_())));
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);

    let params = build(vec![foo()], &keywords(vec![], vec![], None));
    assert_eq!(codes(&params), vec![ErrorCode::E1002]);
}

#[test]
fn test_rest_keyword() {
    // def foo(**x) against (**Symbol) -> void: exact; binds
    // Hash[::Symbol, Symbol].
    let params = build(
        vec![x(ParamKind::RestKeyword)],
        &keywords(vec![], vec![], Some(sym())),
    );
    assert_eq!(params.len(), 1);
    assert!(params.diagnostics().is_empty());
    match params.get("x") {
        Some(slot @ ParamSlot::KeywordRest(p)) => {
            assert_eq!(p.ty, Some(sym()));
            assert_eq!(
                slot.var_type(),
                Type::generic("::Hash", vec![Type::nominal("::Symbol"), sym()])
            );
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // Against (foo: String, bar: Integer, **Symbol): swallows the named
    // keywords as a union, with a kind complaint.
    let params = build(
        vec![x(ParamKind::RestKeyword)],
        &keywords(vec![("foo", str_()), ("bar", int())], vec![], Some(sym())),
    );
    assert_eq!(codes(&params), vec![ErrorCode::E1003]);
    match params.get("x") {
        Some(ParamSlot::KeywordRest(p)) => {
            assert_eq!(p.ty, Some(Type::union(vec![str_(), int(), sym()])));
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // Against () -> void: nothing declared, nothing reported.
    let params = build(vec![x(ParamKind::RestKeyword)], &keywords(vec![], vec![], None));
    assert!(params.diagnostics().is_empty());
    match params.get("x") {
        Some(slot @ ParamSlot::KeywordRest(p)) => {
            assert_eq!(p.ty, None);
            assert_eq!(
                slot.var_type(),
                Type::generic("::Hash", vec![Type::nominal("::Symbol"), Type::any()])
            );
        }
        other => panic!("unexpected slot {other:?}"),
    }
}

#[test]
fn test_block() {
    let blk = || Param::new(
        ParamKind::Block,
        Some("block".into()),
        NodeId::new(3),
        Span::new(9, 15),
    );
    let void_block = |required: bool| {
        BlockType::new(FunctionType::new(Params::default(), Type::void()), required)
    };
    let with_block = |block: Option<BlockType>| {
        MethodType::new(Params::default(), block, Type::void())
    };

    // Declared required block: the variable is the proc itself.
    let params = build(vec![blk()], &with_block(Some(void_block(true))));
    assert!(params.diagnostics().is_empty());
    match params.get("block") {
        Some(slot @ ParamSlot::Block(p)) => {
            assert!(!p.optional);
            assert_eq!(
                slot.var_type(),
                Type::function(FunctionType::new(Params::default(), Type::void()))
            );
            assert_eq!(slot.var_type().to_string(), "^() -> void");
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // Declared with a self binding: carried into the variable type.
    let params = build(
        vec![blk()],
        &with_block(Some(void_block(true).with_self_type(Type::self_type()))),
    );
    match params.get("block") {
        Some(slot @ ParamSlot::Block(p)) => {
            assert_eq!(p.self_type, Some(Type::self_type()));
            assert_eq!(slot.var_type().to_string(), "^() [self: self] -> void");
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // Declared optional block: proc-or-nil.
    let params = build(vec![blk()], &with_block(Some(void_block(false))));
    match params.get("block") {
        Some(slot @ ParamSlot::Block(p)) => {
            assert!(p.optional);
            assert_eq!(slot.var_type().to_string(), "^() -> void | nil");
        }
        other => panic!("unexpected slot {other:?}"),
    }

    // No declared block: the variable is nil.
    let params = build(vec![blk()], &with_block(None));
    assert!(params.diagnostics().is_empty());
    match params.get("block") {
        Some(slot @ ParamSlot::Block(p)) => {
            assert_eq!(p.ty, None);
            assert_eq!(slot.var_type(), Type::nil());
        }
        other => panic!("unexpected slot {other:?}"),
    }
}

#[test]
fn test_forward_whole_signature() {
    let fwd = || Param::forward(NodeId::new(4), Span::new(4, 7));

    let params = build(vec![fwd()], &positional(vec![int()], vec![], None));
    match params.forward_signature() {
        Some(ForwardSignature::Fragment { params, block }) => {
            assert_eq!(params.to_string(), "(Integer)");
            assert_eq!(*block, None);
        }
        other => panic!("unexpected forward signature {other:?}"),
    }

    let full = MethodType::new(
        Params {
            required: vec![Type::nominal("A")],
            optional: vec![Type::nominal("B")],
            rest: Some(Type::nominal("C")),
            required_keywords: vec![("x".into(), Type::nominal("D"))],
            optional_keywords: vec![("y".into(), Type::nominal("E"))],
            rest_keywords: Some(Type::nominal("F")),
        },
        None,
        Type::void(),
    );
    let params = build(vec![fwd()], &full);
    match params.forward_signature() {
        Some(ForwardSignature::Fragment { params, .. }) => {
            assert_eq!(params.to_string(), "(A, ?B, *C, x: D, ?y: E, **F)");
        }
        other => panic!("unexpected forward signature {other:?}"),
    }

    // The block fragment is independent of the positional remainder.
    let with_block = MethodType::new(
        Params::default(),
        Some(BlockType::new(
            FunctionType::new(Params::default(), Type::void()),
            true,
        )),
        Type::void(),
    );
    let params = build(vec![fwd()], &with_block);
    match params.forward_signature() {
        Some(ForwardSignature::Fragment { params, block }) => {
            assert_eq!(params.to_string(), "()");
            assert_eq!(
                block.as_ref().map(ToString::to_string),
                Some("{ () -> void }".to_string())
            );
        }
        other => panic!("unexpected forward signature {other:?}"),
    }

    // The unconstrained placeholder forwards opaquely.
    let params = build(vec![fwd()], &MethodType::untyped(Type::void()));
    assert_eq!(params.forward_signature(), Some(&ForwardSignature::Opaque));
}

#[test]
fn test_forward_after_explicit_params() {
    let fwd = Param::forward(NodeId::new(4), Span::new(7, 10));

    // def foo(x, ...) against (Integer) -> void: x eats the one slot.
    let params = build(
        vec![x(ParamKind::RequiredPositional), fwd.clone()],
        &positional(vec![int()], vec![], None),
    );
    match params.forward_signature() {
        Some(ForwardSignature::Fragment { params, block }) => {
            assert_eq!(params.to_string(), "()");
            assert_eq!(*block, None);
        }
        other => panic!("unexpected forward signature {other:?}"),
    }

    let full = MethodType::new(
        Params {
            required: vec![Type::nominal("A")],
            optional: vec![Type::nominal("B")],
            rest: Some(Type::nominal("C")),
            required_keywords: vec![("x".into(), Type::nominal("D"))],
            optional_keywords: vec![("y".into(), Type::nominal("E"))],
            rest_keywords: Some(Type::nominal("F")),
        },
        None,
        Type::void(),
    );
    let params = build(vec![x(ParamKind::RequiredPositional), fwd], &full);
    match params.forward_signature() {
        Some(ForwardSignature::Fragment { params, .. }) => {
            assert_eq!(params.to_string(), "(?B, *C, x: D, ?y: E, **F)");
        }
        other => panic!("unexpected forward signature {other:?}"),
    }
}

#[test]
fn test_leftover_optional_capacity_is_an_arity_mismatch() {
    // def foo(x) against (A, ?B) -> void: a caller may pass two arguments.
    let params = build(
        vec![x(ParamKind::RequiredPositional)],
        &positional(vec![int()], vec![str_()], None),
    );
    assert_eq!(params.len(), 1);
    assert_eq!(codes(&params), vec![ErrorCode::E1001]);
}

#[test]
fn test_untyped_signature_checks_nothing() {
    let params = build(
        vec![
            x(ParamKind::RequiredPositional),
            Param::new(
                ParamKind::RestKeyword,
                Some("opts".into()),
                NodeId::new(2),
                Span::new(6, 12),
            ),
        ],
        &MethodType::untyped(Type::void()),
    );
    assert_eq!(params.len(), 2);
    assert!(params.diagnostics().is_empty());
    match params.get("x") {
        Some(ParamSlot::Positional(p)) => assert_eq!(p.ty, None),
        other => panic!("unexpected slot {other:?}"),
    }
}
