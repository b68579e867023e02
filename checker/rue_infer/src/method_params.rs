//! Matching concrete parameter lists against declared signatures.
//!
//! Built once per method definition: each concrete parameter consumes
//! declared capacity in declaration order, collecting a typed slot and,
//! where the shapes disagree, a diagnostic. The result is immutable.
//!
//! Matching policy, per concrete parameter:
//! - declared capacity of the same kind: consumed silently;
//! - declared capacity of a different kind (required vs. optional,
//!   optional vs. rest, named keyword vs. keyword rest): consumed with a
//!   `DifferentMethodParameterKind`, keeping the best-effort type;
//! - no declared counterpart at all: `MethodParameterMismatch` and an
//!   untyped slot for plain positionals/keywords; rest and block
//!   parameters accept zero arguments and stay silent;
//! - declared capacity the definition cannot accept at all:
//!   `MethodArityMismatch`, once per parameter section.
//!
//! Positional consumption is strictly left to right, so a parameter that
//! could take either a declared optional slot or the declared rest always
//! prefers the optional slot.

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::rc::Rc;

use rue_diagnostic::{Diagnostic, DiagnosticKind};
use rue_ir::{NodeId, Param, ParamKind, ParamList, Span};
use rue_types::{BlockType, FunctionType, MethodType, Params, Type};

/// A required or optional positional slot.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionalParam {
    pub name: Option<Rc<str>>,
    /// Declared type; `None` means untyped.
    pub ty: Option<Type>,
    pub node: NodeId,
}

/// A `*rest` slot. The variable's type is an array of the element type.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionalRestParam {
    pub name: Option<Rc<str>>,
    pub ty: Option<Type>,
    pub node: NodeId,
}

/// A named keyword slot.
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordParam {
    pub name: Option<Rc<str>>,
    pub ty: Option<Type>,
    pub node: NodeId,
}

/// A `**rest` slot. The variable's type is a symbol-keyed hash of the
/// element type.
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordRestParam {
    pub name: Option<Rc<str>>,
    pub ty: Option<Type>,
    pub node: NodeId,
}

/// A `&block` slot.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockParam {
    pub name: Option<Rc<str>>,
    /// The declared block's functional part; `None` when no block is
    /// declared.
    pub ty: Option<FunctionType>,
    /// Declared `self` binding override inside the block.
    pub self_type: Option<Type>,
    /// True for a `?{ ... }` declaration.
    pub optional: bool,
    pub node: NodeId,
}

/// One matched parameter slot.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamSlot {
    Positional(PositionalParam),
    PositionalRest(PositionalRestParam),
    Keyword(KeywordParam),
    KeywordRest(KeywordRestParam),
    Block(BlockParam),
}

impl ParamSlot {
    pub fn name(&self) -> Option<&str> {
        match self {
            ParamSlot::Positional(p) => p.name.as_deref(),
            ParamSlot::PositionalRest(p) => p.name.as_deref(),
            ParamSlot::Keyword(p) => p.name.as_deref(),
            ParamSlot::KeywordRest(p) => p.name.as_deref(),
            ParamSlot::Block(p) => p.name.as_deref(),
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            ParamSlot::Positional(p) => p.node,
            ParamSlot::PositionalRest(p) => p.node,
            ParamSlot::Keyword(p) => p.node,
            ParamSlot::KeywordRest(p) => p.node,
            ParamSlot::Block(p) => p.node,
        }
    }

    /// The type of the variable the parameter binds in the method body.
    pub fn var_type(&self) -> Type {
        match self {
            ParamSlot::Positional(p) => p.ty.clone().unwrap_or_else(Type::any),
            ParamSlot::PositionalRest(p) => Type::generic(
                "::Array",
                vec![p.ty.clone().unwrap_or_else(Type::any)],
            ),
            ParamSlot::Keyword(p) => p.ty.clone().unwrap_or_else(Type::any),
            ParamSlot::KeywordRest(p) => Type::generic(
                "::Hash",
                vec![
                    Type::nominal("::Symbol"),
                    p.ty.clone().unwrap_or_else(Type::any),
                ],
            ),
            ParamSlot::Block(p) => match &p.ty {
                Some(function) => {
                    let func = Type::function_with_self(function.clone(), p.self_type.clone());
                    if p.optional {
                        Type::union(vec![func, Type::nil()])
                    } else {
                        func
                    }
                }
                None => Type::nil(),
            },
        }
    }
}

/// The signature remainder forwarded by a `...` parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ForwardSignature {
    /// The declared signature is the unconstrained `(?)` placeholder:
    /// forward without a static shape.
    Opaque,
    /// The positional/keyword remainder plus the independent block
    /// fragment.
    Fragment {
        params: Params,
        block: Option<BlockType>,
    },
}

/// The matched parameter slots of one method definition.
#[derive(Clone, Debug)]
pub struct MethodParams {
    slots: Vec<ParamSlot>,
    diagnostics: Vec<Diagnostic>,
    forward: Option<ForwardSignature>,
}

impl MethodParams {
    /// Match a definition's concrete parameters against a declared method
    /// type. `node`/`span` identify the definition itself and anchor
    /// arity diagnostics.
    #[tracing::instrument(level = "trace", skip_all, fields(method_type = %method_type))]
    pub fn build(
        node: NodeId,
        span: Span,
        params: &ParamList,
        method_type: &MethodType,
    ) -> MethodParams {
        Builder::new(node, span, method_type).run(params)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    /// Look up a slot by parameter name.
    pub fn get(&self, name: &str) -> Option<&ParamSlot> {
        self.slots.iter().find(|slot| slot.name() == Some(name))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn forward_signature(&self) -> Option<&ForwardSignature> {
        self.forward.as_ref()
    }
}

/// Which kind of declared capacity a positional parameter consumed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Consumed {
    Required,
    Optional,
    Rest,
}

struct Builder<'a> {
    def_node: NodeId,
    def_span: Span,
    method_type: &'a MethodType,
    slots: Vec<ParamSlot>,
    diagnostics: Vec<Diagnostic>,
    forward: Option<ForwardSignature>,
    // Remaining declared capacity, consumed as concrete parameters match.
    required: VecDeque<Type>,
    optional: VecDeque<Type>,
    rest: Option<Type>,
    required_kw: Vec<(Rc<str>, Type)>,
    optional_kw: Vec<(Rc<str>, Type)>,
    kw_rest: Option<Type>,
    consumed_positional: bool,
    consumed_keyword: bool,
    had_positional_rest: bool,
    had_kw_rest: bool,
    had_forward: bool,
}

impl<'a> Builder<'a> {
    fn new(def_node: NodeId, def_span: Span, method_type: &'a MethodType) -> Self {
        let declared = method_type.params.as_params();
        Builder {
            def_node,
            def_span,
            method_type,
            slots: Vec::new(),
            diagnostics: Vec::new(),
            forward: None,
            required: declared.map_or_else(VecDeque::new, |p| p.required.iter().cloned().collect()),
            optional: declared.map_or_else(VecDeque::new, |p| p.optional.iter().cloned().collect()),
            rest: declared.and_then(|p| p.rest.clone()),
            required_kw: declared.map_or_else(Vec::new, |p| p.required_keywords.clone()),
            optional_kw: declared.map_or_else(Vec::new, |p| p.optional_keywords.clone()),
            kw_rest: declared.and_then(|p| p.rest_keywords.clone()),
            consumed_positional: false,
            consumed_keyword: false,
            had_positional_rest: false,
            had_kw_rest: false,
            had_forward: false,
        }
    }

    fn run(mut self, params: &ParamList) -> MethodParams {
        if self.method_type.is_untyped() {
            // `(?)` accepts anything; every slot is untyped, arity unchecked.
            for param in params {
                self.push_untyped(param);
            }
            return self.finish(false);
        }

        for param in params {
            match param.kind {
                ParamKind::RequiredPositional | ParamKind::OptionalPositional => {
                    self.positional(param);
                }
                ParamKind::RestPositional => self.positional_rest(param),
                ParamKind::RequiredKeyword | ParamKind::OptionalKeyword => self.keyword(param),
                ParamKind::RestKeyword => self.keyword_rest(param),
                ParamKind::Block => self.block(param),
                ParamKind::Forward => self.forwarding(),
            }
        }
        self.finish(true)
    }

    fn positional(&mut self, param: &Param) {
        self.consumed_positional = true;
        let wants_required = param.kind == ParamKind::RequiredPositional;
        let consumed = if let Some(ty) = self.required.pop_front() {
            Some((ty, Consumed::Required))
        } else if let Some(ty) = self.optional.pop_front() {
            Some((ty, Consumed::Optional))
        } else {
            self.rest.clone().map(|ty| (ty, Consumed::Rest))
        };

        let ty = match consumed {
            Some((ty, Consumed::Required)) if wants_required => Some(ty),
            Some((ty, Consumed::Optional)) if !wants_required => Some(ty),
            Some((ty, _)) => {
                self.different_kind(param);
                Some(ty)
            }
            None => {
                self.parameter_mismatch(param);
                None
            }
        };
        self.slots.push(ParamSlot::Positional(PositionalParam {
            name: param.name.clone(),
            ty,
            node: param.node,
        }));
    }

    fn positional_rest(&mut self, param: &Param) {
        self.had_positional_rest = true;
        let named_remaining = !self.required.is_empty() || !self.optional.is_empty();
        let exact = !named_remaining && self.rest.is_some();

        let mut remaining: Vec<Type> = self.required.drain(..).collect();
        remaining.extend(self.optional.drain(..));
        remaining.extend(self.rest.take());

        let ty = if remaining.is_empty() {
            // Nothing declared: the rest accepts zero arguments, silently.
            None
        } else {
            if !exact {
                self.different_kind(param);
            }
            Some(Type::union(remaining))
        };
        self.slots.push(ParamSlot::PositionalRest(PositionalRestParam {
            name: param.name.clone(),
            ty,
            node: param.node,
        }));
    }

    fn keyword(&mut self, param: &Param) {
        self.consumed_keyword = true;
        let wants_required = param.kind == ParamKind::RequiredKeyword;
        let name = param.name.as_deref().unwrap_or("");

        let ty = if let Some(pos) = self.required_kw.iter().position(|(n, _)| n.as_ref() == name)
        {
            let (_, ty) = self.required_kw.remove(pos);
            if !wants_required {
                self.different_kind(param);
            }
            Some(ty)
        } else if let Some(pos) = self.optional_kw.iter().position(|(n, _)| n.as_ref() == name) {
            let (_, ty) = self.optional_kw.remove(pos);
            if wants_required {
                self.different_kind(param);
            }
            Some(ty)
        } else if let Some(ty) = self.kw_rest.clone() {
            self.different_kind(param);
            Some(ty)
        } else {
            self.parameter_mismatch(param);
            None
        };
        self.slots.push(ParamSlot::Keyword(KeywordParam {
            name: param.name.clone(),
            ty,
            node: param.node,
        }));
    }

    fn keyword_rest(&mut self, param: &Param) {
        self.had_kw_rest = true;
        let named_remaining = !self.required_kw.is_empty() || !self.optional_kw.is_empty();
        let exact = !named_remaining && self.kw_rest.is_some();

        let mut remaining: Vec<Type> =
            self.required_kw.drain(..).map(|(_, ty)| ty).collect();
        remaining.extend(self.optional_kw.drain(..).map(|(_, ty)| ty));
        remaining.extend(self.kw_rest.take());

        let ty = if remaining.is_empty() {
            None
        } else {
            if !exact {
                self.different_kind(param);
            }
            Some(Type::union(remaining))
        };
        self.slots.push(ParamSlot::KeywordRest(KeywordRestParam {
            name: param.name.clone(),
            ty,
            node: param.node,
        }));
    }

    fn block(&mut self, param: &Param) {
        let slot = match &self.method_type.block {
            Some(block) => BlockParam {
                name: param.name.clone(),
                ty: Some(block.function.clone()),
                self_type: block.self_type.clone(),
                optional: !block.required,
                node: param.node,
            },
            None => BlockParam {
                name: param.name.clone(),
                ty: None,
                self_type: None,
                optional: false,
                node: param.node,
            },
        };
        self.slots.push(ParamSlot::Block(slot));
    }

    fn forwarding(&mut self) {
        self.had_forward = true;
        let params = Params {
            required: self.required.drain(..).collect(),
            optional: self.optional.drain(..).collect(),
            rest: self.rest.take(),
            required_keywords: self.required_kw.drain(..).collect(),
            optional_keywords: self.optional_kw.drain(..).collect(),
            rest_keywords: self.kw_rest.take(),
        };
        self.forward = Some(ForwardSignature::Fragment {
            params,
            block: self.method_type.block.clone(),
        });
    }

    fn push_untyped(&mut self, param: &Param) {
        let slot = match param.kind {
            ParamKind::RequiredPositional | ParamKind::OptionalPositional => {
                ParamSlot::Positional(PositionalParam {
                    name: param.name.clone(),
                    ty: None,
                    node: param.node,
                })
            }
            ParamKind::RestPositional => ParamSlot::PositionalRest(PositionalRestParam {
                name: param.name.clone(),
                ty: None,
                node: param.node,
            }),
            ParamKind::RequiredKeyword | ParamKind::OptionalKeyword => {
                ParamSlot::Keyword(KeywordParam {
                    name: param.name.clone(),
                    ty: None,
                    node: param.node,
                })
            }
            ParamKind::RestKeyword => ParamSlot::KeywordRest(KeywordRestParam {
                name: param.name.clone(),
                ty: None,
                node: param.node,
            }),
            ParamKind::Block => ParamSlot::Block(BlockParam {
                name: param.name.clone(),
                ty: None,
                self_type: None,
                optional: false,
                node: param.node,
            }),
            ParamKind::Forward => {
                self.forward = Some(ForwardSignature::Opaque);
                return;
            }
        };
        self.slots.push(slot);
    }

    /// Leftover declared capacity the definition has no way to accept is
    /// an arity mismatch, reported once per section.
    fn finish(mut self, check_arity: bool) -> MethodParams {
        if check_arity {
            let positional_leftover = !self.required.is_empty()
                || !self.optional.is_empty()
                || (self.rest.is_some() && !self.consumed_positional);
            if positional_leftover && !self.had_positional_rest && !self.had_forward {
                self.arity_mismatch();
            }

            let keyword_leftover = !self.required_kw.is_empty()
                || !self.optional_kw.is_empty()
                || (self.kw_rest.is_some() && !self.consumed_keyword);
            if keyword_leftover && !self.had_kw_rest && !self.had_forward {
                self.arity_mismatch();
            }
        }
        MethodParams {
            slots: self.slots,
            diagnostics: self.diagnostics,
            forward: self.forward,
        }
    }

    fn different_kind(&mut self, param: &Param) {
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::DifferentMethodParameterKind {
                name: param.name.clone().unwrap_or_else(|| "".into()),
            },
            param.node,
            param.span,
        ));
    }

    fn parameter_mismatch(&mut self, param: &Param) {
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::MethodParameterMismatch {
                name: param.name.clone().unwrap_or_else(|| "".into()),
            },
            param.node,
            param.span,
        ));
    }

    fn arity_mismatch(&mut self) {
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::MethodArityMismatch {
                method_type: self.method_type.clone(),
            },
            self.def_node,
            self.def_span,
        ));
    }
}
