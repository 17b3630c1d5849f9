//! Registration calls of the host documentation framework and the scanner
//! that finds them in a token stream.

use super::tokenizer::{Token, TokenKind};
use crate::model::{NameKind, Occurrence};
use log::debug;
use std::collections::HashMap;

/// Where to find one argument: by keyword, or by position among the
/// positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgRef {
    pub position: usize,
    pub keyword: String,
}

impl ArgRef {
    pub fn new(position: usize, keyword: &str) -> Self {
        Self {
            position,
            keyword: keyword.to_string(),
        }
    }
}

/// One name registered by a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSlot {
    pub kind: NameKind,
    pub arg: ArgRef,
}

/// How a registration call passes its names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpec {
    pub slots: Vec<NameSlot>,
    /// Domain argument for `*_to_domain` calls; names become `domain:name`.
    pub domain: Option<ArgRef>,
}

impl CallSpec {
    fn single(kind: NameKind, position: usize, keyword: &str) -> Self {
        Self {
            slots: vec![NameSlot {
                kind,
                arg: ArgRef::new(position, keyword),
            }],
            domain: None,
        }
    }

    fn in_domain(kind: NameKind) -> Self {
        Self {
            slots: vec![NameSlot {
                kind,
                arg: ArgRef::new(1, "name"),
            }],
            domain: Some(ArgRef::new(0, "domain")),
        }
    }

    fn object_type() -> Self {
        Self {
            slots: vec![
                NameSlot {
                    kind: NameKind::Directive,
                    arg: ArgRef::new(0, "directivename"),
                },
                NameSlot {
                    kind: NameKind::Role,
                    arg: ArgRef::new(1, "rolename"),
                },
            ],
            domain: None,
        }
    }
}

/// Lookup of call name to [`CallSpec`].
#[derive(Debug, Clone, Default)]
pub struct RegistrationTable {
    calls: HashMap<String, CallSpec>,
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The calls Sphinx and docutils use to register directives and roles.
    pub fn sphinx_defaults() -> Self {
        let mut table = Self::new();
        table.register("add_directive", CallSpec::single(NameKind::Directive, 0, "name"));
        table.register("register_directive", CallSpec::single(NameKind::Directive, 0, "name"));
        table.register("add_directive_to_domain", CallSpec::in_domain(NameKind::Directive));

        table.register("add_role", CallSpec::single(NameKind::Role, 0, "name"));
        table.register("add_generic_role", CallSpec::single(NameKind::Role, 0, "name"));
        table.register("register_local_role", CallSpec::single(NameKind::Role, 0, "name"));
        table.register("register_canonical_role", CallSpec::single(NameKind::Role, 0, "name"));
        table.register("register_generic_role", CallSpec::single(NameKind::Role, 0, "name"));
        table.register("add_role_to_domain", CallSpec::in_domain(NameKind::Role));

        table.register("add_object_type", CallSpec::object_type());
        table.register("add_crossref_type", CallSpec::object_type());
        table
    }

    pub fn register(&mut self, call: &str, spec: CallSpec) {
        self.calls.insert(call.to_string(), spec);
    }

    /// Treat `call` like `add_directive` / `add_role`.
    pub fn register_simple(&mut self, call: &str, kind: NameKind) {
        self.register(call, CallSpec::single(kind, 0, "name"));
    }

    pub fn get(&self, call: &str) -> Option<&CallSpec> {
        self.calls.get(call)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Find every registration in `tokens`, in source order.
    pub fn scan(&self, tokens: &[Token]) -> Vec<Occurrence> {
        let mut found = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let TokenKind::Ident(ident) = &token.kind else {
                continue;
            };
            let Some(spec) = self.calls.get(ident) else {
                continue;
            };
            if !matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::Open('('))) {
                continue;
            }
            if i > 0 && tokens[i - 1].kind == TokenKind::Ident("def".to_string()) {
                continue;
            }
            let Some(args) = split_arguments(&tokens[i + 2..]) else {
                continue;
            };
            self.collect(ident, token.line, spec, &args, &mut found);
        }
        found
    }

    fn collect(
        &self,
        call: &str,
        line: usize,
        spec: &CallSpec,
        args: &[Argument<'_>],
        found: &mut Vec<Occurrence>,
    ) {
        let domain = match &spec.domain {
            Some(arg) => match resolve(args, arg) {
                Some(Value::Literal(domain, _)) => Some(domain),
                _ => {
                    debug!("line {}: {}() domain is not a string literal", line, call);
                    return;
                }
            },
            None => None,
        };

        for slot in &spec.slots {
            match resolve(args, &slot.arg) {
                Some(Value::Literal(name, name_line)) if !name.is_empty() => {
                    let name = match &domain {
                        Some(domain) => format!("{}:{}", domain, name),
                        None => name,
                    };
                    found.push(Occurrence {
                        kind: slot.kind,
                        name,
                        line: name_line,
                    });
                }
                _ => debug!(
                    "line {}: {}() {} argument '{}' is not a string literal",
                    line, call, slot.kind, slot.arg.keyword
                ),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Literal(String, usize),
    Other,
}

#[derive(Debug)]
struct Argument<'a> {
    keyword: Option<&'a str>,
    tokens: &'a [Token],
}

impl Argument<'_> {
    fn value(&self) -> Value {
        if self.tokens.is_empty() {
            return Value::Other;
        }
        let mut text = String::new();
        for token in self.tokens {
            match &token.kind {
                TokenKind::Str { value, plain: true } => text.push_str(value),
                _ => return Value::Other,
            }
        }
        Value::Literal(text, self.tokens[0].line)
    }
}

fn resolve(args: &[Argument<'_>], arg: &ArgRef) -> Option<Value> {
    if let Some(by_keyword) = args.iter().find(|a| a.keyword == Some(arg.keyword.as_str())) {
        return Some(by_keyword.value());
    }
    args.iter()
        .filter(|a| a.keyword.is_none())
        .nth(arg.position)
        .map(Argument::value)
}

/// Split the tokens after an opening parenthesis into top-level arguments,
/// stopping at the matching close. Returns `None` if it never closes.
fn split_arguments(tokens: &[Token]) -> Option<Vec<Argument<'_>>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Open(_) => depth += 1,
            TokenKind::Close(_) if depth > 0 => depth -= 1,
            TokenKind::Close(_) => {
                push_argument(&tokens[start..i], &mut args);
                return Some(args);
            }
            TokenKind::Comma if depth == 0 => {
                push_argument(&tokens[start..i], &mut args);
                start = i + 1;
            }
            _ => {}
        }
    }
    None
}

fn push_argument<'a>(tokens: &'a [Token], args: &mut Vec<Argument<'a>>) {
    if tokens.is_empty() {
        // Trailing comma.
        return;
    }
    match tokens {
        [Token {
            kind: TokenKind::Ident(keyword),
            ..
        }, Token {
            kind: TokenKind::Equals,
            ..
        }, rest @ ..] => args.push(Argument {
            keyword: Some(keyword.as_str()),
            tokens: rest,
        }),
        _ => args.push(Argument {
            keyword: None,
            tokens,
        }),
    }
}
