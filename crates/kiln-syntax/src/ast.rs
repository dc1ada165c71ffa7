//! Syntax tree for Kotlin-DSL build descriptors

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A whole descriptor script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<Stmt>,
}

/// `{ ... }` body of a trailing lambda
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    /// `target = value`
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    /// `val name = expr` or `val name by delegate`
    Val(ValDecl),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(expr) => expr.span(),
            Stmt::Assign { span, .. } => *span,
            Stmt::Val(decl) => decl.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValDecl {
    pub name: Ident,
    pub init: ValInit,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValInit {
    /// `val x = expr`
    Value(Expr),
    /// `val x by creating(Jar::class) { ... }`
    Delegate(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal, Span),
    Ident(Ident),
    /// `receiver.name`
    Member {
        receiver: Box<Expr>,
        name: Ident,
        span: Span,
    },
    Call(Call),
    /// `Jar::class`
    ClassRef(Ident, Span),
    /// `lhs name rhs`, e.g. `id("scala") version "1.0"`
    Infix {
        lhs: Box<Expr>,
        op: Ident,
        rhs: Box<Expr>,
        span: Span,
    },
    /// Standalone lambda passed as a value
    Lambda(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Box<Expr>,
    /// `withType<Test>` type arguments
    pub type_args: Vec<String>,
    pub args: Vec<Arg>,
    pub lambda: Option<Block>,
    pub span: Span,
}

impl Call {
    /// Dotted path of the callee when it is a plain name chain
    pub fn callee_path(&self) -> Option<String> {
        self.callee.path()
    }

    /// Last segment of the callee (`register` for `tasks.register`)
    pub fn callee_name(&self) -> Option<&str> {
        match self.callee.as_ref() {
            Expr::Ident(ident) => Some(&ident.name),
            Expr::Member { name, .. } => Some(&name.name),
            _ => None,
        }
    }

    /// Receiver of a member call (`tasks` for `tasks.register`)
    pub fn receiver(&self) -> Option<&Expr> {
        match self.callee.as_ref() {
            Expr::Member { receiver, .. } => Some(receiver),
            _ => None,
        }
    }

    pub fn positional(&self) -> impl Iterator<Item = &Expr> {
        self.args.iter().filter(|a| a.name.is_none()).map(|a| &a.value)
    }

    pub fn named(&self, name: &str) -> Option<&Expr> {
        self.args
            .iter()
            .find(|a| a.name.as_ref().is_some_and(|n| n.name == name))
            .map(|a| &a.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub name: Option<Ident>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(Vec<StringPart>),
    /// Numeric literal kept as written
    Number(String),
    Bool(bool),
    Null,
}

/// Piece of a string template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringPart {
    Text(String),
    /// `$name` or `${name}`
    Var(String),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, span) => *span,
            Expr::Ident(ident) => ident.span,
            Expr::Member { span, .. } => *span,
            Expr::Call(call) => call.span,
            Expr::ClassRef(_, span) => *span,
            Expr::Infix { span, .. } => *span,
            Expr::Lambda(block) => block.span,
        }
    }

    /// Dotted path for identifier/member chains (`tasks.test`)
    pub fn path(&self) -> Option<String> {
        match self {
            Expr::Ident(ident) => Some(ident.name.clone()),
            Expr::Member { receiver, name, .. } => {
                receiver.path().map(|p| format!("{}.{}", p, name.name))
            }
            _ => None,
        }
    }

    /// String literal without template variables
    pub fn as_plain_string(&self) -> Option<String> {
        match self {
            Expr::Literal(Literal::String(parts), _) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        StringPart::Text(text) => out.push_str(text),
                        StringPart::Var(_) => return None,
                    }
                }
                Some(out)
            }
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit, _) => write!(f, "{}", lit),
            Expr::Ident(ident) => write!(f, "{}", ident.name),
            Expr::Member { receiver, name, .. } => write!(f, "{}.{}", receiver, name.name),
            Expr::Call(call) => {
                write!(f, "{}", call.callee)?;
                if !call.type_args.is_empty() {
                    write!(f, "<{}>", call.type_args.join(", "))?;
                }
                if !call.args.is_empty() || call.lambda.is_none() {
                    write!(f, "(")?;
                    for (i, arg) in call.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        if let Some(name) = &arg.name {
                            write!(f, "{} = ", name.name)?;
                        }
                        write!(f, "{}", arg.value)?;
                    }
                    write!(f, ")")?;
                }
                if call.lambda.is_some() {
                    write!(f, " {{ ... }}")?;
                }
                Ok(())
            }
            Expr::ClassRef(ident, _) => write!(f, "{}::class", ident.name),
            Expr::Infix { lhs, op, rhs, .. } => write!(f, "{} {} {}", lhs, op.name, rhs),
            Expr::Lambda(_) => write!(f, "{{ ... }}"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(parts) => {
                write!(f, "\"")?;
                for part in parts {
                    match part {
                        StringPart::Text(text) => write!(f, "{}", text.escape_default())?,
                        StringPart::Var(name) => write!(f, "${{{}}}", name)?,
                    }
                }
                write!(f, "\"")
            }
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}
