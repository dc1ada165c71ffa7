//! Kiln descriptor syntax
//!
//! Lexer, parser and syntax tree for the Kotlin-DSL subset used by Gradle
//! build scripts:
//! - comments, backtick identifiers, string templates
//! - member chains, calls with named arguments, type arguments
//! - trailing lambdas, `Type::class` references, single-line infix calls
//! - `val` declarations (plain and delegated) and assignments

pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{Arg, Block, Call, Expr, Ident, Literal, Script, Stmt, StringPart, ValDecl, ValInit};
pub use diagnostic::{sort_diagnostics, Diagnostic, DiagnosticLevel};
pub use lexer::Lexer;
pub use parser::{Parser, MAX_NESTING};
pub use span::Span;
pub use token::{Token, TokenKind};

/// Lex and parse descriptor source in one step
///
/// Diagnostics from both phases are returned with source snippets attached.
/// The script is only meaningful when no error diagnostics were produced.
pub fn parse_script(source: &str) -> (Script, Vec<Diagnostic>) {
    let source = strip_byte_order_mark(source);
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    let (script, parse_diagnostics) = Parser::new(tokens).parse();
    diagnostics.extend(parse_diagnostics);

    for diag in &mut diagnostics {
        diag.attach_source(source);
    }

    (script, diagnostics)
}

/// `source` without a leading UTF-8 byte order mark
pub fn strip_byte_order_mark(source: &str) -> &str {
    source.strip_prefix('\u{feff}').unwrap_or(source)
}
