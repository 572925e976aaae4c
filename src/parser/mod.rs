//! Lexing and parsing of the source language surface (spec.md §6).
//!
//! Building a real parser here is in scope despite the distilled
//! specification treating concrete grammar as an external collaborator's
//! concern: the CLI needs an ingestion path, and the source surface is
//! already nailed down by spec.md §6 closely enough to implement
//! directly, the way the collaborator program's own recursive-descent
//! parser does.

mod grammar;
mod lexer;

use crate::ast::Script;
use crate::diagnostics::CompileError;
use chumsky::Parser;

pub fn parse(source: &str) -> Result<Script, CompileError> {
    let tokens = lexer::lexer().parse(source).into_result().map_err(|errs| {
        let e = &errs[0];
        CompileError::lex_at(source, e.span().start, e.to_string())
    })?;

    let stream = grammar::token_stream(&tokens);
    grammar::script_parser()
        .parse(stream)
        .into_result()
        .map_err(|errs| {
            let e = &errs[0];
            CompileError::parse_at(source, e.span().start, e.to_string())
        })
}
