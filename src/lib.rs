//! Source-to-source compiler front end for an agent-based-modeling
//! step-function DSL.
//!
//! The pipeline: lex & parse source text into an [`ast::Script`], run the
//! two-pass [`analyzer`] over it to resolve types, names, and constants,
//! derive a [`flame`] model describing per-agent state machines and
//! inter-agent messages, then hand the analyzed script and model to one
//! of the [`backend`] emitters.

pub mod analyzer;
pub mod ast;
pub mod backend;
pub mod diagnostics;
pub mod flame;
pub mod function_table;
pub mod parser;
pub mod scope;
pub mod span;
pub mod types;
pub mod value;
pub mod varid;
pub mod visitor;

pub use ast::Script;
pub use diagnostics::{CompileError, Diagnostic, DiagnosticSink};

/// Parse and analyze a complete source string, returning the fully
/// resolved [`Script`] or the accumulated diagnostics as a
/// [`CompileError::Analysis`].
pub fn compile_to_script(source: &str, params: &[(String, String)]) -> Result<Script, CompileError> {
    let mut script = parser::parse(source)?;
    let mut sink = DiagnosticSink::new();
    analyzer::analyze(&mut script, params, &mut sink)?;
    if sink.has_errors() {
        return Err(CompileError::from_sink(&sink, source));
    }
    Ok(script)
}
