//! Lexer, Earley parser and bytecode VM for a small C-like scripting language.
pub mod ast;
pub mod bytecode;
pub mod earley;
pub mod eval;
pub mod grammar;
pub mod lexer;
pub mod stdlib;
pub mod value;

use std::fmt::{self, Display};
use std::io::Write;

use log::info;

use bytecode::command_buffer::TranslationError;
use earley::ParseError;
use eval::RuntimeError;
use lexer::LexError;

/// The union of every pipeline-stage error, surfaced at the CLI boundary.
#[derive(Debug)]
pub enum PipelineError {
    Lex(LexError),
    Parse(ParseError),
    Translate(TranslationError),
    Runtime(RuntimeError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Lex(e) => write!(f, "lex error: {e}"),
            PipelineError::Parse(e) => write!(f, "parse error: {e}"),
            PipelineError::Translate(e) => write!(f, "translation error: {e}"),
            PipelineError::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LexError> for PipelineError {
    fn from(e: LexError) -> Self {
        PipelineError::Lex(e)
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        PipelineError::Parse(e)
    }
}

impl From<TranslationError> for PipelineError {
    fn from(e: TranslationError) -> Self {
        PipelineError::Translate(e)
    }
}

impl From<RuntimeError> for PipelineError {
    fn from(e: RuntimeError) -> Self {
        PipelineError::Runtime(e)
    }
}

/// Lexes `source` and returns the token stream, for the `-l`/`--lex` CLI mode.
pub fn lex_only(source: &str) -> Result<Vec<lexer::Token<'_>>, PipelineError> {
    Ok(lexer::lex(source)?)
}

/// Runs the full pipeline (lex -> parse -> build AST -> translate -> evaluate), writing
/// `println`/`print` output to `output`.
pub fn run<'src>(source: &'src str, output: Box<dyn Write + 'src>) -> Result<(), PipelineError> {
    let tokens = lexer::lex(source)?;
    info!("lexed {} tokens", tokens.len());

    let sets = earley::recognize(&tokens)?;
    info!("recognized {} state sets", sets.sets.len());

    let tree = ast::build(&tokens, &sets)?;
    let bytecode = bytecode::translators::translate_program(&tree)?;
    info!("translated to {} bytecode items", bytecode.len());

    let mut evaluator = eval::Evaluator::new(bytecode, output);
    evaluator.run()?;
    Ok(())
}
