//! # Cli
//!
//! Parses the command-line arguments for the `usl` binary.
use clap::{Parser, ValueEnum};

/// Lexer, Earley parser and bytecode VM for a small C-like scripting language.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the source file to run.
    pub file: std::path::PathBuf,

    /// Dump the lexer's token stream instead of running the program.
    #[arg(short, long)]
    pub lex: bool,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of `usl`.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also logs recoverable oddities, e.g. an empty program.
    #[value(alias("1"))]
    Warn,

    /// Also logs stage-transition tracing (token counts, state-set counts, bytecode length).
    #[value(alias("2"))]
    Info,

    /// Logs per-token and per-instruction detail.
    #[value(alias("3"))]
    Debug,

    /// Logs everything, including the evaluator's instruction-by-instruction trace.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
