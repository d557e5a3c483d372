//! # usl
//!
//! Command-line entry point: lexes, parses, translates and runs a source file, or (with
//! `-l`/`--lex`) dumps its token stream.
mod cli;

use std::error::Error;
use std::fs;
use std::io::stdout;

use log::{error, info};

use cli::Cli;
use usl::{lex_only, run};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let path = fs::canonicalize(&args.file)?;
    let source = fs::read_to_string(&path)?;

    if args.lex {
        match lex_only(&source) {
            Ok(tokens) => {
                for token in tokens {
                    println!("{token}");
                }
            }
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    info!("running {}", path.display());
    if let Err(e) = run(&source, Box::new(stdout())) {
        error!("{e}");
        std::process::exit(1);
    }

    Ok(())
}
