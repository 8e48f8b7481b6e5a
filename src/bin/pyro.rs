//! Pyro interpreter command line.
//!
//! When called with a script path it runs that file and exits with code 65
//! if any diagnostic (scan, parse or runtime) was recorded.
//!
//! When called without argument it drops into an interactive
//! read-evaluate-print loop; the session is shared between lines so
//! definitions persist.

use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pyro::diag::Diagnostics;
use pyro::interpreter::Interpreter;

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => {
            run_prompt()?;
            Ok(ExitCode::SUCCESS)
        }
        [script] => run_file(script),
        _ => {
            eprintln!("Usage: pyro [script]");
            Ok(ExitCode::from(64))
        }
    }
}

fn run_file(path: &str) -> anyhow::Result<ExitCode> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;

    let mut stdout = io::stdout();
    let mut diagnostics = Diagnostics::new();
    let mut interp = Interpreter::new(&mut stdout);
    interp.run(&source, &mut diagnostics);

    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }

    if diagnostics.had_error() {
        Ok(ExitCode::from(65))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut prompt_out = io::stdout();
    let mut interp_out = io::stdout();

    let mut interp = Interpreter::new(&mut interp_out);
    let mut diagnostics = Diagnostics::new();

    let mut input = String::new();
    loop {
        prompt_out.write_all(b"> ")?;
        prompt_out.flush()?;

        input.clear();
        let nbytes = stdin.read_line(&mut input)?;
        if nbytes == 0 {
            break;
        }

        // A fresh slate per line: one bad line should not poison the next.
        diagnostics.clear();
        interp.run(&input, &mut diagnostics);
        for diagnostic in diagnostics.iter() {
            eprintln!("{}", diagnostic);
        }
    }

    Ok(())
}
