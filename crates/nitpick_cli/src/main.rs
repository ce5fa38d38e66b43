//! nitpick: finds bugs in JavaScript programs.
//!
//! Usage:
//!   nitpick [FILE]...
//!
//! Lints each file and prints diagnostics to stderr as
//! `file:line:column: error: message`. Exits 0 iff no diagnostics were
//! produced.

use std::process;

use bumpalo::Bump;
use clap::Parser as ClapParser;

use nitpick_core::{Locator, PaddedString, SourceSpan};
use nitpick_diagnostics::DiagnosticCollection;
use nitpick_linter::Linter;
use nitpick_parser::Parser;

#[derive(ClapParser, Debug)]
#[command(name = "nitpick", about = "nitpick finds bugs in JavaScript programs")]
struct Cli {
    /// JavaScript files to lint.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    let mut found_problems = false;
    for file in &cli.files {
        match std::fs::read_to_string(file) {
            Ok(source) => {
                if lint_file(file, &source) {
                    found_problems = true;
                }
            }
            Err(error) => {
                eprintln!("error: failed to read {}: {}", file, error);
                found_problems = true;
            }
        }
    }
    process::exit(if found_problems { 1 } else { 0 });
}

/// Lint one file, printing its diagnostics. Returns true if any were found.
fn lint_file(file: &str, source: &str) -> bool {
    let code = PaddedString::new(source);
    let arena = Bump::new();
    let mut parser_diagnostics = DiagnosticCollection::new();
    let mut linter_diagnostics = DiagnosticCollection::new();

    {
        let mut linter = Linter::new(&mut linter_diagnostics);
        let mut parser = Parser::new(&arena, code.view(), &mut parser_diagnostics);
        parser.parse_and_visit_module(&mut linter);
    }

    let locator = Locator::new(code.view());
    let mut count = 0;
    for diagnostic in parser_diagnostics.iter().chain(linter_diagnostics.iter()) {
        print_source_location(file, &locator, diagnostic.primary_span());
        eprintln!("error: {}", diagnostic);
        if let (Some(secondary), Some(note)) =
            (diagnostic.secondary_span(), diagnostic.note())
        {
            print_source_location(file, &locator, secondary);
            eprintln!("note: {}", note);
        }
        count += 1;
    }
    for fatal in parser_diagnostics
        .fatal_errors()
        .iter()
        .chain(linter_diagnostics.fatal_errors())
    {
        print_source_location(file, &locator, fatal.span);
        eprintln!("error: {}", fatal);
        count += 1;
    }
    count != 0
}

fn print_source_location(file: &str, locator: &Locator<'_>, span: SourceSpan) {
    let location = locator.locate(span.begin);
    eprint!("{}:{}:{}: ", file, location.line + 1, location.column + 1);
}
