//! Command-line host for the TOM write and read paths.
//!
//! Usage:
//!   tom parse [input]                      - Print the parse tree as JSON
//!   tom preprocess [input] [--seed N]      - Print the text to store, dice baked
//!   tom prerender [input] [--seed N]       - Print the prerendered tree as JSON
//!   tom original [input]                   - Print stored text with dice results removed
//!
//! Input is read from stdin when no path is given.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tom_core::{
    Diagnostic, DiagnosticSeverity, RandomSource, SeededRandom, parse_with_diagnostics, preparse,
    preprocess_with_diagnostics, prerender_with_diagnostics, stringify, to_original_format,
};

#[derive(Parser)]
#[command(name = "tom", version, about = "Parse, bake and inspect TOM board markup")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Report diagnostics on stderr
    #[arg(long, value_enum, global = true)]
    diagnostics: Option<DiagnosticsMode>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the parse tree as JSON
    Parse { input: Option<PathBuf> },
    /// Expand shorthands and roll every dice; prints the text to store
    Preprocess {
        input: Option<PathBuf>,
        /// Seed for dice rolls (defaults to TOM_SEED, then the clock)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Evaluate dice and formulas; prints the prerendered tree as JSON
    Prerender {
        input: Option<PathBuf>,
        /// Seed for dice that were never baked (defaults to TOM_SEED, then the clock)
        #[arg(long)]
        seed: Option<u64>,
        /// Report unbaked dice as errors instead of rolling them
        #[arg(long, conflicts_with = "seed")]
        no_roll: bool,
    },
    /// Print stored text with baked dice results removed
    Original { input: Option<PathBuf> },
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

fn main() {
    let cli = Cli::parse();

    let diagnostics = match cli.command {
        Command::Parse { input } => {
            let source = read_input(input);
            let parsed = parse_with_diagnostics(&source);
            println!("{}", to_json(&parsed.root));
            parsed.diagnostics
        }
        Command::Preprocess { input, seed } => {
            let source = read_input(input);
            let mut diagnostics = parse_with_diagnostics(&source).diagnostics;
            let mut random = SeededRandom::new(resolve_seed(seed));
            let result = preprocess_with_diagnostics(&preparse(&source), &mut random);
            print!("{}", stringify(&result.root));
            diagnostics.extend(result.diagnostics);
            diagnostics
        }
        Command::Prerender {
            input,
            seed,
            no_roll,
        } => {
            let source = read_input(input);
            let parsed = parse_with_diagnostics(&source);
            let mut random = SeededRandom::new(resolve_seed(seed));
            let random: Option<&mut dyn RandomSource> =
                if no_roll { None } else { Some(&mut random) };
            let result = prerender_with_diagnostics(&parsed.root, random);
            println!("{}", to_json(&result.root));
            let mut diagnostics = parsed.diagnostics;
            diagnostics.extend(result.diagnostics);
            diagnostics
        }
        Command::Original { input } => {
            let source = read_input(input);
            print!("{}", to_original_format(&source));
            Vec::new()
        }
    };

    if env::var("TOM_DEBUG").is_ok() {
        for diagnostic in &diagnostics {
            eprintln!(
                "tom debug: {} {}: {}",
                diagnostic.code, diagnostic.message, diagnostic.snippet
            );
        }
    }
    if let Some(mode) = cli.diagnostics {
        emit_diagnostics(&diagnostics, mode);
    }

    if diagnostics
        .iter()
        .any(|diag| diag.severity == DiagnosticSeverity::Error)
    {
        process::exit(1);
    }
}

fn read_input(input: Option<PathBuf>) -> String {
    match input {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path.display(), err);
            process::exit(1);
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .unwrap_or_else(|err| {
                    eprintln!("failed to read stdin: {}", err);
                    process::exit(1);
                });
            buffer
        }
    }
}

fn resolve_seed(flag: Option<u64>) -> u64 {
    if let Some(seed) = flag {
        return seed;
    }
    if let Ok(value) = env::var("TOM_SEED") {
        match value.trim().parse() {
            Ok(seed) => return seed,
            Err(err) => {
                eprintln!("TOM_SEED must be an unsigned integer: {}", err);
                process::exit(2);
            }
        }
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        eprintln!("failed to serialize output: {}", err);
        process::exit(1);
    })
}

fn emit_diagnostics(diagnostics: &[Diagnostic], mode: DiagnosticsMode) {
    match mode {
        DiagnosticsMode::Json => eprintln!("{}", to_json(&diagnostics)),
        DiagnosticsMode::Pretty => {
            for diagnostic in diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    match &diagnostic.range {
        Some(range) => format!(
            "{}:{} {} {} {}",
            range.start.line + 1,
            range.start.character + 1,
            severity,
            diagnostic.code,
            diagnostic.message
        ),
        None => format!(
            "{} {} {} ({})",
            severity, diagnostic.code, diagnostic.message, diagnostic.snippet
        ),
    }
}
