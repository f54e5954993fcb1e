use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use cxxdecl::{ParseOptions, dump, parse_file};
use tracing_subscriber::EnvFilter;

/// Print the declarations of a C++ header.
#[derive(ClapParser, Debug)]
#[command(name = "cxxdecl", version)]
struct Cli {
    /// Header to parse
    header: PathBuf,

    /// Include search path
    #[arg(short = 'I', value_name = "DIR", action = clap::ArgAction::Append)]
    include_dirs: Vec<PathBuf>,

    /// Define a macro
    #[arg(short = 'D', value_name = "NAME[=VALUE]", action = clap::ArgAction::Append)]
    defines: Vec<String>,

    /// Undefine a macro
    #[arg(short = 'U', value_name = "NAME", action = clap::ArgAction::Append)]
    undefines: Vec<String>,

    /// Read macros from FILE before the header
    #[arg(long, value_name = "FILE")]
    imacros: Vec<PathBuf>,

    /// Hints file with array sizes for return values
    #[arg(long, value_name = "FILE")]
    hints: Option<PathBuf>,

    /// List every defined macro, not only the header's
    #[arg(long)]
    dump_macros: bool,

    /// Read included headers for their macros
    #[arg(long)]
    follow_includes: bool,

    /// Skip declarations that fail to parse
    #[arg(long)]
    lenient: bool,

    /// Namespace of validated attributes
    #[arg(long, value_name = "NAME")]
    attribute_namespace: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> ParseOptions {
        let mut options = ParseOptions {
            include_dirs: self.include_dirs.clone(),
            defines: self.defines.clone(),
            undefines: self.undefines.clone(),
            imacros: self.imacros.clone(),
            dump_macros: self.dump_macros,
            follow_includes: self.follow_includes,
            recover: self.lenient,
            hints: self.hints.clone(),
            ..ParseOptions::default()
        };
        if let Some(namespace) = &self.attribute_namespace {
            options.attribute_namespace = namespace.clone();
        }
        options
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the header parsed without skipped declarations.
fn run(cli: &Cli) -> Result<bool> {
    let parsed = parse_file(&cli.header, &cli.options())
        .with_context(|| format!("failed to parse {}", cli.header.display()))?;

    print!("{}", dump(&parsed.file));
    for error in parsed.errors.iter() {
        eprintln!("{}: skipped: {error}", cli.header.display());
    }
    Ok(parsed.errors.is_empty())
}
