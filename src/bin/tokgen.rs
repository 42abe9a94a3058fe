//! Build-time token generator for the Sintra design system.
//!
//! Renders a token source document into `base.css` (CSS custom properties)
//! and `themes.json` (fully resolved theme variants). Defaults to the
//! embedded canonical source so a plain `tokgen` regenerates the shipped
//! artifacts.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use sintra_theming::errors::ThemeError;
use sintra_theming::generator;
use sintra_theming::tokens::{canonical_tree, parse_token_tree};
use sintra_theming::types::TokenTree;

#[derive(Parser, Debug)]
#[command(
    name = "tokgen",
    version,
    about = "Generate the Sintra stylesheet and resolved theme manifest from a design token source"
)]
struct Cli {
    /// Token source file; the embedded canonical source is used when absent.
    #[arg(long, value_name = "FILE")]
    tokens: Option<PathBuf>,

    /// Output directory for base.css and themes.json.
    #[arg(long, value_name = "DIR", default_value = "generated")]
    out_dir: PathBuf,

    /// Increase log verbosity (-d: info, -dd: debug, -ddd: trace).
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ThemeError> {
    let loaded;
    let tree: &TokenTree = match &cli.tokens {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| ThemeError::Io {
                path: path.display().to_string(),
                source_error: e,
            })?;
            loaded = parse_token_tree(&path.display().to_string(), &content)?;
            &loaded
        }
        None => canonical_tree(),
    };

    generator::write_outputs(&cli.out_dir, tree)
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
