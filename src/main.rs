use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qt-faststart")]
#[command(author, version, about = "Move the moov atom of a QuickTime/MP4 file to the front")]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Output file (left absent when there is nothing to do)
    #[arg(required_unless_present = "check")]
    output: Option<PathBuf>,

    /// Only report whether the input is already fast start
    #[arg(long)]
    check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "qtfaststart=debug,qt_faststart=debug".to_string()
        } else {
            "qtfaststart=info,qt_faststart=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.check {
        let enabled = qtfaststart::is_fast_start_enabled(&cli.input)
            .with_context(|| format!("Failed to scan {}", cli.input.display()))?;
        println!(
            "{}: {}",
            cli.input.display(),
            if enabled { "fast start" } else { "not fast start" }
        );
        return Ok(());
    }

    let Some(output) = cli.output else {
        anyhow::bail!("input file and output file are required");
    };

    let relocated = qtfaststart::fast_start(&cli.input, &output).with_context(|| {
        format!(
            "Failed to rewrite {} to {}",
            cli.input.display(),
            output.display()
        )
    })?;

    if relocated {
        tracing::info!("Wrote {}", output.display());
    } else {
        tracing::info!(
            "{} needs no fast start rewrite, no output written",
            cli.input.display()
        );
    }

    Ok(())
}
