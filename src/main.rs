use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evtflat::prelude::*;

/// Flatten MC particles, PFOs and their truth links into the evtdata tuple.
#[derive(Debug, Parser)]
#[command(name = "evtflat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-lines file of run headers and events.
    input: PathBuf,

    /// TOML steering file with the processor parameters.
    #[arg(long, short, env = "EVTFLAT_STEERING")]
    steering: Option<PathBuf>,

    /// Output file, overriding `OutputRootFileName`. The extension selects ROOT or Parquet.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.steering {
        Some(path) => FlattenerConfig::load(path)?,
        None => FlattenerConfig::default(),
    };
    if let Some(output) = cli.output {
        config.output_file = output;
    }

    let records = RecordReader::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let mut processor = EventFlattener::new(config);
    run(&mut processor, records)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags() {
        let cli = Cli::parse_from([
            "evtflat",
            "--steering",
            "steer.toml",
            "-o",
            "out.parquet",
            "events.jsonl",
        ]);
        assert_eq!(cli.input, PathBuf::from("events.jsonl"));
        assert_eq!(cli.steering, Some(PathBuf::from("steer.toml")));
        assert_eq!(cli.output, Some(PathBuf::from("out.parquet")));
    }
}
