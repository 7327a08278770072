mod cmd_download;
mod cmd_generate;
mod cmd_list;

use anyhow::Result;
use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser, Subcommand};
use specpath::v1::DEFAULT_MAX_VERSIONS;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "specpath")]
#[command(about = "Mine OpenAPI documents from git history and build a versioned example corpus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save every distinct specification version found in a repository's history
    Download {
        #[command(flatten)]
        source: cmd_download::RepoSource,

        /// Layout directory to write into
        #[arg(short, long, default_value = "downloaded_apis")]
        output: PathBuf,

        /// Versions to keep per API
        #[arg(
            short = 'n',
            long,
            default_value_t = DEFAULT_MAX_VERSIONS,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..)
        )]
        max_versions: usize,
    },
    /// Aggregate a layout directory into data/api-data.json
    Generate {
        /// Layout directory produced by `download`
        #[arg(short, long)]
        input: PathBuf,

        /// Output root; the corpus is written to <output>/data/api-data.json
        #[arg(short, long, default_value = "dist")]
        output: PathBuf,

        /// Write single-line JSON instead of indented
        #[arg(long)]
        compact: bool,
    },
    /// List APIs and versions in a layout directory or corpus file
    List {
        /// Layout directory or api-data.json
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Download {
            source,
            output,
            max_versions,
        } => cmd_download::run(source, output, max_versions),
        Commands::Generate {
            input,
            output,
            compact,
        } => cmd_generate::run(input, output, compact),
        Commands::List { input, json } => cmd_list::run(input, json),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_defaults() {
        let cli = Cli::try_parse_from(["specpath", "download", "-r", "."]).unwrap();
        match cli.command {
            Commands::Download {
                output,
                max_versions,
                ..
            } => {
                assert_eq!(output, PathBuf::from("downloaded_apis"));
                assert_eq!(max_versions, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_download_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["specpath", "download"]).is_err());
        assert!(
            Cli::try_parse_from(["specpath", "download", "-r", ".", "-u", "https://x/y.git"])
                .is_err()
        );
    }

    #[test]
    fn test_download_rejects_zero_cap() {
        assert!(Cli::try_parse_from(["specpath", "download", "-r", ".", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["specpath", "download", "-r", ".", "-n", "1"]).is_ok());
    }

    #[test]
    fn test_generate_requires_input() {
        assert!(Cli::try_parse_from(["specpath", "generate"]).is_err());
        let cli = Cli::try_parse_from(["specpath", "-vv", "generate", "-i", "in"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                input,
                output,
                compact,
            } => {
                assert_eq!(input, PathBuf::from("in"));
                assert_eq!(output, PathBuf::from("dist"));
                assert!(!compact);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
