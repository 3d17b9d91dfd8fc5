use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sprout",
    about = "Sprout - CLI tool for resolving SproutVideo embeds into signed HLS formats",
    version,
    author
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configured default)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Number of retry attempts (overrides the configured default)
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Proxy URL (supports http, https, socks5)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Proxy username (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_username: Option<String>,

    /// Proxy password (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an embed URL into playable formats
    Extract {
        /// The embed URL, or a webpage containing embeds when --discover is set
        #[arg(short, long)]
        url: String,

        /// Treat the URL as a third-party page and resolve every embed found on it
        #[arg(long)]
        discover: bool,

        /// Output format
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// Save output to file
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,

        /// Keep only formats whose id matches this pattern (e.g. "hls-2")
        #[arg(long)]
        format_id: Option<String>,

        /// Only output the highest bitrate format
        #[arg(long, conflicts_with = "select")]
        best: bool,

        /// Pick one format interactively
        #[arg(long)]
        select: bool,

        /// Exclude request headers from output
        #[arg(long)]
        no_headers: bool,
    },

    /// List the embed URLs found on a webpage
    Discover {
        /// The webpage URL
        #[arg(short, long)]
        url: String,

        /// Output format
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Resolve multiple embed URLs from a file
    Batch {
        /// Input file containing URLs (one per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for results
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "json")]
        output_format: OutputFormat,

        /// Maximum concurrent extractions
        #[arg(long)]
        max_concurrent: Option<usize>,
    },

    /// List supported platforms
    Platforms,

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show configuration information
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty-printed human-readable output
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// Compact JSON output
    JsonCompact,
    /// Table format
    Table,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonCompact => write!(f, "json-compact"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let args = Args::try_parse_from([
            "sprout",
            "extract",
            "--url",
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3",
            "--best",
            "-o",
            "json",
            "--retries",
            "0",
        ])
        .unwrap();

        assert_eq!(args.retries, Some(0));
        match args.command {
            Commands::Extract {
                best,
                select,
                output,
                ..
            } => {
                assert!(best);
                assert!(!select);
                assert_eq!(output, Some(OutputFormat::Json));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_best_conflicts_with_select() {
        let result = Args::try_parse_from([
            "sprout", "extract", "--url", "x", "--best", "--select",
        ]);
        assert!(result.is_err());
    }
}
