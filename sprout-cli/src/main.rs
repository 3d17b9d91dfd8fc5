mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::{CommandExecutor, Selection},
    config::AppConfig,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use sprout_parser::extractor::ProxyConfig;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("Application error: {}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    // Load configuration
    let config = AppConfig::load(args.config.as_deref())?;

    info!("Starting sprout with config: {:?}", config);

    let proxy_config = args.proxy.map(|url| ProxyConfig {
        url,
        username: args.proxy_username,
        password: args.proxy_password,
    });

    // Execute command
    match args.command {
        Commands::Extract {
            url,
            discover,
            output,
            output_file,
            format_id,
            best,
            select,
            no_headers,
        } => {
            let include_headers = config.include_headers && !no_headers;
            let selection = if best {
                Selection::Best
            } else if select {
                Selection::Interactive
            } else {
                Selection::All
            };

            let executor = CommandExecutor::new(config, proxy_config, args.timeout, args.retries)?;
            executor
                .extract_single(
                    &url,
                    discover,
                    output_file.as_deref(),
                    format_id.as_deref(),
                    selection,
                    include_headers,
                    output,
                )
                .await?;
        }

        Commands::Discover { url, output } => {
            let executor = CommandExecutor::new(config, proxy_config, args.timeout, args.retries)?;
            executor.discover(&url, output).await?;
        }

        Commands::Batch {
            input,
            output_dir,
            output_format,
            max_concurrent,
        } => {
            let executor = CommandExecutor::new(config, proxy_config, args.timeout, args.retries)?;
            executor
                .batch_process(&input, output_dir.as_deref(), max_concurrent, output_format)
                .await?;
        }

        Commands::Platforms => {
            let executor = CommandExecutor::new(config, proxy_config, args.timeout, args.retries)?;
            executor.list_platforms();
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }

        Commands::Config { show, reset } => {
            if reset {
                AppConfig::reset(args.config.as_deref())?;
                println!("✓ Configuration reset to defaults");
            } else if show {
                println!("{}", config.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_level(verbose).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
