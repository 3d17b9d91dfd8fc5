use crate::{
    cli::OutputFormat,
    config::AppConfig,
    error::{CliError, Result},
    output::{OutputManager, write_output},
};
#[cfg(feature = "colored-output")]
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "regex-filters")]
use regex::Regex;
use sprout_parser::{
    extractor::{
        ProxyConfig, error::ExtractorError, factory::ExtractorFactory, factory_with_proxy,
    },
    media::{FormatDescriptor, PlaybackDescriptor},
};
use std::{path::Path, sync::Arc, time::Duration};
use tokio::{
    sync::Semaphore,
    time::{sleep, timeout},
};
use tracing::{debug, warn};

type BatchResultTuple = (usize, String, Result<PlaybackDescriptor>);

/// How the formats of a resolved video are narrowed down before output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Best,
    Interactive,
}

pub struct CommandExecutor {
    config: AppConfig,
    extractor_factory: Arc<ExtractorFactory>,
    timeout: Duration,
    retries: u32,
}

impl CommandExecutor {
    pub fn new(
        config: AppConfig,
        proxy_config: Option<ProxyConfig>,
        timeout: Option<u64>,
        retries: Option<u32>,
    ) -> Result<Self> {
        let proxy_config = proxy_config.or_else(|| {
            config.default_proxy.as_ref().map(|url| ProxyConfig {
                url: url.clone(),
                username: config.default_proxy_username.clone(),
                password: config.default_proxy_password.clone(),
            })
        });

        let extractor_factory = Arc::new(factory_with_proxy(proxy_config)?);
        let timeout = Duration::from_secs(timeout.unwrap_or(config.default_timeout));
        let retries = retries.unwrap_or(config.default_retries);

        Ok(Self {
            config,
            extractor_factory,
            timeout,
            retries,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn extract_single(
        &self,
        url: &str,
        discover: bool,
        output_file: Option<&Path>,
        format_id: Option<&str>,
        selection: Selection,
        include_headers: bool,
        output_format: Option<OutputFormat>,
    ) -> Result<()> {
        let urls = if discover {
            let pb = self.create_progress_bar("Discovering embeds...");
            let urls = self.extractor_factory.discover(url).await;
            pb.finish_and_clear();
            urls?
        } else {
            vec![url.to_string()]
        };

        let output_format = output_format.unwrap_or(self.config.default_output_format.clone());
        let output_manager = OutputManager::new(self.config.colored_output);
        let mut output = String::new();

        for embed_url in &urls {
            let pb = self.create_progress_bar(&format!("Resolving {embed_url}..."));
            let result = self.extract_with_retry(embed_url).await;
            pb.finish_and_clear();

            let mut descriptor = match result {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    #[cfg(feature = "colored-output")]
                    {
                        eprintln!("{}", e.to_string().red());
                    }
                    #[cfg(not(feature = "colored-output"))]
                    {
                        eprintln!("{}", e);
                    }
                    return Err(e);
                }
            };

            if descriptor.has_formats() {
                self.narrow_formats(&mut descriptor, format_id, selection)?;
            } else {
                warn!("No formats could be read for {}", embed_url);
            }

            output.push_str(&output_manager.format_descriptor(
                &descriptor,
                &output_format,
                include_headers,
            )?);
        }

        write_output(&output, output_file)?;
        Ok(())
    }

    pub async fn discover(&self, url: &str, output_format: Option<OutputFormat>) -> Result<()> {
        let pb = self.create_progress_bar("Discovering embeds...");
        let urls = self.extractor_factory.discover(url).await;
        pb.finish_and_clear();

        let output_format = output_format.unwrap_or(self.config.default_output_format.clone());
        let output = OutputManager::new(self.config.colored_output)
            .format_embeds(&urls?, &output_format)?;
        write_output(&output, None)
    }

    pub async fn batch_process(
        &self,
        input_file: &Path,
        output_dir: Option<&Path>,
        max_concurrent: Option<usize>,
        output_format: OutputFormat,
    ) -> Result<()> {
        let content = std::fs::read_to_string(input_file)?;
        let urls = parse_url_list(&content);

        if urls.is_empty() {
            return Err(CliError::invalid_input("No valid URLs found in input file"));
        }

        let pb = Arc::new(ProgressBar::new(urls.len() as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }

        let concurrency = max_concurrent.unwrap_or(self.config.max_concurrent).max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = Vec::new();

        for (index, url) in urls.into_iter().enumerate() {
            let pb = Arc::clone(&pb);
            let permit = semaphore.clone().acquire_owned().await?;
            let factory = Arc::clone(&self.extractor_factory);
            let timeout_duration = self.timeout;
            let retries = self.retries;

            let task = tokio::spawn(async move {
                let _permit = permit;

                pb.set_message(format!("Processing: {url}"));
                let result = resolve_with_retry(&factory, &url, timeout_duration, retries).await;
                pb.inc(1);
                (index, url, result)
            });

            tasks.push(task);
        }

        let mut results: Vec<BatchResultTuple> = Vec::new();
        for task in tasks {
            match task.await {
                Ok(result) => results.push(result),
                Err(e) => return Err(CliError::invalid_input(e.to_string())),
            }
        }

        pb.finish_with_message("Batch processing completed");

        match &output_format {
            OutputFormat::Json | OutputFormat::JsonCompact => {
                self.output_batch_json(&results, output_dir, &output_format)?;
            }
            _ => {
                self.output_batch_summary(&results, output_dir)?;
            }
        }

        Ok(())
    }

    pub fn list_platforms(&self) {
        #[cfg(feature = "colored-output")]
        let title = if self.config.colored_output {
            "Supported Platforms:".green().bold().to_string()
        } else {
            "Supported Platforms:".to_string()
        };

        #[cfg(not(feature = "colored-output"))]
        let title = "Supported Platforms:".to_string();

        println!("{title}");

        for (name, pattern) in ExtractorFactory::supported_platforms() {
            #[cfg(feature = "colored-output")]
            {
                if self.config.colored_output {
                    println!("  {} - {}", name.cyan().bold(), pattern.blue());
                } else {
                    println!("  {name} - {pattern}");
                }
            }

            #[cfg(not(feature = "colored-output"))]
            {
                println!("  {name} - {pattern}");
            }
        }
    }

    fn create_progress_bar(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(500));
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(message.to_string());
        pb
    }

    async fn extract_with_retry(&self, url: &str) -> Result<PlaybackDescriptor> {
        resolve_with_retry(&self.extractor_factory, url, self.timeout, self.retries).await
    }

    /// Applies the format id filter and the selection to a descriptor with formats.
    fn narrow_formats(
        &self,
        descriptor: &mut PlaybackDescriptor,
        format_id: Option<&str>,
        selection: Selection,
    ) -> Result<()> {
        let formats = std::mem::take(&mut descriptor.formats);
        let formats = apply_filter(formats, format_id)?;
        descriptor.formats = match selection {
            Selection::All => formats,
            Selection::Best => vec![select_best(formats)?],
            Selection::Interactive => vec![self.interactive_select_format(formats)?],
        };
        Ok(())
    }

    fn interactive_select_format(
        &self,
        formats: Vec<FormatDescriptor>,
    ) -> Result<FormatDescriptor> {
        if formats.is_empty() {
            return Err(CliError::no_formats_found());
        }

        #[cfg(feature = "interactive")]
        {
            let options: Vec<String> = formats
                .iter()
                .enumerate()
                .map(|(i, format)| format!("{}: {}", i + 1, format))
                .collect();

            let selection = inquire::Select::new("Select a format:", options)
                .prompt()
                .map_err(|_| CliError::user_cancelled())?;

            let index = selection
                .split(':')
                .next()
                .and_then(|s| s.parse::<usize>().ok())
                .and_then(|i| i.checked_sub(1))
                .ok_or_else(|| CliError::invalid_input("Invalid selection"))?;

            formats
                .into_iter()
                .nth(index)
                .ok_or_else(|| CliError::invalid_input("Invalid format index"))
        }

        #[cfg(not(feature = "interactive"))]
        {
            // Fallback: pick the best format if interactive feature is disabled
            select_best(formats)
        }
    }

    fn output_batch_json(
        &self,
        results: &[BatchResultTuple],
        output_dir: Option<&Path>,
        output_format: &OutputFormat,
    ) -> Result<()> {
        let json_results: Vec<serde_json::Value> = results
            .iter()
            .map(|(index, url, result)| match result {
                Ok(descriptor) => {
                    serde_json::json!({
                        "index": index,
                        "url": url,
                        "status": "success",
                        "descriptor": descriptor,
                    })
                }
                Err(e) => {
                    serde_json::json!({
                        "index": index,
                        "url": url,
                        "status": "error",
                        "error": e.to_string()
                    })
                }
            })
            .collect();

        let output = match output_format {
            OutputFormat::Json => serde_json::to_string_pretty(&json_results)?,
            _ => serde_json::to_string(&json_results)?,
        };

        let output_file = output_dir.map(|dir| dir.join("batch_results.json"));
        write_output(&output, output_file.as_deref())
    }

    fn output_batch_summary(
        &self,
        results: &[BatchResultTuple],
        output_dir: Option<&Path>,
    ) -> Result<()> {
        let summary = batch_summary(results);
        let output_file = output_dir.map(|dir| dir.join("batch_summary.txt"));
        write_output(&summary, output_file.as_deref())
    }
}

/// Network failures may succeed on a later attempt; anything else is a property
/// of the page or payload and fails the same way every time.
fn is_retryable(error: &ExtractorError) -> bool {
    matches!(error, ExtractorError::HttpError(_))
}

/// Resolves `url`, retrying network failures and timeouts with exponential backoff.
async fn resolve_with_retry(
    factory: &ExtractorFactory,
    url: &str,
    timeout_duration: Duration,
    retries: u32,
) -> Result<PlaybackDescriptor> {
    let extractor = factory.create_extractor(url)?;
    let mut last_error: Option<CliError> = None;

    for attempt in 0..=retries {
        match timeout(timeout_duration, extractor.extract()).await {
            Ok(Ok(descriptor)) => return Ok(descriptor),
            Ok(Err(e)) if is_retryable(&e) => {
                warn!("Attempt {} for {} failed: {}", attempt + 1, url, e);
                last_error = Some(e.into());
            }
            Ok(Err(e)) => {
                debug!("Not retrying {}: {}", url, e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Attempt {} for {} timed out", attempt + 1, url);
                last_error = Some(CliError::timeout(timeout_duration.as_secs()));
            }
        }

        if attempt < retries {
            let delay = Duration::from_millis(1000 * (1 << attempt.min(6)));
            debug!("Retrying {} in {:?}", url, delay);
            sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| CliError::timeout(timeout_duration.as_secs())))
}

fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}

fn apply_filter(
    formats: Vec<FormatDescriptor>,
    format_id: Option<&str>,
) -> Result<Vec<FormatDescriptor>> {
    let Some(filter) = format_id else {
        return Ok(formats);
    };

    #[cfg(feature = "regex-filters")]
    let matches = {
        let filter_regex = Regex::new(filter)
            .map_err(|e| CliError::invalid_filter(format!("Invalid format id regex: {e}")))?;
        move |format: &FormatDescriptor| filter_regex.is_match(&format.format_id)
    };

    #[cfg(not(feature = "regex-filters"))]
    let matches = |format: &FormatDescriptor| format.format_id.contains(filter);

    let formats: Vec<_> = formats.into_iter().filter(|f| matches(f)).collect();
    if formats.is_empty() {
        return Err(CliError::invalid_filter("No formats match the specified filter"));
    }
    Ok(formats)
}

fn select_best(formats: Vec<FormatDescriptor>) -> Result<FormatDescriptor> {
    formats
        .into_iter()
        .max_by(|a, b| a.tbr.unwrap_or(0.0).total_cmp(&b.tbr.unwrap_or(0.0)))
        .ok_or_else(CliError::no_formats_found)
}

fn batch_summary(results: &[BatchResultTuple]) -> String {
    let mut summary = String::new();

    summary.push_str("=== Batch Processing Summary ===\n\n");

    let successful = results.iter().filter(|(_, _, r)| r.is_ok()).count();
    let failed = results.len() - successful;

    summary.push_str(&format!("Total URLs: {}\n", results.len()));
    summary.push_str(&format!("Successful: {successful}\n"));
    summary.push_str(&format!("Failed: {failed}\n\n"));

    for (index, url, result) in results {
        let status_line = match result {
            Ok(descriptor) => format!(
                "[{}] ✓ SUCCESS: {} ({} formats)",
                index + 1,
                url,
                descriptor.formats.len()
            ),
            Err(e) => format!("[{}] ✗ ERROR for URL {url}: {e}", index + 1),
        };
        summary.push_str(&status_line);
        summary.push('\n');
    }

    summary
}
