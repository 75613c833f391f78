use clap::ArgMatches;
use cmsprobe_core::lookup::{
    DEFAULT_INPUT_PATH, DEFAULT_SOCIALS_EXPORT, DEFAULT_TECHNOLOGY_EXPORT,
};
use cmsprobe_core::{CoreError, LookupOptions, LookupSummary, execute_lookup, format_unretrieved};
use cmsprobe_scanner::client::{DEFAULT_DELAY_SECS, DEFAULT_TIMEOUT_SECS};
use cmsprobe_scanner::{LookupEvent, ProgressCallback};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Level;
use url::Url;

/// Send tracing output to stderr so stdout only carries progress and results.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Expand a leading `~` in a path argument
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Build lookup options from parsed arguments, falling back to the defaults
/// for anything missing.
pub fn lookup_options_from_matches(matches: &ArgMatches) -> LookupOptions {
    let path_arg = |name: &str, default: &str| {
        expand_path(
            matches
                .get_one::<String>(name)
                .map(String::as_str)
                .unwrap_or(default),
        )
    };

    LookupOptions {
        input: path_arg("input", DEFAULT_INPUT_PATH),
        technology_output: path_arg("technology-output", DEFAULT_TECHNOLOGY_EXPORT),
        socials_output: path_arg("socials-output", DEFAULT_SOCIALS_EXPORT),
        api_key: matches.get_one::<String>("key").cloned().unwrap_or_default(),
        api_url: matches.get_one::<Url>("api-url").cloned(),
        delay: Duration::from_secs(
            matches
                .get_one::<u64>("delay")
                .copied()
                .unwrap_or(DEFAULT_DELAY_SECS),
        ),
        timeout_secs: matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    }
}

/// Human-readable progress line for an event. Failures return `None`: their
/// reason is already logged on stderr.
pub fn format_event(event: &LookupEvent) -> Option<String> {
    match event {
        LookupEvent::Requesting { index, total, url } => Some(format!(
            "{} requesting {}",
            format!("[{}/{}]", index + 1, total).cyan(),
            url.bright_white()
        )),
        LookupEvent::Waiting { delay } => Some(format!(
            "  {}",
            format!("waiting {}s before the next request", delay.as_secs()).dimmed()
        )),
        LookupEvent::Failed { .. } => None,
    }
}

fn progress_callback(pb: ProgressBar, quiet: bool) -> ProgressCallback {
    let failed = Arc::new(AtomicUsize::new(0));

    Arc::new(move |event: LookupEvent| {
        match &event {
            LookupEvent::Requesting { index, total, .. } => {
                pb.set_length(*total as u64);
                pb.set_position(*index as u64);
            }
            LookupEvent::Failed { .. } => {
                let count = failed.fetch_add(1, Ordering::Relaxed) + 1;
                pb.set_message(format!("{} unretrieved", count));
            }
            LookupEvent::Waiting { .. } => {}
        }

        if !quiet && let Some(line) = format_event(&event) {
            pb.suspend(|| println!("{}", line));
        }
    })
}

/// Run the whole pipeline with terminal progress reporting.
pub async fn run_lookup(options: LookupOptions, quiet: bool) -> Result<LookupSummary, CoreError> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let result = execute_lookup(options, Some(progress_callback(pb.clone(), quiet))).await;
    pb.finish_and_clear();

    result
}

pub fn print_summary(summary: &LookupSummary) {
    println!(
        "\n{} Lookup complete: {}/{} retrieved",
        "✓".green().bold(),
        summary.retrieved,
        summary.total
    );
    println!(
        "  {} {} technologies → {}",
        "→".blue(),
        summary.technologies,
        summary.technology_output.display().to_string().bright_white()
    );
    println!(
        "  {} {} socials → {}",
        "→".blue(),
        summary.socials,
        summary.socials_output.display().to_string().bright_white()
    );
    println!();
}

pub async fn handle_lookup(matches: &ArgMatches) {
    let quiet = matches.get_flag("quiet");
    let options = lookup_options_from_matches(matches);

    let summary = match run_lookup(options, quiet).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if !quiet {
        print_summary(&summary);
    }
    print!("{}", format_unretrieved(&summary.unretrieved));
}
