use crate::error::Result;
use crate::export::write_records;
use crate::input::load_urls;
use cmsprobe_scanner::client::{DEFAULT_DELAY_SECS, DEFAULT_TIMEOUT_SECS};
use cmsprobe_scanner::{ProgressCallback, ScanError, WhatCmsClient};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_INPUT_PATH: &str = "imports/urlList.csv";
pub const DEFAULT_TECHNOLOGY_EXPORT: &str = "export/technology.csv";
pub const DEFAULT_SOCIALS_EXPORT: &str = "export/socials.csv";

/// Options for configuring a lookup run
#[derive(Debug, Clone)]
pub struct LookupOptions {
    pub input: PathBuf,
    pub technology_output: PathBuf,
    pub socials_output: PathBuf,
    pub api_key: String,
    /// Endpoint override; the public WhatCMS Tech endpoint when `None`.
    pub api_url: Option<Url>,
    pub delay: Duration,
    pub timeout_secs: u64,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            technology_output: PathBuf::from(DEFAULT_TECHNOLOGY_EXPORT),
            socials_output: PathBuf::from(DEFAULT_SOCIALS_EXPORT),
            api_key: String::new(),
            api_url: None,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSummary {
    pub total: usize,
    pub retrieved: usize,
    pub technologies: usize,
    pub socials: usize,
    pub unretrieved: Vec<String>,
    pub technology_output: PathBuf,
    pub socials_output: PathBuf,
}

pub fn build_client(
    options: &LookupOptions,
    progress_callback: Option<ProgressCallback>,
) -> std::result::Result<WhatCmsClient, ScanError> {
    let mut client = WhatCmsClient::with_timeout(options.api_key.clone(), options.timeout_secs)?
        .with_delay(options.delay);

    if let Some(ref api_url) = options.api_url {
        client = client.with_base_url(api_url.clone());
    }
    if let Some(callback) = progress_callback {
        client = client.with_progress_callback(callback);
    }

    Ok(client)
}

/// Load the URL list, look every URL up, then write both exports.
///
/// Only input and export failures are returned as errors; lookups that fail
/// end up in [`LookupSummary::unretrieved`].
pub async fn execute_lookup(
    options: LookupOptions,
    progress_callback: Option<ProgressCallback>,
) -> Result<LookupSummary> {
    let urls = load_urls(&options.input)?;
    info!("Loaded {} URL(s) from {}", urls.len(), options.input.display());

    let client = build_client(&options, progress_callback)?;
    let results = client.lookup_all(&urls).await;

    write_records(&options.technology_output, &results.technologies)?;
    write_records(&options.socials_output, &results.socials)?;
    info!(
        "Exported {} technologies to {} and {} socials to {}",
        results.technologies.len(),
        options.technology_output.display(),
        results.socials.len(),
        options.socials_output.display()
    );

    Ok(LookupSummary {
        total: urls.len(),
        retrieved: results.retrieved,
        technologies: results.technologies.len(),
        socials: results.socials.len(),
        unretrieved: results.unretrieved,
        technology_output: options.technology_output,
        socials_output: options.socials_output,
    })
}

/// The final listing printed to stdout, one URL per line.
pub fn format_unretrieved(unretrieved: &[String]) -> String {
    let mut report = String::from("unretrieved urls:\n");
    for url in unretrieved {
        report.push_str(url);
        report.push('\n');
    }
    report
}
