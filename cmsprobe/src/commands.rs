use clap::arg;
use cmsprobe_core::lookup::{DEFAULT_INPUT_PATH, DEFAULT_SOCIALS_EXPORT, DEFAULT_TECHNOLOGY_EXPORT};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("cmsprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("cmsprobe")
        .styles(CLAP_STYLING)
        .about(
            "Look up the technologies and social profiles behind a list of URLs using the \
            WhatCMS API, and export them as CSV.",
        )
        .arg(
            arg!(-k --"key" <KEY>)
                .required(false)
                .help("Your WhatCMS API key")
                .default_value(""),
        )
        .arg(
            arg!(-d --"delay" <SECONDS>)
                .required(false)
                .help("Seconds to wait after each request, as required by your API plan")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(-i --"input" <PATH>)
                .required(false)
                .help("Headerless CSV file whose first column holds the URLs to look up")
                .default_value(DEFAULT_INPUT_PATH),
        )
        .arg(
            arg!(--"technology-output" <PATH>)
                .required(false)
                .help("Where to write the technology export")
                .default_value(DEFAULT_TECHNOLOGY_EXPORT),
        )
        .arg(
            arg!(--"socials-output" <PATH>)
                .required(false)
                .help("Where to write the social profile export")
                .default_value(DEFAULT_SOCIALS_EXPORT),
        )
        .arg(
            arg!(--"api-url" <URL>)
                .required(false)
                .help("Override the WhatCMS Tech endpoint (default: https://whatcms.org/API/Tech)")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("30"),
        )
        .arg(
            arg!(-q --"quiet" "Suppress progress output; only the unretrieved list is printed")
                .required(false),
        )
        .arg(arg!(-v --"verbose" "Enable debug logging on stderr").required(false))
}
