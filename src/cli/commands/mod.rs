pub mod auth;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use url::Url;

/// Check that the DSN is a URL before trying to connect with it.
///
/// # Errors
/// Returns an error string if `dsn` does not parse as a URL.
pub fn validator_dsn(dsn: &str) -> Result<String, String> {
    Url::parse(dsn)
        .map(|_| dsn.to_string())
        .map_err(|err| format!("invalid DSN: {err}"))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("iwonder")
        .about("Q&A forum backend")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("IWONDER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("IWONDER_DSN")
                .value_parser(validator_dsn)
                .required(true),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}
