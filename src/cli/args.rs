//! Command-line argument parsing for pairsync.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use thiserror::Error;

/// Settings given on the command line; each one overrides the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub url: Option<String>,
    pub user_id: Option<String>,
    pub families: Option<String>,
    pub locales: Option<String>,
    pub language: Option<String>,
    pub policy: Option<String>,
}

impl RunOverrides {
    pub fn is_empty(&self) -> bool {
        *self == RunOverrides::default()
    }
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Keep the secret pairs in sync (default)
    Run(RunOverrides),
}

/// Errors in the command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),

    #[error("missing value for '{0}'")]
    MissingValue(String),
}

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: pairsync [OPTIONS]

Options:
  --url <URL>          WebSocket URL of the rotation server
  --user <ID>          User whose secret pairs are displayed
  --family <FAMILY>    passkeys, passwords or all
  --locales <DIR|URL>  Where the message catalogs are loaded from
  --lang <TAG>         Preferred language (fr, en)
  --policy <POLICY>    Countdown policy: client-only or per-side
  -V, --version        Print version
  -h, --help           Print this help

Every option can also be set with a PAIRSYNC_* environment variable.";

/// Parse command-line arguments and return the appropriate command.
///
/// Options take their value either as the next argument or inline
/// (`--user=42`).
///
/// # Examples
///
/// ```
/// use pairsync::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["pairsync".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut overrides = RunOverrides::default();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg.clone(), None),
        };

        let slot = match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--url" => &mut overrides.url,
            "--user" => &mut overrides.user_id,
            "--family" => &mut overrides.families,
            "--locales" => &mut overrides.locales,
            "--lang" => &mut overrides.language,
            "--policy" => &mut overrides.policy,
            _ => return Err(ArgsError::UnknownArgument(arg)),
        };

        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .filter(|value| !value.starts_with("--"))
                .ok_or_else(|| ArgsError::MissingValue(flag.clone()))?,
        };
        *slot = Some(value);
    }

    Ok(CliCommand::Run(overrides))
}
