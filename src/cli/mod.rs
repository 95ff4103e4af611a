//! CLI module for pairsync.
//!
//! Parses the command line before anything else starts:
//!
//! ```ignore
//! use pairsync::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => println!("{}", version_line()),
//!     CliCommand::Help => println!("{}", USAGE),
//!     CliCommand::Run(overrides) => run(overrides)?,
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, RunOverrides, USAGE};
pub use version::{version_line, VERSION};
