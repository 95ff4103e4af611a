//! Version command for the pairsync CLI.

/// The current version of pairsync, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line printed by `--version`.
pub fn version_line() -> String {
    format!("pairsync {}", VERSION)
}
