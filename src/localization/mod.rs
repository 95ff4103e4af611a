//! Localization: supported languages, message catalogs, and the gateway
//! resolving symbolic keys to text in the active language.

pub mod catalog;
pub mod gateway;
pub mod language;

pub use catalog::{Catalog, CatalogSource};
pub use gateway::LocalizationGateway;
pub use language::Language;
