pub mod catalog;
pub mod probe;

pub use catalog::{default_catalog, CliDefinition, StatusCheck};
pub use probe::{CliProber, CliProviderStatus, ProviderStatus};
