// Cloud Dependency Explorer - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod provider;
pub mod catalog;
pub mod aggregate;
pub mod filter;
pub mod domain;
pub mod add_flow;
pub mod classifier;
pub mod logo;
pub mod config;
pub mod error;
pub mod explorer;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use provider::{Provider, BIG_THREE};
pub use catalog::{Catalog, CompanyRecord, SessionCatalog, CUSTOM_SYMBOL};
pub use aggregate::{
    aggregate, big_three_share, DashboardStats, ProviderAggregate, ProviderShare,
};
pub use filter::{visible, FilterState};
pub use domain::{derive_name, looks_like_domain, normalize_domain};
pub use add_flow::{AddCompanyFlow, AddFlowState, Completion, PendingDetection};
pub use classifier::{DetectRequest, DetectResponse, HttpClassifier, ProviderClassifier};
pub use logo::{company_logo_chain, provider_logo_chain, LogoCandidate, LogoSource};
pub use config::Config;
pub use error::{AddCompanyError, CatalogError, ClassifierError, ConfigError};
pub use explorer::Explorer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
