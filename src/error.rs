//! Error types for the explorer.

use thiserror::Error;

/// Problems with catalog data (built-in list or a CSV override)
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Duplicate domain in catalog: {0}")]
    DuplicateDomain(String),

    #[error("Company name is empty (domain: {domain})")]
    EmptyName { domain: String },

    #[error("Company domain is empty (name: {name})")]
    EmptyDomain { name: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to the provider classifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Classifier returned HTTP {0}")]
    Status(u16),

    #[error("Malformed classifier response: {0}")]
    MalformedBody(String),
}

/// Why an add-company submission did not produce a record.
///
/// The `Display` text is what the user sees inline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddCompanyError {
    #[error("Enter a URL or domain")]
    EmptyInput,

    #[error("Not a valid URL or domain: {0}")]
    InvalidUrl(String),

    #[error("Company already exists")]
    AlreadyExists { domain: String },

    #[error("Detection already in progress")]
    DetectionInProgress,

    #[error("Failed to detect cloud provider. Please try again.")]
    ClassificationFailed(ClassifierError),
}

impl AddCompanyError {
    /// Short machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            AddCompanyError::EmptyInput => "empty_input",
            AddCompanyError::InvalidUrl(_) => "invalid_url",
            AddCompanyError::AlreadyExists { .. } => "already_exists",
            AddCompanyError::DetectionInProgress => "detection_in_progress",
            AddCompanyError::ClassificationFailed(_) => "classification_failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
