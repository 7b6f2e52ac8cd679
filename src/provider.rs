// ☁️ Provider - The fixed set of infrastructure categories
// Every company in the catalog is hosted on exactly one of these

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

// ============================================================================
// PROVIDER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
    Oracle,
    Alibaba,
    /// Self-hosted or not one of the named clouds
    Other,
}

/// The providers behind the headline concentration number
pub const BIG_THREE: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::Aws,
        Provider::Azure,
        Provider::Gcp,
        Provider::Oracle,
        Provider::Alibaba,
        Provider::Other,
    ];

    /// Display label, also the wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Azure => "Azure",
            Provider::Gcp => "GCP",
            Provider::Oracle => "Oracle",
            Provider::Alibaba => "Alibaba",
            Provider::Other => "Other",
        }
    }

    /// Parse a label as returned by a classifier or found in a CSV.
    ///
    /// Matching is case-insensitive and accepts the vendor names people
    /// commonly use instead of the product name ("Amazon", "Microsoft", ...).
    pub fn from_label(label: &str) -> Option<Provider> {
        let lower = label.trim().to_lowercase();

        match lower.as_str() {
            "aws" | "amazon" | "amazon web services" => Some(Provider::Aws),
            "azure" | "microsoft" | "microsoft azure" => Some(Provider::Azure),
            "gcp" | "google" | "gcloud" | "google cloud" | "google cloud platform" => {
                Some(Provider::Gcp)
            }
            "oracle" | "oci" | "oracle cloud" => Some(Provider::Oracle),
            "alibaba" | "aliyun" | "alibaba cloud" => Some(Provider::Alibaba),
            "other" | "self-hosted" | "self hosted" | "selfhosted" => Some(Provider::Other),
            _ => None,
        }
    }

    /// Brand color used by the chart, the pills and the grid borders
    pub fn color_hex(&self) -> &'static str {
        match self {
            Provider::Aws => "#ff9900",
            Provider::Azure => "#0089d6",
            Provider::Gcp => "#4285f4",
            Provider::Oracle => "#f80000",
            Provider::Alibaba => "#ff6a00",
            Provider::Other => "#6b7280",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Provider::Aws => (0xff, 0x99, 0x00),
            Provider::Azure => (0x00, 0x89, 0xd6),
            Provider::Gcp => (0x42, 0x85, 0xf4),
            Provider::Oracle => (0xf8, 0x00, 0x00),
            Provider::Alibaba => (0xff, 0x6a, 0x00),
            Provider::Other => (0x6b, 0x72, 0x80),
        }
    }

    /// Vendor logo for the filter pill. `Other` has no logo.
    pub fn logo_url(&self) -> Option<&'static str> {
        match self {
            Provider::Aws => Some("https://upload.wikimedia.org/wikipedia/commons/9/93/Amazon_Web_Services_Logo.svg"),
            Provider::Azure => Some("https://upload.wikimedia.org/wikipedia/commons/a/a8/Microsoft_Azure_Logo.svg"),
            Provider::Gcp => Some("https://upload.wikimedia.org/wikipedia/commons/5/51/Google_Cloud_logo.svg"),
            Provider::Oracle => Some("https://upload.wikimedia.org/wikipedia/commons/5/50/Oracle_logo.svg"),
            Provider::Alibaba => Some("https://upload.wikimedia.org/wikipedia/commons/0/0e/Alibaba_Cloud_logo.png"),
            Provider::Other => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::from_label(s).ok_or_else(|| CatalogError::UnknownProvider(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_labels() {
        assert_eq!(Provider::Aws.as_str(), "AWS");
        assert_eq!(Provider::Azure.as_str(), "Azure");
        assert_eq!(Provider::Gcp.as_str(), "GCP");
        assert_eq!(Provider::Oracle.as_str(), "Oracle");
        assert_eq!(Provider::Alibaba.as_str(), "Alibaba");
        assert_eq!(Provider::Other.as_str(), "Other");
    }

    #[test]
    fn test_from_label_round_trips_display() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_label(provider.as_str()), Some(provider));
        }
    }

    #[test]
    fn test_from_label_aliases_and_case() {
        assert_eq!(Provider::from_label("aws"), Some(Provider::Aws));
        assert_eq!(Provider::from_label("  Amazon "), Some(Provider::Aws));
        assert_eq!(Provider::from_label("MICROSOFT"), Some(Provider::Azure));
        assert_eq!(Provider::from_label("Google Cloud"), Some(Provider::Gcp));
        assert_eq!(Provider::from_label("OCI"), Some(Provider::Oracle));
        assert_eq!(Provider::from_label("aliyun"), Some(Provider::Alibaba));
        assert_eq!(Provider::from_label("self-hosted"), Some(Provider::Other));
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(Provider::from_label("Hetzner"), None);
        assert!("DigitalOcean".parse::<Provider>().is_err());
    }

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&Provider::Gcp).unwrap();
        assert_eq!(json, "\"GCP\"");

        let parsed: Provider = serde_json::from_str("\"AWS\"").unwrap();
        assert_eq!(parsed, Provider::Aws);
    }

    #[test]
    fn test_only_other_has_no_logo() {
        for provider in Provider::ALL {
            assert_eq!(provider.logo_url().is_none(), provider == Provider::Other);
        }
    }

    #[test]
    fn test_rgb_matches_hex() {
        for provider in Provider::ALL {
            let (r, g, b) = provider.rgb();
            assert_eq!(format!("#{:02x}{:02x}{:02x}", r, g, b), provider.color_hex());
        }
    }
}
