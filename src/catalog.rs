// 📇 Catalog - Curated companies and the cloud they run on
// Base list is immutable; each session appends to its own list on top of it
//
// Identity: domain (unique across base + appended)
// Values: name, symbol, provider

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::provider::Provider;

/// Symbol given to companies added during a session
pub const CUSTOM_SYMBOL: &str = "CUSTOM";

// ============================================================================
// COMPANY RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Display name
    pub name: String,

    /// Ticker-like symbol, shared by brands of the same parent (e.g. BABA)
    pub symbol: String,

    /// Canonical host, the identity key
    pub domain: String,

    pub provider: Provider,
}

impl CompanyRecord {
    pub fn new(name: &str, symbol: &str, domain: &str, provider: Provider) -> Self {
        CompanyRecord {
            name: name.to_string(),
            symbol: symbol.to_string(),
            domain: domain.to_string(),
            provider,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.symbol == CUSTOM_SYMBOL
    }
}

/// CSV row shape. Provider stays a string so aliases and typos get a
/// proper `UnknownProvider` error instead of a serde message.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    name: String,
    symbol: String,
    domain: String,
    provider: String,
}

// ============================================================================
// BUILT-IN DATA
// ============================================================================

/// Well-known companies with their cloud providers, based on public
/// information and reports.
const BUILTIN: &[(&str, &str, &str, Provider)] = &[
    // AWS
    ("Netflix", "NFLX", "netflix.com", Provider::Aws),
    ("Airbnb", "ABNB", "airbnb.com", Provider::Aws),
    ("Twitch", "AMZN", "twitch.tv", Provider::Aws),
    ("Adobe", "ADBE", "adobe.com", Provider::Aws),
    ("Salesforce", "CRM", "salesforce.com", Provider::Aws),
    ("Expedia", "EXPE", "expedia.com", Provider::Aws),
    ("Nasdaq", "NDAQ", "nasdaq.com", Provider::Aws),
    ("General Electric", "GE", "ge.com", Provider::Aws),
    ("BMW", "BMW", "bmw.com", Provider::Aws),
    ("Shell", "SHEL", "shell.com", Provider::Aws),
    ("Johnson & Johnson", "JNJ", "jnj.com", Provider::Aws),
    ("Pfizer", "PFE", "pfizer.com", Provider::Aws),
    ("Moderna", "MRNA", "modernatx.com", Provider::Aws),
    ("Coca-Cola", "KO", "coca-cola.com", Provider::Aws),
    ("Nike", "NKE", "nike.com", Provider::Aws),
    ("McDonald's", "MCD", "mcdonalds.com", Provider::Aws),
    ("Capital One", "COF", "capitalone.com", Provider::Aws),
    ("Intuit", "INTU", "intuit.com", Provider::Aws),
    ("Comcast", "CMCSA", "comcast.com", Provider::Aws),
    ("Disney", "DIS", "disney.com", Provider::Aws),
    ("Electronic Arts", "EA", "ea.com", Provider::Aws),
    ("Slack", "WORK", "slack.com", Provider::Aws),
    ("Dropbox", "DBX", "dropbox.com", Provider::Aws),
    ("Lyft", "LYFT", "lyft.com", Provider::Aws),
    ("Zillow", "Z", "zillow.com", Provider::Aws),
    ("Coinbase", "COIN", "coinbase.com", Provider::Aws),
    ("Reddit", "RDDT", "reddit.com", Provider::Aws),
    ("Twilio", "TWLO", "twilio.com", Provider::Aws),
    // GCP
    ("Spotify", "SPOT", "spotify.com", Provider::Gcp),
    ("Twitter/X", "X", "twitter.com", Provider::Gcp),
    ("Snap", "SNAP", "snap.com", Provider::Gcp),
    ("PayPal", "PYPL", "paypal.com", Provider::Gcp),
    ("Shopify", "SHOP", "shopify.com", Provider::Gcp),
    ("Target", "TGT", "target.com", Provider::Gcp),
    ("Home Depot", "HD", "homedepot.com", Provider::Gcp),
    ("Best Buy", "BBY", "bestbuy.com", Provider::Gcp),
    ("Etsy", "ETSY", "etsy.com", Provider::Gcp),
    ("Wayfair", "W", "wayfair.com", Provider::Gcp),
    ("Kroger", "KR", "kroger.com", Provider::Gcp),
    ("CVS Health", "CVS", "cvs.com", Provider::Gcp),
    ("UPS", "UPS", "ups.com", Provider::Gcp),
    ("FedEx", "FDX", "fedex.com", Provider::Gcp),
    ("Ford", "F", "ford.com", Provider::Gcp),
    ("Goldman Sachs", "GS", "goldmansachs.com", Provider::Gcp),
    // Azure
    ("Microsoft", "MSFT", "microsoft.com", Provider::Azure),
    ("LinkedIn", "MSFT", "linkedin.com", Provider::Azure),
    ("GitHub", "MSFT", "github.com", Provider::Azure),
    ("OpenAI", "OPENAI", "openai.com", Provider::Azure),
    ("Walmart", "WMT", "walmart.com", Provider::Azure),
    ("Boeing", "BA", "boeing.com", Provider::Azure),
    ("Starbucks", "SBUX", "starbucks.com", Provider::Azure),
    ("AT&T", "T", "att.com", Provider::Azure),
    ("ExxonMobil", "XOM", "exxonmobil.com", Provider::Azure),
    ("Chevron", "CVX", "chevron.com", Provider::Azure),
    ("Walgreens", "WBA", "walgreens.com", Provider::Azure),
    ("3M", "MMM", "3m.com", Provider::Azure),
    ("Caterpillar", "CAT", "caterpillar.com", Provider::Azure),
    ("Deere & Company", "DE", "deere.com", Provider::Azure),
    ("Honeywell", "HON", "honeywell.com", Provider::Azure),
    ("Lockheed Martin", "LMT", "lockheedmartin.com", Provider::Azure),
    ("Raytheon", "RTX", "rtx.com", Provider::Azure),
    ("Uber", "UBER", "uber.com", Provider::Azure),
    ("DoorDash", "DASH", "doordash.com", Provider::Azure),
    // Oracle Cloud
    ("Oracle", "ORCL", "oracle.com", Provider::Oracle),
    ("Zoom", "ZM", "zoom.us", Provider::Oracle),
    ("8x8", "EGHT", "8x8.com", Provider::Oracle),
    ("Dyn", "DYN", "dyn.com", Provider::Oracle),
    ("Netsuite", "N", "netsuite.com", Provider::Oracle),
    // Alibaba Cloud
    ("Alibaba", "BABA", "alibaba.com", Provider::Alibaba),
    ("AliExpress", "BABA", "aliexpress.com", Provider::Alibaba),
    ("Taobao", "BABA", "taobao.com", Provider::Alibaba),
    ("Tmall", "BABA", "tmall.com", Provider::Alibaba),
    // Self-hosted / Other
    ("Apple", "AAPL", "apple.com", Provider::Other),
    ("Meta/Facebook", "META", "facebook.com", Provider::Other),
    ("Google", "GOOGL", "google.com", Provider::Other),
    ("Amazon", "AMZN", "amazon.com", Provider::Other),
    ("Tesla", "TSLA", "tesla.com", Provider::Other),
    ("Cloudflare", "NET", "cloudflare.com", Provider::Other),
];

// ============================================================================
// BASE CATALOG
// ============================================================================

/// Immutable base list. Cloning is cheap: records are shared.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Arc<[CompanyRecord]>,
}

impl Catalog {
    /// The curated list shipped with the binary
    pub fn builtin() -> Self {
        let records: Vec<CompanyRecord> = BUILTIN
            .iter()
            .map(|(name, symbol, domain, provider)| {
                CompanyRecord::new(name, symbol, domain, *provider)
            })
            .collect();

        Catalog {
            records: records.into(),
        }
    }

    /// Build a catalog from arbitrary records, enforcing the invariants
    /// the built-in list satisfies by construction.
    pub fn from_records(records: Vec<CompanyRecord>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();

        for record in &records {
            if record.name.trim().is_empty() {
                return Err(CatalogError::EmptyName {
                    domain: record.domain.clone(),
                });
            }
            if record.domain.trim().is_empty() {
                return Err(CatalogError::EmptyDomain {
                    name: record.name.clone(),
                });
            }
            if !seen.insert(record.domain.to_lowercase()) {
                return Err(CatalogError::DuplicateDomain(record.domain.clone()));
            }
        }

        Ok(Catalog {
            records: records.into(),
        })
    }

    /// Load a base catalog from CSV (`name,symbol,domain,provider`)
    pub fn from_csv_path(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        let catalog = Catalog::from_csv_reader(file)?;
        info!("Loaded {} companies from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvRow = row?;
            let provider: Provider = row.provider.parse()?;
            records.push(CompanyRecord {
                name: row.name,
                symbol: row.symbol,
                domain: row.domain.to_lowercase(),
                provider,
            });
        }

        debug!("Parsed {} CSV rows", records.len());
        Catalog::from_records(records)
    }

    pub fn records(&self) -> &[CompanyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Start a new session on top of this base list
    pub fn session(&self) -> SessionCatalog {
        SessionCatalog {
            base: self.clone(),
            appended: Vec::new(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}

// ============================================================================
// SESSION CATALOG
// ============================================================================

/// Base list plus the companies appended during one session.
///
/// The appended list only grows; it is dropped with the session.
#[derive(Debug, Clone)]
pub struct SessionCatalog {
    base: Catalog,
    appended: Vec<CompanyRecord>,
}

impl SessionCatalog {
    pub fn appended(&self) -> &[CompanyRecord] {
        &self.appended
    }

    /// Base records first, then appended ones, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CompanyRecord> + '_ {
        self.base.records().iter().chain(self.appended.iter())
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.appended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_domain(&self, domain: &str) -> Option<&CompanyRecord> {
        self.iter().find(|c| c.domain.eq_ignore_ascii_case(domain))
    }

    pub fn contains_domain(&self, domain: &str) -> bool {
        self.find_by_domain(domain).is_some()
    }

    /// Append a record. Fails if the domain is already known.
    pub fn append(&mut self, record: CompanyRecord) -> Result<(), CatalogError> {
        if self.contains_domain(&record.domain) {
            return Err(CatalogError::DuplicateDomain(record.domain));
        }

        info!(
            "Appended {} ({}) on {}",
            record.name, record.domain, record.provider
        );
        self.appended.push(record);
        Ok(())
    }

    /// Write base + appended as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), CatalogError> {
        let mut wtr = csv::Writer::from_writer(writer);

        for record in self.iter() {
            wtr.serialize(CsvRow {
                name: record.name.clone(),
                symbol: record.symbol.clone(),
                domain: record.domain.clone(),
                provider: record.provider.as_str().to_string(),
            })?;
        }

        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_size() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 78);
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        let records = catalog.records().to_vec();

        // Same invariants as any loaded catalog
        assert!(Catalog::from_records(records).is_ok());
    }

    #[test]
    fn test_builtin_provider_counts() {
        let catalog = Catalog::builtin();
        let count = |p: Provider| catalog.records().iter().filter(|c| c.provider == p).count();

        assert_eq!(count(Provider::Aws), 28);
        assert_eq!(count(Provider::Gcp), 16);
        assert_eq!(count(Provider::Azure), 19);
        assert_eq!(count(Provider::Oracle), 5);
        assert_eq!(count(Provider::Alibaba), 4);
        assert_eq!(count(Provider::Other), 6);
    }

    #[test]
    fn test_shared_symbols_allowed() {
        let catalog = Catalog::builtin();
        let baba = catalog
            .records()
            .iter()
            .filter(|c| c.symbol == "BABA")
            .count();
        assert_eq!(baba, 4);
    }

    #[test]
    fn test_from_records_rejects_duplicate_domain() {
        let records = vec![
            CompanyRecord::new("Netflix", "NFLX", "netflix.com", Provider::Aws),
            CompanyRecord::new("Netflix Again", "NFLX", "Netflix.com", Provider::Gcp),
        ];

        match Catalog::from_records(records) {
            Err(CatalogError::DuplicateDomain(d)) => assert_eq!(d, "Netflix.com"),
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_records_rejects_empty_name() {
        let records = vec![CompanyRecord::new("  ", "X", "x.com", Provider::Other)];
        assert!(matches!(
            Catalog::from_records(records),
            Err(CatalogError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_csv_load() {
        let data = "name,symbol,domain,provider\n\
                    Netflix,NFLX,Netflix.com,AWS\n\
                    Spotify,SPOT,spotify.com,google\n";

        let catalog = Catalog::from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].domain, "netflix.com");
        assert_eq!(catalog.records()[1].provider, Provider::Gcp);
    }

    #[test]
    fn test_csv_unknown_provider() {
        let data = "name,symbol,domain,provider\nAcme,ACME,acme.com,Hetzner\n";

        match Catalog::from_csv_reader(data.as_bytes()) {
            Err(CatalogError::UnknownProvider(p)) => assert_eq!(p, "Hetzner"),
            other => panic!("expected unknown provider, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_path_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(&path, "name,symbol,domain,provider\nZoom,ZM,zoom.us,Oracle\n").unwrap();

        let catalog = Catalog::from_csv_path(&path).unwrap();
        assert_eq!(catalog.records()[0].provider, Provider::Oracle);
    }

    #[test]
    fn test_session_append_and_union_order() {
        let base = Catalog::builtin();
        let mut session = base.session();

        session
            .append(CompanyRecord::new("Stripe", CUSTOM_SYMBOL, "stripe.com", Provider::Aws))
            .unwrap();

        assert_eq!(session.len(), 79);
        assert_eq!(session.appended().len(), 1);
        assert_eq!(session.iter().last().unwrap().name, "Stripe");
        assert_eq!(session.iter().next().unwrap().name, "Netflix");

        // Base is untouched
        assert_eq!(base.len(), 78);
    }

    #[test]
    fn test_session_append_duplicate_rejected() {
        let mut session = Catalog::builtin().session();
        let dup = CompanyRecord::new("Netflix", CUSTOM_SYMBOL, "NETFLIX.com", Provider::Gcp);

        assert!(matches!(
            session.append(dup),
            Err(CatalogError::DuplicateDomain(_))
        ));
        assert_eq!(session.len(), 78);
    }

    #[test]
    fn test_sessions_are_independent() {
        let base = Catalog::builtin();
        let mut a = base.session();
        let b = base.session();

        a.append(CompanyRecord::new("Stripe", CUSTOM_SYMBOL, "stripe.com", Provider::Aws))
            .unwrap();

        assert!(a.contains_domain("stripe.com"));
        assert!(!b.contains_domain("stripe.com"));
    }

    #[test]
    fn test_write_csv_round_trip() {
        let mut session = Catalog::builtin().session();
        session
            .append(CompanyRecord::new("Stripe", CUSTOM_SYMBOL, "stripe.com", Provider::Aws))
            .unwrap();

        let mut out = Vec::new();
        session.write_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("name,symbol,domain,provider\n"));
        assert!(text.contains("Stripe,CUSTOM,stripe.com,AWS"));

        let reloaded = Catalog::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(reloaded.len(), 79);
    }
}
