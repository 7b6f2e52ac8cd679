// 🖼️ Logo resolution - Ordered fallback chains for company and provider logos
//
// Company: logo service → favicon service → generated initials avatar
// Provider pill: vendor logo → hidden
//
// A chain is data. Whoever can actually load images (the browser, a
// terminal that cannot) walks it with `resolve`.

use serde::Serialize;

use crate::catalog::CompanyRecord;
use crate::provider::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSource {
    LogoService,
    Favicon,
    InitialsAvatar,
    ProviderLogo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoCandidate {
    pub source: LogoSource,
    pub url: String,
}

/// Company logo candidates, best first. Keyed only by domain and name.
pub fn company_logo_chain(record: &CompanyRecord) -> Vec<LogoCandidate> {
    vec![
        LogoCandidate {
            source: LogoSource::LogoService,
            url: format!("https://logo.clearbit.com/{}", record.domain),
        },
        LogoCandidate {
            source: LogoSource::Favicon,
            url: format!(
                "https://www.google.com/s2/favicons?domain={}&sz=128",
                record.domain
            ),
        },
        LogoCandidate {
            source: LogoSource::InitialsAvatar,
            url: format!(
                "https://ui-avatars.com/api/?name={}&background=random&size=128",
                urlencoding::encode(&record.name)
            ),
        },
    ]
}

/// Provider pill logo. Empty for `Other`; an empty chain means "hide".
pub fn provider_logo_chain(provider: Provider) -> Vec<LogoCandidate> {
    provider
        .logo_url()
        .map(|url| LogoCandidate {
            source: LogoSource::ProviderLogo,
            url: url.to_string(),
        })
        .into_iter()
        .collect()
}

/// First candidate `loads` accepts, or `None` once the chain is exhausted
pub fn resolve<F>(chain: &[LogoCandidate], mut loads: F) -> Option<&LogoCandidate>
where
    F: FnMut(&LogoCandidate) -> bool,
{
    chain.iter().find(|candidate| loads(candidate))
}

/// Local last resort when nothing in the chain loads: up to two initials
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| c.is_whitespace() || c == '/' || c == '&')
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .collect();

    let mut out = String::new();
    for word in words.iter().take(2) {
        if let Some(c) = word.chars().find(|c| c.is_alphanumeric()) {
            out.extend(c.to_uppercase());
        }
    }
    out
}
