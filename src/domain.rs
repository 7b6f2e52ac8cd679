// 🌐 Domain normalization - From whatever the user typed to a catalog key
//
// "https://www.Stripe.com/pricing?x=1" → "stripe.com" → "Stripe"

use crate::error::AddCompanyError;

/// Reduce a submitted URL or bare domain to its canonical host.
///
/// Strips the scheme, credentials, port, path, query and fragment,
/// lowercases, and removes one leading `www.` label.
pub fn normalize_domain(input: &str) -> Result<String, AddCompanyError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AddCompanyError::EmptyInput);
    }

    let without_scheme = match trimmed.find("://") {
        Some(pos) => &trimmed[pos + 3..],
        None => trimmed,
    };

    let authority = without_scheme
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");

    let host_port = authority.rsplit('@').next().unwrap_or("");
    let host = host_port.split(':').next().unwrap_or("");

    let mut host = host.trim_end_matches('.').to_lowercase();
    if let Some(rest) = host.strip_prefix("www.") {
        host = rest.to_string();
    }

    if !is_valid_host(&host) {
        return Err(AddCompanyError::InvalidUrl(trimmed.to_string()));
    }

    Ok(host)
}

fn is_valid_host(host: &str) -> bool {
    if host.is_empty() {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

/// Display name for a domain: first label, first character uppercased.
pub fn derive_name(domain: &str) -> String {
    let label = domain.split('.').next().unwrap_or(domain);
    let mut chars = label.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Heuristic for search-as-add: the text has a dot and is long enough to
/// be a domain rather than a name fragment.
pub fn looks_like_domain(text: &str) -> bool {
    let text = text.trim();
    text.contains('.') && text.chars().count() > 3
}
