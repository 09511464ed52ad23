//! Domain key derivation
//!
//! A company's normalized domain is the identity used for deduplication and
//! checkpointing across the whole pipeline. Normalization must be stable: the
//! same raw website string always yields the same key.

/// Normalize a raw website URL into a bare lowercase domain.
///
/// Strips the scheme, a leading `www.`, any path/query, and any port. Returns
/// `None` for empty input or anything that does not look like a domain
/// (no dot).
///
/// # Example
///
/// ```
/// use leadpipe_common::domain::normalize_domain;
///
/// assert_eq!(
///     normalize_domain("https://www.Acme-HVAC.com/contact?ref=maps"),
///     Some("acme-hvac.com".to_string())
/// );
/// assert_eq!(normalize_domain("localhost"), None);
/// ```
pub fn normalize_domain(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Lowercase first so scheme and www. stripping see a canonical form;
    // scraped listings mix cases freely and the key must not.
    let lowered = trimmed.to_lowercase();
    let mut domain = lowered.as_str();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = domain.strip_prefix(scheme) {
            domain = rest;
            break;
        }
    }

    if let Some(rest) = domain.strip_prefix("www.") {
        domain = rest;
    }

    // Path, query, then port - in that order, matching how URLs nest.
    domain = domain.split('/').next().unwrap_or(domain);
    domain = domain.split('?').next().unwrap_or(domain);
    domain = domain.split(':').next().unwrap_or(domain);

    if domain.is_empty() || !domain.contains('.') {
        return None;
    }

    Some(domain.to_string())
}

/// Convert free text into a URL-friendly slug (lowercase, hyphen-separated).
///
/// Used for output file names like `hvac-inspection-companies-leads.json`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_dash = true; // suppress a leading dash

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}
