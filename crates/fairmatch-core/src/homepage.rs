use url::Url;

use crate::fields::normalize_url;
use crate::record::CanonicalRecord;
use crate::schema::Field;

/// Listing sites, ticketing platforms and social networks that often show
/// up in the homepage field but are never the organizer's own site.
pub const DEFAULT_AGGREGATOR_DOMAINS: &[&str] = &[
    "auma.de",
    "myfair.co",
    "10times.com",
    "eventbrite.com",
    "facebook.com",
    "instagram.com",
    "linkedin.com",
    "twitter.com",
    "x.com",
    "youtube.com",
];

/// Pick the official homepage among candidate records.
///
/// Homepage values are normalized, deduplicated in record order, and the
/// first one whose host is neither an aggregator domain nor a subdomain of
/// one wins.
pub fn pick_official_homepage<'a, I, S>(records: I, aggregators: &[S]) -> Option<String>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        let url = normalize_url(record.get(Field::Homepage));
        if !url.is_empty() && !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen.into_iter().find(|url| !is_aggregator(url, aggregators))
}

/// True when `url` is hosted on one of `aggregators` (or a subdomain).
/// Unparseable URLs are treated as aggregators so they are never picked.
pub fn is_aggregator<S: AsRef<str>>(url: &str, aggregators: &[S]) -> bool {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return true;
    };
    let host = host.trim_start_matches("www.");
    aggregators.iter().any(|domain| {
        let domain = domain.as_ref().trim().trim_start_matches("www.").to_ascii_lowercase();
        !domain.is_empty()
            && (host == domain || host.ends_with(&format!(".{domain}")))
    })
}
