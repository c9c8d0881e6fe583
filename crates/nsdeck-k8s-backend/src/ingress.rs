//! Turns Ingress routing rules into the public `https://` URLs shown on the
//! dashboard.

use std::sync::LazyLock;

use k8s_openapi::api::networking::v1::Ingress;
use regex::Regex;
use url::Url;

use crate::cluster::ClusterClient;
use crate::error::BackendResult;

/// Substrings that mark a URL as not meant for end users.
pub const HIDDEN_URL_MARKERS: [&str; 2] = ["internal", "admin"];

// First "(" through last ")", i.e. rewrite-target capture groups.
static CAPTURE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*\)").expect("capture group pattern is valid"));

/// Normalize an ingress path into something a browser can open.
///
/// Leading slashes collapse to one, trailing `*` wildcards are dropped and a
/// parenthesized capture group is cut out.
pub fn sanitize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/').trim_end_matches('*');
    let without_groups = CAPTURE_GROUP.replace(trimmed, "");

    format!("/{}", without_groups)
}

/// `https://{host}{path}`, or `None` when that is not a valid URL.
pub fn build_url(host: &str, sanitized_path: &str) -> Option<Url> {
    match Url::parse(&format!("https://{}{}", host, sanitized_path)) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Skipping ingress host {} with path {}: {}", host, sanitized_path, e);
            None
        }
    }
}

pub fn is_public_url(url: &Url) -> bool {
    let rendered = url.as_str();
    !HIDDEN_URL_MARKERS
        .iter()
        .any(|marker| rendered.contains(marker))
}

/// One URL per host/path pair of the ingress, in rule order.
///
/// Pairs without a host or path, pairs that do not form a valid URL and
/// hidden URLs are skipped individually.
pub fn extract_ingress_urls(ingress: &Ingress) -> Vec<Url> {
    let rules = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_deref())
        .unwrap_or_default();

    let mut urls = Vec::new();
    for rule in rules {
        let Some(host) = rule.host.as_deref().filter(|host| !host.is_empty()) else {
            continue;
        };
        let paths = rule
            .http
            .as_ref()
            .map(|http| http.paths.as_slice())
            .unwrap_or_default();

        for path in paths {
            let Some(raw_path) = path.path.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            if let Some(url) = build_url(host, &sanitize_path(raw_path)) {
                if is_public_url(&url) {
                    urls.push(url);
                }
            }
        }
    }

    urls
}

/// Extracted URLs of several ingresses, concatenated in order.
pub fn extract_all_urls(ingresses: &[Ingress]) -> Vec<Url> {
    ingresses.iter().flat_map(extract_ingress_urls).collect()
}

/// List a namespace's ingresses and extract their URLs.
pub async fn namespace_ingress_urls(
    client: &dyn ClusterClient,
    namespace: &str,
) -> BackendResult<Vec<Url>> {
    let ingresses = client.list_ingresses(namespace).await?;
    Ok(extract_all_urls(&ingresses))
}
