// Locating the archived snapshot in a capture response.
//
// The service answers with either a Content-Location header or an RFC 5988
// Link header listing the original, timemap, timegate and memento urls.
use reqwest::{header::HeaderMap, Url};
use thiserror::Error;

pub const CONTENT_LOCATION: &str = "content-location";
pub const LINK: &str = "link";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no archived location found in response headers")]
pub struct LocationNotFound;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValue {
    pub target: String,
    pub params: Vec<(String, String)>,
}

impl LinkValue {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `rel` may hold several space separated relation types, e.g. "first memento".
    pub fn has_rel(&self, rel: &str) -> bool {
        match self.param("rel") {
            Some(rels) => rels.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)),
            None => false,
        }
    }
}

// Splits on `sep` outside of quoted strings and <...> targets.
fn split_outside(s: &str, sep: char) -> Vec<&str> {
    let mut parts = vec![];
    let mut in_quote = false;
    let mut in_angle = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' if !in_angle => in_quote = !in_quote,
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            c if c == sep && !in_quote && !in_angle => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_link_value(entry: &str) -> Option<LinkValue> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let end = rest.find('>')?;
    let target = rest[..end].trim().to_string();

    let params = split_outside(&rest[end + 1..], ';')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (
                k.trim().to_ascii_lowercase(),
                v.trim().trim_matches('"').to_string(),
            ),
            None => (p.to_ascii_lowercase(), String::new()),
        })
        .collect();

    Some(LinkValue { target, params })
}

/// Parses a Link header into its link-values, skipping malformed entries.
pub fn parse_link_header(value: &str) -> Vec<LinkValue> {
    split_outside(value, ',')
        .into_iter()
        .filter_map(parse_link_value)
        .collect()
}

fn absolute(domain: &Url, target: &str) -> Option<String> {
    if Url::parse(target).is_ok() {
        return Some(target.to_string());
    }
    domain.join(target).ok().map(|u| u.to_string())
}

/// Picks the snapshot url out of parsed link-values: the first memento,
/// otherwise the first timegate.
pub fn select_archived(links: &[LinkValue]) -> Option<&LinkValue> {
    links
        .iter()
        .find(|l| l.has_rel("memento"))
        .or_else(|| links.iter().find(|l| l.has_rel("timegate")))
}

pub fn resolve_location(domain: &Url, headers: &HeaderMap) -> Result<String, LocationNotFound> {
    if let Some(location) = headers
        .get(CONTENT_LOCATION)
        .and_then(|v| v.to_str().ok())
    {
        return domain
            .join(location)
            .map(|u| u.to_string())
            .map_err(|_| LocationNotFound);
    }

    let link = headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<&str>>();
    if link.is_empty() {
        return Err(LocationNotFound);
    }

    let links = parse_link_header(&link.join(", "));
    debug!("parsed {} link values from Link header", links.len());
    select_archived(&links)
        .and_then(|l| absolute(domain, &l.target))
        .ok_or(LocationNotFound)
}
