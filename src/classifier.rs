use reqwest::{header::HeaderMap, Url};

use crate::{
    errors::{ErrorDetail, ErrorKind, Result, SavePageNowError},
    link_header::resolve_location,
    types::{CaptureOutcome, RawResponse},
};

pub const RUNTIME_ERROR_HEADER: &str = "x-archive-wayback-runtime-error";
pub const PAGE_CACHE_HEADER: &str = "x-page-cache";
pub const ROBOTS_BLOCKED: &str = "RobotAccessControlException: Blocked By Robots";

const STATUS_KINDS: &[(u16, ErrorKind)] = &[
    (401, ErrorKind::Unauthorized),
    (403, ErrorKind::Forbidden),
    (429, ErrorKind::TooManyRequests),
    (502, ErrorKind::BadGateway),
    (520, ErrorKind::UnknownError),
];

/// Error for the HTTP status codes the service uses to refuse a request.
/// Shared with the job endpoints.
pub fn status_error(status: u16, headers: &HeaderMap) -> Option<SavePageNowError> {
    STATUS_KINDS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, kind)| {
            SavePageNowError::from_kind(*kind, ErrorDetail::from_response(status, headers))
        })
}

pub fn is_cache_hit(headers: &HeaderMap) -> bool {
    headers
        .get(PAGE_CACHE_HEADER)
        .map(|v| v.as_bytes() == b"HIT")
        .unwrap_or(false)
}

/// Interprets the reply to a synchronous `/save/<url>` request.
///
/// The checks run in a fixed order and the first one that matches decides
/// the outcome: the runtime error header, then the refusal status codes,
/// then the archived location, then the cache header.
pub fn classify(
    domain: &Url,
    response: &RawResponse,
    accept_cache: bool,
) -> Result<CaptureOutcome> {
    if let Some(value) = response.headers.get(RUNTIME_ERROR_HEADER) {
        let value = String::from_utf8_lossy(value.as_bytes()).to_string();
        let detail = ErrorDetail {
            message: Some(value.clone()),
            ..ErrorDetail::from_response(response.status, &response.headers)
        };
        if value == ROBOTS_BLOCKED {
            return Err(SavePageNowError::BlockedByRobots(detail));
        }
        return Err(SavePageNowError::WaybackRuntime(detail));
    }

    if let Some(e) = status_error(response.status, &response.headers) {
        return Err(e);
    }

    let archive_url = match resolve_location(domain, &response.headers) {
        Ok(url) => url,
        Err(e) => {
            return Err(SavePageNowError::WaybackRuntime(ErrorDetail {
                message: Some(e.to_string()),
                ..ErrorDetail::from_response(response.status, &response.headers)
            }))
        }
    };

    if !is_cache_hit(&response.headers) {
        return Ok(CaptureOutcome::Archived(archive_url));
    }
    if !accept_cache {
        return Err(SavePageNowError::CachedPage {
            detail: ErrorDetail {
                url: Some(archive_url.clone()),
                ..ErrorDetail::from_response(response.status, &response.headers)
            },
            archive_url: Some(archive_url),
        });
    }
    Ok(CaptureOutcome::CachedArchived(archive_url))
}
