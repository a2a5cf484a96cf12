use std::fmt::Display;

use reqwest::header::HeaderMap;
use thiserror::Error;

/// Context attached to an error reported by the archiving service.
#[derive(Debug, Clone, Default)]
pub struct ErrorDetail {
    pub status: Option<u16>,
    pub headers: Option<HeaderMap>,
    pub status_ext: Option<String>,
    pub job_id: Option<String>,
    pub url: Option<String>,
    pub message: Option<String>,
}

impl ErrorDetail {
    pub fn from_response(status: u16, headers: &HeaderMap) -> Self {
        ErrorDetail {
            status: Some(status),
            headers: Some(headers.clone()),
            ..Default::default()
        }
    }

    pub fn from_message(message: &str) -> Self {
        ErrorDetail {
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

impl Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![];
        if let Some(status) = self.status {
            parts.push(format!("status={}", status));
        }
        if let Some(ext) = &self.status_ext {
            parts.push(format!("status_ext={}", ext));
        }
        if let Some(job_id) = &self.job_id {
            parts.push(format!("job_id={}", job_id));
        }
        if let Some(url) = &self.url {
            parts.push(format!("url={}", url));
        }
        if let Some(message) = &self.message {
            parts.push(format!("message={}", message));
        }
        if let Some(headers) = &self.headers {
            parts.push(format!("headers={:?}", headers));
        }
        if parts.is_empty() {
            return write!(f, "no details");
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CachedPage,
    BlockedByRobots,
    Unauthorized,
    Forbidden,
    TooManyRequests,
    BadGateway,
    UnknownError,
    InvalidArgument,
    MissingCredentials,
    BlockedUrl,
    WaybackRuntimeError,
    Network,
    Decode,
    EarlyTermination,
    DeadlineExceeded,
}

fn cached_url<'a>(archive_url: &'a Option<String>, detail: &'a ErrorDetail) -> &'a str {
    archive_url
        .as_deref()
        .or(detail.url.as_deref())
        .unwrap_or("unknown url")
}

#[derive(Error, Debug)]
pub enum SavePageNowError {
    #[error(
        "archive.org returned a cached version of this page: {}",
        cached_url(.archive_url, .detail)
    )]
    CachedPage {
        // none while the job that serves the cached copy is still queued
        archive_url: Option<String>,
        detail: ErrorDetail,
    },
    #[error("blocked by robots.txt: {0}")]
    BlockedByRobots(ErrorDetail),
    #[error("unauthorized: {0}")]
    Unauthorized(ErrorDetail),
    #[error("forbidden: {0}")]
    Forbidden(ErrorDetail),
    #[error("too many requests: {0}")]
    TooManyRequests(ErrorDetail),
    #[error("bad gateway: {0}")]
    BadGateway(ErrorDetail),
    #[error("unknown error: {0}")]
    UnknownError(ErrorDetail),
    #[error("argument not valid: {arg}")]
    InvalidArgument { arg: String },
    #[error("missing credentials: set {access_env} and {secret_env} or pass them explicitly")]
    MissingCredentials {
        access_env: &'static str,
        secret_env: &'static str,
    },
    #[error("url blocked by the archive: {0}")]
    BlockedUrl(ErrorDetail),
    #[error("wayback runtime error: {0}")]
    WaybackRuntime(ErrorDetail),
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),
    #[error("could not decode service response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("early_termination")]
    EarlyTermination,
    #[error("deadline of {secs:.1}s exceeded while polling job {job_id}")]
    DeadlineExceeded { job_id: String, secs: f64 },
}

pub type Result<T> = std::result::Result<T, SavePageNowError>;

impl SavePageNowError {
    pub fn invalid_argument(arg: &str) -> SavePageNowError {
        SavePageNowError::InvalidArgument {
            arg: arg.to_string(),
        }
    }

    /// Builds the error for a service-reported kind. Kinds that do not
    /// describe a service report collapse into `WaybackRuntime`.
    pub fn from_kind(kind: ErrorKind, detail: ErrorDetail) -> SavePageNowError {
        match kind {
            ErrorKind::CachedPage => SavePageNowError::CachedPage {
                archive_url: detail.url.clone(),
                detail,
            },
            ErrorKind::BlockedByRobots => SavePageNowError::BlockedByRobots(detail),
            ErrorKind::Unauthorized => SavePageNowError::Unauthorized(detail),
            ErrorKind::Forbidden => SavePageNowError::Forbidden(detail),
            ErrorKind::TooManyRequests => SavePageNowError::TooManyRequests(detail),
            ErrorKind::BadGateway => SavePageNowError::BadGateway(detail),
            ErrorKind::UnknownError => SavePageNowError::UnknownError(detail),
            ErrorKind::BlockedUrl => SavePageNowError::BlockedUrl(detail),
            _ => SavePageNowError::WaybackRuntime(detail),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SavePageNowError::CachedPage { .. } => ErrorKind::CachedPage,
            SavePageNowError::BlockedByRobots(_) => ErrorKind::BlockedByRobots,
            SavePageNowError::Unauthorized(_) => ErrorKind::Unauthorized,
            SavePageNowError::Forbidden(_) => ErrorKind::Forbidden,
            SavePageNowError::TooManyRequests(_) => ErrorKind::TooManyRequests,
            SavePageNowError::BadGateway(_) => ErrorKind::BadGateway,
            SavePageNowError::UnknownError(_) => ErrorKind::UnknownError,
            SavePageNowError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            SavePageNowError::MissingCredentials { .. } => ErrorKind::MissingCredentials,
            SavePageNowError::BlockedUrl(_) => ErrorKind::BlockedUrl,
            SavePageNowError::WaybackRuntime(_) => ErrorKind::WaybackRuntimeError,
            SavePageNowError::Network(_) => ErrorKind::Network,
            SavePageNowError::Decode(_) => ErrorKind::Decode,
            SavePageNowError::EarlyTermination => ErrorKind::EarlyTermination,
            SavePageNowError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
        }
    }

    /// Transport failures, as opposed to anything the service reported.
    pub fn is_network(&self) -> bool {
        matches!(self, SavePageNowError::Network(_))
    }

    /// Errors raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SavePageNowError::InvalidArgument { .. } | SavePageNowError::MissingCredentials { .. }
        )
    }

    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            SavePageNowError::CachedPage { detail, .. }
            | SavePageNowError::BlockedByRobots(detail)
            | SavePageNowError::Unauthorized(detail)
            | SavePageNowError::Forbidden(detail)
            | SavePageNowError::TooManyRequests(detail)
            | SavePageNowError::BadGateway(detail)
            | SavePageNowError::UnknownError(detail)
            | SavePageNowError::BlockedUrl(detail)
            | SavePageNowError::WaybackRuntime(detail) => Some(detail),
            _ => None,
        }
    }
}

// status_ext codes returned by the job API. Anything missing here is a
// WaybackRuntimeError.
const STATUS_EXT_KINDS: &[(&str, ErrorKind)] = &[
    ("error:bad-gateway", ErrorKind::BadGateway),
    ("error:blocked", ErrorKind::BlockedByRobots),
    ("error:blocked-client-ip", ErrorKind::Forbidden),
    ("error:blocked-url", ErrorKind::BlockedUrl),
    ("error:no-access", ErrorKind::Forbidden),
    ("error:too-many-daily-captures", ErrorKind::TooManyRequests),
    ("error:too-many-requests", ErrorKind::TooManyRequests),
    ("error:user-session-limit", ErrorKind::TooManyRequests),
    ("error:unauthorized", ErrorKind::Unauthorized),
    ("error:unknown", ErrorKind::UnknownError),
];

pub fn kind_for_status_ext(status_ext: &str) -> ErrorKind {
    STATUS_EXT_KINDS
        .iter()
        .find(|(code, _)| *code == status_ext)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::WaybackRuntimeError)
}
