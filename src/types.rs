use chrono::NaiveDateTime;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{kind_for_status_ext, ErrorDetail, SavePageNowError},
    utils::FORMAT_STRING,
};

/// What the transport hands back for a single request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        RawResponse {
            status,
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Result of a synchronous capture that the service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Archived(String),
    CachedArchived(String),
}

impl CaptureOutcome {
    pub fn url(&self) -> &str {
        match self {
            CaptureOutcome::Archived(u) | CaptureOutcome::CachedArchived(u) => u,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, CaptureOutcome::CachedArchived(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Pending,
    Complete,
    Error,
}

impl JobStatus {
    pub fn parse(status: &str) -> Option<JobStatus> {
        match status {
            "queued" => Some(JobStatus::Queued),
            "pending" => Some(JobStatus::Pending),
            // the live service says "success", older docs say "complete"
            "success" | "complete" => Some(JobStatus::Complete),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

/// A job as returned by the enqueue call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub original_url: String,
    pub status: JobStatus,
    // set when the service answered from a recent capture
    pub message: Option<String>,
}

impl Job {
    pub fn is_cache_hit(&self) -> bool {
        self.message.is_some()
    }
}

/// One observation of a job's status endpoint.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub original_url: Option<String>,
    pub timestamp: Option<String>,
    pub envelope: ServiceEnvelope,
}

/// Terminal success of an asynchronous capture.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub original_url: String,
    pub timestamp: String,
    pub archive_url: String,
    pub duration_sec: Option<f64>,
    pub http_status: Option<u16>,
    pub resources: Vec<String>,
    pub outlinks: Option<serde_json::Value>,
    pub screenshot: Option<String>,
    pub first_archive: Option<bool>,
}

impl JobResult {
    pub fn archive_url(&self) -> &str {
        &self.archive_url
    }

    pub fn captured_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, FORMAT_STRING).ok()
    }
}

/// JSON body shared by the enqueue and status endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceEnvelope {
    pub status: Option<String>,
    pub status_ext: Option<String>,
    pub message: Option<String>,
    pub job_id: Option<String>,
    pub url: Option<String>,
    pub original_url: Option<String>,
    pub timestamp: Option<String>,
    pub error: Option<String>,
    pub exception: Option<String>,
    pub duration_sec: Option<f64>,
    pub http_status: Option<u16>,
    #[serde(default)]
    pub resources: Vec<String>,
    pub outlinks: Option<serde_json::Value>,
    pub screenshot: Option<String>,
    pub first_archive: Option<bool>,
}

impl ServiceEnvelope {
    pub fn from_slice(body: &[u8]) -> crate::errors::Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn is_error(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => status == "error",
            None => self.status_ext.is_some() || self.error.is_some(),
        }
    }

    /// Maps an error envelope through the status_ext table.
    pub fn to_error(&self) -> SavePageNowError {
        let kind = kind_for_status_ext(self.status_ext.as_deref().unwrap_or_default());
        let detail = ErrorDetail {
            status_ext: self.status_ext.clone(),
            job_id: self.job_id.clone(),
            url: self.original_url.clone().or_else(|| self.url.clone()),
            message: self
                .message
                .clone()
                .or_else(|| self.error.clone())
                .or_else(|| self.exception.clone()),
            ..Default::default()
        };
        SavePageNowError::from_kind(kind, detail)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn job_status_parsing() {
        assert_eq!(JobStatus::parse("pending"), Some(JobStatus::Pending));
        assert_eq!(JobStatus::parse("success"), Some(JobStatus::Complete));
        assert_eq!(JobStatus::parse("complete"), Some(JobStatus::Complete));
        assert_eq!(JobStatus::parse("weird"), None);
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn envelope_error_detection() {
        let e: ServiceEnvelope = serde_json::from_str(
            r#"{"status":"error","status_ext":"error:blocked-url","job_id":"j1","message":"nope"}"#,
        )
        .unwrap();
        assert!(e.is_error());
        let err = e.to_error();
        assert_eq!(err.kind(), ErrorKind::BlockedUrl);
        assert_eq!(err.detail().unwrap().job_id.as_deref(), Some("j1"));

        let e: ServiceEnvelope =
            serde_json::from_str(r#"{"error":"boom","status_ext":"error:celery"}"#).unwrap();
        assert!(e.is_error());
        assert_eq!(e.to_error().kind(), ErrorKind::WaybackRuntimeError);

        let e: ServiceEnvelope =
            serde_json::from_str(r#"{"url":"https://x.com","job_id":"j2"}"#).unwrap();
        assert!(!e.is_error());
    }

    #[test]
    fn captured_at_parses_wayback_timestamp() {
        let r = JobResult {
            job_id: "j".into(),
            original_url: "https://x.com".into(),
            timestamp: "20240101000000".into(),
            archive_url: "https://web.archive.org/web/20240101000000/https://x.com".into(),
            duration_sec: None,
            http_status: None,
            resources: vec![],
            outlinks: None,
            screenshot: None,
            first_archive: None,
        };
        let ts = r.captured_at().unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2024-01-01");
    }

    #[test]
    fn outcome_accessors() {
        let o = CaptureOutcome::CachedArchived("u".into());
        assert!(o.is_cached());
        assert_eq!(o.url(), "u");
        assert!(!CaptureOutcome::Archived("u".into()).is_cached());
    }
}
