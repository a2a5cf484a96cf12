use crate::{
    client::{decode_envelope, SavePageNow},
    credentials::Credentials,
    errors::{ErrorDetail, Result, SavePageNowError},
    options::JobOptions,
    types::{Job, JobSnapshot, JobStatus, ServiceEnvelope},
    utils::{enqueue_url, status_url},
};

fn missing_field(field: &str, envelope: &ServiceEnvelope) -> SavePageNowError {
    SavePageNowError::WaybackRuntime(ErrorDetail {
        message: Some(format!("response has no {}", field)),
        job_id: envelope.job_id.clone(),
        url: envelope.url.clone(),
        ..Default::default()
    })
}

impl SavePageNow {
    /// Submits the job without applying any cache policy.
    pub(crate) async fn submit(
        &self,
        url: &str,
        options: &JobOptions,
        credentials: Option<&Credentials>,
    ) -> Result<Job> {
        // local checks happen before anything is sent
        let form = options.to_form(url)?;
        let credentials = match credentials {
            Some(c) => c.clone(),
            None => self.credentials()?,
        };

        let response = self
            .post_form(&enqueue_url(self.domain()), &form, &credentials)
            .await?;
        let envelope = decode_envelope(&response)?;
        if envelope.is_error() {
            let err = envelope.to_error();
            warn!("enqueue of {} refused: {}", url, err);
            return Err(err);
        }

        let job_id = envelope
            .job_id
            .clone()
            .ok_or_else(|| missing_field("job_id", &envelope))?;
        debug!("queued job {} for {}", job_id, url);

        Ok(Job {
            job_id,
            original_url: envelope.url.clone().unwrap_or_else(|| url.to_string()),
            status: JobStatus::Queued,
            message: envelope.message.clone(),
        })
    }

    /// Queues an asynchronous capture of `url`.
    ///
    /// A `message` in the reply means the service will satisfy the job from
    /// a recent capture; that is a `CachedPage` error unless `accept_cache`
    /// is set. The job id is still attached to the error and can be polled.
    pub async fn queue_capture(
        &self,
        url: &str,
        options: &JobOptions,
        credentials: Option<&Credentials>,
        accept_cache: bool,
    ) -> Result<Job> {
        let job = self.submit(url, options, credentials).await?;
        if let Some(message) = &job.message {
            if !accept_cache {
                return Err(SavePageNowError::CachedPage {
                    archive_url: None,
                    detail: ErrorDetail {
                        job_id: Some(job.job_id.clone()),
                        url: Some(job.original_url.clone()),
                        message: Some(message.clone()),
                        ..Default::default()
                    },
                });
            }
        }
        Ok(job)
    }

    /// Fetches the current status of a job once.
    pub async fn get_status(&self, job_id: &str, credentials: &Credentials) -> Result<JobSnapshot> {
        let response = self
            .get_json(&status_url(self.domain(), job_id), credentials)
            .await?;
        let mut envelope = decode_envelope(&response)?;
        if envelope.job_id.is_none() {
            envelope.job_id = Some(job_id.to_string());
        }
        if envelope.is_error() {
            return Err(envelope.to_error());
        }

        let status = envelope
            .status
            .as_deref()
            .and_then(JobStatus::parse)
            .ok_or_else(|| missing_field("known status", &envelope))?;

        Ok(JobSnapshot {
            job_id: job_id.to_string(),
            status,
            original_url: envelope.original_url.clone(),
            timestamp: envelope.timestamp.clone(),
            envelope,
        })
    }
}
