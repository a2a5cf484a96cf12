use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tokio::time::sleep;

use crate::{
    client::SavePageNow,
    credentials::Credentials,
    errors::{ErrorDetail, Result, SavePageNowError},
    options::JobOptions,
    types::{Job, JobResult, JobSnapshot, JobStatus},
    utils::archive_url,
};

// longest stretch of sleep between two looks at the termination flag
const TERMINATION_CHECK: Duration = Duration::from_millis(100);

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct PollOptions {
    // seconds between two status requests, must not be negative
    #[builder(default = "5.0")]
    wait_secs: f64,
    // overall limit, none means poll until the job is done
    #[builder(setter(into, strip_option), default)]
    deadline: Option<Duration>,
    #[builder(setter(into, strip_option), default)]
    should_terminate: Option<Arc<AtomicBool>>,
}

impl PollOptions {
    pub fn default_builder() -> PollOptionsBuilder {
        PollOptionsBuilder::default()
    }

    pub fn wait_interval(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.wait_secs).map_err(|e| {
            SavePageNowError::invalid_argument(&format!(
                "wait interval must be a duration in seconds >= 0, got {}: {}",
                self.wait_secs, e
            ))
        })
    }

    fn terminated(&self) -> bool {
        match &self.should_terminate {
            Some(flag) => flag.load(Ordering::Relaxed),
            None => false,
        }
    }

    /// Sleeps for `pause`, returning `EarlyTermination` as soon as the
    /// termination flag is seen set.
    async fn sleep(&self, pause: Duration) -> Result<()> {
        if self.should_terminate.is_none() {
            sleep(pause).await;
            return Ok(());
        }
        let mut left = pause;
        loop {
            if self.terminated() {
                return Err(SavePageNowError::EarlyTermination);
            }
            if left.is_zero() {
                return Ok(());
            }
            let step = left.min(TERMINATION_CHECK);
            sleep(step).await;
            left = left.saturating_sub(step);
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            wait_secs: 5.0,
            deadline: None,
            should_terminate: None,
        }
    }
}

impl SavePageNow {
    fn complete(&self, job: &Job, snapshot: JobSnapshot) -> Result<JobResult> {
        let original_url = snapshot
            .original_url
            .unwrap_or_else(|| job.original_url.clone());
        let timestamp = snapshot.timestamp.ok_or_else(|| {
            SavePageNowError::WaybackRuntime(ErrorDetail {
                job_id: Some(job.job_id.clone()),
                url: Some(original_url.clone()),
                message: Some("completed job has no timestamp".into()),
                ..Default::default()
            })
        })?;
        let e = snapshot.envelope;

        Ok(JobResult {
            job_id: job.job_id.clone(),
            archive_url: archive_url(self.domain(), &timestamp, &original_url),
            original_url,
            timestamp,
            duration_sec: e.duration_sec,
            http_status: e.http_status,
            resources: e.resources,
            outlinks: e.outlinks,
            screenshot: e.screenshot,
            first_archive: e.first_archive,
        })
    }

    /// Polls the status endpoint until `job` completes or fails.
    ///
    /// Queued and pending states are retried every `wait_secs` with no limit
    /// other than the optional deadline and termination flag. A job whose
    /// enqueue reply carried a `message` was served from a recent capture:
    /// once complete it is reported as `CachedPage` unless `accept_cache`.
    pub async fn poll_until_terminal(
        &self,
        job: &Job,
        credentials: Option<&Credentials>,
        accept_cache: bool,
        poll: &PollOptions,
    ) -> Result<JobResult> {
        let wait = poll.wait_interval()?;
        let credentials = match credentials {
            Some(c) => c.clone(),
            None => self.credentials()?,
        };
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            if poll.terminated() {
                return Err(SavePageNowError::EarlyTermination);
            }
            attempts += 1;

            let snapshot = self.get_status(&job.job_id, &credentials).await?;
            debug!(
                "job {} is {:?} after {} polls",
                job.job_id, snapshot.status, attempts
            );

            match snapshot.status {
                JobStatus::Complete => {
                    let result = self.complete(job, snapshot)?;
                    if job.is_cache_hit() && !accept_cache {
                        return Err(SavePageNowError::CachedPage {
                            detail: ErrorDetail {
                                job_id: Some(job.job_id.clone()),
                                url: Some(result.archive_url.clone()),
                                message: job.message.clone(),
                                ..Default::default()
                            },
                            archive_url: Some(result.archive_url),
                        });
                    }
                    info!("job {} completed: {}", job.job_id, result.archive_url);
                    return Ok(result);
                }
                JobStatus::Error => return Err(snapshot.envelope.to_error()),
                JobStatus::Queued | JobStatus::Pending => {}
            }

            let mut pause = wait;
            if let Some(deadline) = poll.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    return Err(SavePageNowError::DeadlineExceeded {
                        job_id: job.job_id.clone(),
                        secs: deadline.as_secs_f64(),
                    });
                }
                pause = pause.min(deadline - elapsed);
            }
            poll.sleep(pause).await?;
        }
    }

    /// Queues `url` and waits for the capture to finish.
    pub async fn capture_v2(
        &self,
        url: &str,
        options: &JobOptions,
        accept_cache: bool,
        poll: &PollOptions,
    ) -> Result<JobResult> {
        // validate everything local before the enqueue request
        poll.wait_interval()?;
        let credentials = self.credentials()?;

        let job = self.submit(url, options, Some(&credentials)).await?;
        if job.is_cache_hit() {
            debug!(
                "job {} will be served from a recent capture: {:?}",
                job.job_id, job.message
            );
        }
        self.poll_until_terminal(&job, Some(&credentials), accept_cache, poll)
            .await
    }
}
