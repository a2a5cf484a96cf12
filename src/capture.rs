use crate::{
    classifier::classify,
    client::SavePageNow,
    credentials::Credentials,
    errors::Result,
    types::CaptureOutcome,
    utils::save_url,
};

/// A synchronous `/save/<url>` request.
#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct CaptureRequest {
    target_url: String,
    // overrides the client's user agent
    #[builder(setter(into, strip_option), default)]
    user_agent: Option<String>,
    #[builder(default = "false")]
    accept_cache: bool,
    // overrides the client's credentials
    #[builder(setter(into, strip_option), default)]
    credentials: Option<Credentials>,
}

impl CaptureRequest {
    pub fn default_builder() -> CaptureRequestBuilder {
        CaptureRequestBuilder::default()
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn accept_cache(&self) -> bool {
        self.accept_cache
    }
}

impl SavePageNow {
    pub async fn capture_request(&self, req: &CaptureRequest) -> Result<CaptureOutcome> {
        let url = save_url(self.domain(), &req.target_url);
        info!("requesting capture of {}", req.target_url);

        let credentials = req
            .credentials
            .as_ref()
            .or_else(|| self.configured_credentials());
        let response = self
            .get(&url, req.user_agent.as_deref(), credentials)
            .await?;
        debug!("capture response status {}", response.status);

        let outcome = classify(self.domain(), &response, req.accept_cache)?;
        match &outcome {
            CaptureOutcome::Archived(u) => info!("{} archived at {}", req.target_url, u),
            CaptureOutcome::CachedArchived(u) => {
                info!("{} served from a recent capture at {}", req.target_url, u)
            }
        }
        Ok(outcome)
    }

    /// Archives `target_url` and returns the url of the snapshot.
    ///
    /// Fails with `CachedPage` when the service hands back a recent snapshot
    /// instead of capturing, unless `accept_cache` is set.
    pub async fn capture(&self, target_url: &str, accept_cache: bool) -> Result<String> {
        let req = CaptureRequest {
            target_url: target_url.into(),
            user_agent: None,
            accept_cache,
            credentials: None,
        };
        Ok(self.capture_request(&req).await?.url().to_string())
    }

    /// Archives `target_url` unless it was captured moments ago. The boolean
    /// is true when a new capture was made.
    pub async fn capture_or_cache(&self, target_url: &str) -> Result<(String, bool)> {
        let outcome = self
            .capture_request(&CaptureRequest {
                target_url: target_url.into(),
                user_agent: None,
                accept_cache: true,
                credentials: None,
            })
            .await?;
        let captured = !outcome.is_cached();
        Ok((outcome.url().to_string(), captured))
    }
}
