use reqwest::{
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, RequestBuilder, Url,
};

use crate::{
    classifier::status_error,
    credentials::Credentials,
    errors::{ErrorDetail, Result, SavePageNowError},
    types::{RawResponse, ServiceEnvelope},
    utils::{DEFAULT_DOMAIN, DEFAULT_USER_AGENT},
};

/// Client for the Save Page Now endpoints of a wayback instance.
///
/// Holds no per-request state; a single client can serve concurrent
/// captures.
pub struct SavePageNow {
    client: Client,
    domain: Url,
    user_agent: String,
    credentials: Option<Credentials>,
}

#[derive(Builder, Debug)]
#[builder(setter(into))]
pub struct SavePageNowOptions {
    #[builder(default = "self.default_domain()")]
    domain: Url,
    #[builder(default = "self.default_client()")]
    client: Client,
    #[builder(default = "self.default_user_agent()")]
    user_agent: String,
    // sent with every request; the job api falls back to the environment
    // when none are set
    #[builder(setter(into, strip_option), default)]
    credentials: Option<Credentials>,
}

impl SavePageNowOptions {
    pub fn default_builder() -> SavePageNowOptionsBuilder {
        SavePageNowOptionsBuilder::default()
    }
}

impl SavePageNowOptionsBuilder {
    fn default_domain(&self) -> Url {
        DEFAULT_DOMAIN.clone()
    }
    fn default_client(&self) -> Client {
        Client::new()
    }
    fn default_user_agent(&self) -> String {
        DEFAULT_USER_AGENT.into()
    }
}

impl SavePageNow {
    pub fn new(o: SavePageNowOptions) -> Self {
        SavePageNow {
            client: o.client,
            domain: o.domain,
            user_agent: o.user_agent,
            credentials: o.credentials,
        }
    }

    pub fn domain(&self) -> &Url {
        &self.domain
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub(crate) fn configured_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Configured credentials, or the ones found in the environment.
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::resolve(self.credentials.as_ref())
    }

    fn request(
        &self,
        builder: RequestBuilder,
        user_agent: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> RequestBuilder {
        let builder = builder.header(USER_AGENT, user_agent.unwrap_or(&self.user_agent));
        match credentials {
            Some(c) => builder.header(AUTHORIZATION, c.authorization()),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<RawResponse> {
        let res = builder.send().await?;
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.bytes().await?.to_vec();
        Ok(RawResponse::new(status, headers, body))
    }

    pub(crate) async fn get(
        &self,
        url: &str,
        user_agent: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> Result<RawResponse> {
        debug!("GET {}", url);
        Self::send(self.request(self.client.get(url), user_agent, credentials)).await
    }

    pub(crate) async fn get_json(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<RawResponse> {
        debug!("GET {}", url);
        let builder = self.client.get(url).header(ACCEPT, "application/json");
        Self::send(self.request(builder, None, Some(credentials))).await
    }

    pub(crate) async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
        credentials: &Credentials,
    ) -> Result<RawResponse> {
        debug!("POST {} with {} form fields", url, form.len());
        let builder = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(form);
        Self::send(self.request(builder, None, Some(credentials))).await
    }
}

/// Decodes the JSON envelope of a job endpoint reply. Refusal status codes
/// are mapped the same way as for synchronous captures.
pub(crate) fn decode_envelope(response: &RawResponse) -> Result<ServiceEnvelope> {
    if let Some(e) = status_error(response.status, &response.headers) {
        return Err(e);
    }
    match ServiceEnvelope::from_slice(&response.body) {
        Ok(envelope) => Ok(envelope),
        Err(e) if !(200..300).contains(&response.status) => {
            warn!("undecodable reply with status {}: {}", response.status, e);
            Err(SavePageNowError::WaybackRuntime(ErrorDetail {
                message: Some(String::from_utf8_lossy(&response.body).to_string()),
                ..ErrorDetail::from_response(response.status, &response.headers)
            }))
        }
        Err(e) => Err(e),
    }
}
