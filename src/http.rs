use crate::error::SignatureValidationError;
use once_cell::sync::Lazy;
use std::time::Duration;

/// Blocking HTTP GET returning the response body.
pub trait HttpGet: Send + Sync {
    fn get(&self, url: &str) -> Result<String, SignatureValidationError>;
}

static SHARED_AGENT: Lazy<ureq::Agent> = Lazy::new(|| agent(Duration::from_secs(crate::config::DEFAULT_HTTP_TIMEOUT_SECS)));

fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// `ureq`-backed fetcher. Timeouts, transport errors and non-2xx statuses all
/// surface as [`SignatureValidationError::JwksHttp`].
#[derive(Clone)]
pub struct UreqHttp {
    agent: ureq::Agent,
}

impl UreqHttp {
    pub fn new(timeout: Duration) -> Self {
        Self { agent: agent(timeout) }
    }
}

impl Default for UreqHttp {
    fn default() -> Self {
        Self { agent: SHARED_AGENT.clone() }
    }
}

impl HttpGet for UreqHttp {
    fn get(&self, url: &str) -> Result<String, SignatureValidationError> {
        let resp = self
            .agent
            .get(url)
            .call()
            .map_err(|e| SignatureValidationError::JwksHttp(e.to_string()))?;
        resp.into_string().map_err(|e| SignatureValidationError::JwksHttp(e.to_string()))
    }
}
