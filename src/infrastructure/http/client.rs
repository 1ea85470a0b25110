use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Shared HTTP client for asset downloads. The timeout bounds each whole request.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(concat!("shorts-render/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!("✅ HTTP fetcher ready (timeout {:?})", timeout);
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
