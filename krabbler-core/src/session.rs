use indicatif::ProgressBar;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::identity::ServerId;

/// Handle to the transport session used to reach one server.
///
/// The registry owns the handle on behalf of the orchestrator but never
/// drives it. Interrupting in-flight requests after a cancellation is the
/// transport's job, not the registry's.
pub trait Connection: Send + Sync {
    /// Endpoint this session talks to.
    fn endpoint(&self) -> &str;
}

pub type ConnectionHandle = Arc<dyn Connection>;

/// Progress update emitted by a crawl worker for one server.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub server: ServerId,
    pub processed: usize,
    pub message: String,
}

/// Callback for reporting per-server crawl progress
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// No-op progress sink for headless registrations.
pub fn null_progress() -> ProgressCallback {
    Arc::new(|_update| {})
}

/// Adapter that drives an indicatif spinner from progress updates.
pub fn spinner_progress(pb: ProgressBar) -> ProgressCallback {
    Arc::new(move |update: ProgressUpdate| {
        pb.set_message(format!("{} ({} processed)", update.message, update.processed));
        pb.tick();
    })
}

/// HTTP-backed transport session.
///
/// Only the handle lives here; the orchestrator performs all I/O through
/// [`HttpConnection::client`].
pub struct HttpConnection {
    client: Client,
    endpoint: Url,
}

impl HttpConnection {
    pub fn new(endpoint: Url) -> Self {
        Self::with_timeout(endpoint, 10)
    }

    pub fn with_timeout(endpoint: Url, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Krabbler/0.1 (https://github.com/krabbler/krabbler)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Connection for HttpConnection {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}
