//! HTTP client for the energy monitoring backend.
//!
//! Wraps the synchronous `ureq` client with one method per backend endpoint.
//! The client never throws across its boundary: every transport, status, or
//! decode problem comes back as a [`FetchOutcome::Failure`] with the matching
//! [`ErrorKind`]. Retry is deliberately absent here — repeated attempts are
//! the poller's job.

pub mod models;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::EmonConfig;
use crate::fetch::{ErrorKind, FetchOutcome};
use models::{
    Alert, AnalysisReport, AnalysisRequest, AnalyticsSummary, DashboardData, MachineReading,
};

/// Timeout for the lightweight reachability probe used by `emon health`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Logical data sources exposed by the backend. Fixed at compile time; each
/// knows its URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Live,
    Analytics,
    Alerts,
    Dashboard,
    Analysis,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Live => "/live",
            Self::Analytics => "/analytics",
            Self::Alerts => "/alerts",
            Self::Dashboard => "/dashboard",
            Self::Analysis => "/analysis",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client. Cheap to construct; holds no connection state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Build a client from the resolved configuration.
    pub fn from_config(config: &EmonConfig) -> Self {
        Self::new(
            &config.backend.base_url,
            Duration::from_millis(config.backend.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /live` — latest telemetry rows, newest first.
    pub fn live(&self) -> FetchOutcome<Vec<MachineReading>> {
        self.get(Endpoint::Live)
    }

    /// `GET /analytics` — fleet-wide aggregates.
    pub fn analytics(&self) -> FetchOutcome<AnalyticsSummary> {
        self.get(Endpoint::Analytics)
    }

    /// `GET /alerts` — active threshold alerts.
    pub fn alerts(&self) -> FetchOutcome<Vec<Alert>> {
        self.get(Endpoint::Alerts)
    }

    /// `GET /dashboard` — headline stats plus chart series.
    pub fn dashboard(&self) -> FetchOutcome<DashboardData> {
        self.get(Endpoint::Dashboard)
    }

    /// `POST /analysis` — submit an operating profile, receive a prediction.
    pub fn analyze(&self, request: &AnalysisRequest) -> FetchOutcome<AnalysisReport> {
        self.post(Endpoint::Analysis, request)
    }

    /// Probe the backend root with a short timeout. Any HTTP response counts
    /// as reachable, including error statuses — we only care that something
    /// is listening.
    pub fn is_reachable(&self) -> bool {
        let url = format!("{}/", self.base_url);
        match ureq::get(&url).timeout(PROBE_TIMEOUT).call() {
            Ok(_) | Err(ureq::Error::Status(_, _)) => true,
            Err(_) => false,
        }
    }

    fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> FetchOutcome<T> {
        let url = self.url(endpoint);
        let response = ureq::get(&url).timeout(self.timeout).call();
        Self::decode(endpoint, response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> FetchOutcome<T> {
        let url = self.url(endpoint);
        let response = ureq::post(&url).timeout(self.timeout).send_json(body);
        Self::decode(endpoint, response)
    }

    /// Normalize a `ureq` response into a [`FetchOutcome`].
    fn decode<T: DeserializeOwned>(
        endpoint: Endpoint,
        response: Result<ureq::Response, ureq::Error>,
    ) -> FetchOutcome<T> {
        let response = match response {
            Ok(r) => r,
            Err(ureq::Error::Status(status, _)) => {
                return FetchOutcome::failure(
                    ErrorKind::Server(status),
                    format!("{endpoint} returned HTTP {status}"),
                );
            }
            Err(e) => {
                return FetchOutcome::failure(
                    ErrorKind::Network,
                    format!("{endpoint} unreachable: {e}"),
                );
            }
        };

        match response.into_json::<T>() {
            Ok(data) => FetchOutcome::success(data),
            Err(e) => FetchOutcome::failure(
                ErrorKind::Parse,
                format!("{endpoint} returned a malformed body: {e}"),
            ),
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}
