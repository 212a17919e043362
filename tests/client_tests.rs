//! Integration tests for the HTTP client against a local stub backend.
//!
//! Each test spins up a `tiny_http` server on an ephemeral port, points an
//! `ApiClient` at it, and asserts that the client normalizes transport,
//! status, and decode problems into the right failure kinds — without ever
//! panicking or returning `Err` across its boundary.

use std::io::Read;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use emon::client::ApiClient;
use emon::client::models::AnalysisRequest;
use emon::fetch::{ErrorKind, FetchOutcome};
use tiny_http::{Response, Server, StatusCode};

/// A stub backend that serves requests on a background thread until dropped.
struct StubBackend {
    server: Arc<Server>,
    base_url: String,
    worker: Option<JoinHandle<()>>,
}

impl StubBackend {
    /// Start a stub whose `handler` fully owns each incoming request.
    fn start<F>(handler: F) -> Self
    where
        F: Fn(tiny_http::Request) + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("failed to bind stub backend"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("stub backend has an IP address");
        let base_url = format!("http://{addr}");

        let acceptor = Arc::clone(&server);
        let worker = thread::spawn(move || {
            for request in acceptor.incoming_requests() {
                handler(request);
            }
        });

        Self {
            server,
            base_url,
            worker: Some(worker),
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(2))
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn respond_json(request: tiny_http::Request, body: &str) {
    let _ = request.respond(Response::from_string(body));
}

#[test]
fn live_success_decodes_backend_field_names() {
    let stub = StubBackend::start(|request| {
        assert_eq!(request.url(), "/live");
        respond_json(
            request,
            r#"[
                {"Machine_ID":"Press-01","Machine_Model":"PR-900","Power_kW":72.3,
                 "Energy_kWh":335.4,"Load_%":81.2,"Timestamp":"2026-08-27 08:00:00"},
                {"Machine_ID":"Lathe-02","Power_kW":57.6,
                 "Energy_kWh":241.7,"Load_%":93.5,"Timestamp":"2026-08-27 08:05:00"}
            ]"#,
        );
    });

    match stub.client().live() {
        FetchOutcome::Success { data, .. } => {
            assert_eq!(data.len(), 2);
            assert_eq!(data[0].machine_id, "Press-01");
            assert_eq!(data[0].machine_model.as_deref(), Some("PR-900"));
            assert_eq!(data[1].machine_model, None);
            assert_eq!(data[1].load_percent, 93.5);
        }
        FetchOutcome::Failure { kind, message, .. } => {
            panic!("expected success, got {kind}: {message}")
        }
    }
}

#[test]
fn analytics_success_decodes_summary() {
    let stub = StubBackend::start(|request| {
        respond_json(
            request,
            r#"{"total_energy_kWh":1532.7,"avg_power_kW":60.84,"avg_load_percent":77.38}"#,
        );
    });

    match stub.client().analytics() {
        FetchOutcome::Success { data, .. } => {
            assert_eq!(data.total_energy_kwh, 1532.7);
            assert_eq!(data.avg_load_percent, 77.38);
        }
        FetchOutcome::Failure { kind, .. } => panic!("expected success, got {kind}"),
    }
}

#[test]
fn non_2xx_status_maps_to_server_error() {
    let stub = StubBackend::start(|request| {
        let _ = request.respond(Response::from_string("boom").with_status_code(StatusCode(500)));
    });

    match stub.client().alerts() {
        FetchOutcome::Failure { kind, message, .. } => {
            assert_eq!(kind, ErrorKind::Server(500));
            assert!(message.contains("/alerts"), "message names the endpoint: {message}");
        }
        FetchOutcome::Success { .. } => panic!("expected a server error"),
    }
}

#[test]
fn malformed_body_maps_to_parse_error() {
    let stub = StubBackend::start(|request| {
        respond_json(request, "this is not json");
    });

    match stub.client().analytics() {
        FetchOutcome::Failure { kind, .. } => assert_eq!(kind, ErrorKind::Parse),
        FetchOutcome::Success { .. } => panic!("expected a parse error"),
    }
}

#[test]
fn wrong_shape_maps_to_parse_error() {
    // Valid JSON, wrong schema: an object where an array is expected.
    let stub = StubBackend::start(|request| {
        respond_json(request, r#"{"detail":"not a list"}"#);
    });

    match stub.client().live() {
        FetchOutcome::Failure { kind, .. } => assert_eq!(kind, ErrorKind::Parse),
        FetchOutcome::Success { .. } => panic!("expected a parse error"),
    }
}

#[test]
fn unreachable_backend_maps_to_network_error() {
    // Nothing listens on the discard port.
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500));
    match client.live() {
        FetchOutcome::Failure { kind, .. } => assert_eq!(kind, ErrorKind::Network),
        FetchOutcome::Success { .. } => panic!("expected a network error"),
    }
}

#[test]
fn analyze_posts_camel_case_json_and_decodes_the_report() {
    let stub = StubBackend::start(|mut request| {
        assert_eq!(request.url(), "/analysis");
        assert_eq!(request.method(), &tiny_http::Method::Post);

        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let sent: serde_json::Value = serde_json::from_str(&body).expect("request body is JSON");
        assert_eq!(sent["machineName"], "Press-01");
        assert_eq!(sent["onTime"], 16.0);

        respond_json(
            request,
            r#"{"anomalyStatus":"Low Anomaly Risk","predictedCost":"$15,200 / month",
                "efficiencyScore":89,"energyWasted":"3.8%",
                "machineName":"Press-01","onTime":16,"offTime":8}"#,
        );
    });

    let request = AnalysisRequest {
        machine_name: "Press-01".into(),
        on_time: 16.0,
        off_time: 8.0,
    };
    match stub.client().analyze(&request) {
        FetchOutcome::Success { data, .. } => {
            assert_eq!(data.machine_name, "Press-01");
            assert_eq!(data.efficiency_score, 89.0);
            assert_eq!(data.energy_wasted, "3.8%");
            assert_eq!(data.off_time, 8.0);
        }
        FetchOutcome::Failure { kind, message, .. } => {
            panic!("expected success, got {kind}: {message}")
        }
    }
}

#[test]
fn reachability_probe_accepts_any_http_response() {
    let stub = StubBackend::start(|request| {
        // Even a 404 from the root proves something is listening.
        let _ = request.respond(Response::from_string("nope").with_status_code(StatusCode(404)));
    });
    assert!(stub.client().is_reachable());

    let dead = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(300));
    assert!(!dead.is_reachable());
}
