use std::io::Write;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::Value;
use subscribe_relay::configuration::get_configuration;
use subscribe_relay::startup::Application;
use subscribe_relay::telemetry::get_subscriber;
use subscribe_relay::telemetry::init_subscriber;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-api-key";

/// Every log line emitted by any app spawned in this test binary. Kept so that
/// tests can assert on what ends up in the logs (e.g. that the API key never
/// does).
static LOGS: Lazy<Mutex<Vec<u8>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// `MakeWriter` target for the test subscriber: appends to `LOGS`, and echoes
/// to stdout when `TEST_LOG` is set.
struct CapturedLogs;

impl Write for CapturedLogs {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> std::io::Result<usize> {
        LOGS.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        if std::env::var("TEST_LOG").is_ok() {
            std::io::stdout().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { std::io::stdout().flush() }
}

/// Init the tracing subscriber once for the whole test binary.
///
/// Logs are always captured (see `captured_logs`); to also see them, use the
/// env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // any `Fn() -> impl Write` satisfies `MakeWriter`, just like
    // `std::io::stdout` does
    let subscriber = get_subscriber("test", "debug", || CapturedLogs);
    init_subscriber(subscriber).expect("failed to init tracing");
});

/// Bunyan lines captured so far, across all tests in this binary
pub fn captured_logs() -> Vec<Value> {
    let logs = LOGS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    String::from_utf8_lossy(&logs)
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

pub struct TestApp {
    pub addr: String,
    /// Stands in for the newsletter provider
    pub newsletter_server: MockServer,
}

impl TestApp {
    /// `POST /api/subscribe` with a JSON body
    pub async fn post_subscribe(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/subscribe", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    /// `POST /api/subscribe` with an arbitrary body (not necessarily JSON)
    pub async fn post_subscribe_raw(
        &self,
        body: String,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/subscribe", self.addr))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn request_subscribe(
        &self,
        method: reqwest::Method,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .request(method, format!("{}/api/subscribe", self.addr))
            .send()
            .await
            .expect("execute request")
    }
}

/// Spawn the app with a valid API key, pointed at a fresh mock provider.
pub async fn spawn_app() -> TestApp { spawn_app_with_key(Some(TEST_API_KEY)).await }

/// Like `spawn_app`, but with any (or no) API key.
pub async fn spawn_app_with_key(api_key: Option<&str>) -> TestApp {
    Lazy::force(&TRACING);

    let newsletter_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("read configuration");
        // random available port
        cfg.application.port = 0;
        cfg.newsletter_api.base_url = newsletter_server.uri();
        // overrides whatever BUTTONDOWN_API_KEY the test runner has set
        cfg.newsletter_api.api_key = api_key.map(|k| Secret::new(k.to_string()));
        cfg.newsletter_api.timeout_milliseconds = 1000;
        cfg
    };

    let app = Application::build(cfg).await.expect("build application");
    let addr = format!("http://localhost:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        newsletter_server,
    }
}
