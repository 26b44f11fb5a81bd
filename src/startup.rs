use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlers;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::newsletter_client::NewsletterClient;
use crate::routes::health_check;
use crate::routes::payload_too_large;
use crate::routes::subscribe;
use crate::routes::MAX_BODY_BYTES;
use crate::routes::RelayConfig;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener, build the provider client, and declare the routes.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // with port 0, this is the port assigned by the OS
        let port = listener.local_addr()?.port();

        let client = cfg.newsletter_api.client()?;
        let relay_config = RelayConfig::from_settings(&cfg.newsletter_api);

        match &relay_config.credential {
            Some(c) => tracing::info!(api_key = %c.redacted(), "newsletter api key configured"),
            None => tracing::warn!(
                "no newsletter api key configured; /api/subscribe will answer 500"
            ),
        }

        let server = run(listener, client, relay_config)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// API endpoints:
/// `/health_check` (GET)
/// `/api/subscribe` (POST; other methods get 405)
pub fn run(
    listener: TcpListener,
    client: NewsletterClient,
    relay_config: RelayConfig,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`, so each worker's `App` shares the same client (and its
    // connection pool)
    let client = web::Data::new(client);
    let relay_config = web::Data::new(relay_config);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            // all methods reach the handler, which rejects non-POST itself.
            //
            // `PayloadConfig` caps what the `Bytes` extractor will buffer (actix's
            // default is 256 KiB); going over it yields a 413, which
            // `ErrorHandlers` rewrites into the usual `{"ok": false, ...}` body
            .service(
                web::resource("/api/subscribe")
                    .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
                    .wrap(
                        ErrorHandlers::new()
                            .handler(StatusCode::PAYLOAD_TOO_LARGE, payload_too_large),
                    )
                    .to(subscribe),
            )
            .app_data(client.clone())
            .app_data(relay_config.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
