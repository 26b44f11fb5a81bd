use subscribe_relay::configuration::get_configuration;
use subscribe_relay::startup::Application;
use subscribe_relay::telemetry::get_subscriber;
use subscribe_relay::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("subscribe-relay", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    let app = Application::build(cfg).await?;
    tracing::info!(port = app.get_port(), "listening");
    app.run_until_stopped().await?;
    Ok(())
}
