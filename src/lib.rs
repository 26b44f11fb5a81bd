pub mod classification;
pub mod configuration;
pub mod domain;
pub mod newsletter_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
