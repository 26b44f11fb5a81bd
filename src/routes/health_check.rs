use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness probe for the hosting platform. Does not touch the newsletter
/// provider, so it succeeds even when the API key is missing.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
