use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with_key;

#[tokio::test]
async fn health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health_check", app.addr))
        .send()
        .await
        .expect("execute request");
    assert!(resp.status().is_success());
    assert_eq!(resp.content_length().unwrap(), 0); // empty body
}

/// The server must start, and stay healthy, without an API key
#[tokio::test]
async fn health_check_without_api_key() {
    let app = spawn_app_with_key(None).await;
    let resp = reqwest::get(format!("{}/health_check", app.addr))
        .await
        .expect("execute request");
    assert!(resp.status().is_success());
}
