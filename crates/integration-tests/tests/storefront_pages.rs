//! Public pages, health checks, response headers and fallback routing.

use cardshop_integration_tests::{TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    let health = browser.get("/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    assert_eq!(browser.get("/health/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_page_has_security_headers() {
    let app = TestApp::spawn().await;
    let response = app.browser().get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));

    let body = response.text().await.unwrap();
    assert!(body.contains("Custom ID cards, printed and shipped"));
    assert!(body.contains("href=\"/order\""));
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = TestApp::spawn().await;
    let response = app
        .browser()
        .client
        .get(format!("{}/prices", app.base_url))
        .header("x-request-id", "edge-4f2a")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "edge-4f2a");
}

#[tokio::test]
async fn test_prices_lists_tiers() {
    let app = TestApp::spawn().await;
    let body = app.browser().get("/prices").await.text().await.unwrap();

    assert!(body.contains("Most popular"));
    assert!(body.contains("copies"));
}

#[tokio::test]
async fn test_unknown_paths_redirect_to_canonical_pages() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    let response = browser.get("/confirmation/12/extra").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/confirmation/12");

    let response = browser.get("/nowhere").await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_order_form_requires_login() {
    let app = TestApp::spawn().await;
    let response = app.browser().get("/order").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("You must be logged in to place an order")
    );
}

#[tokio::test]
async fn test_fragment_endpoints_answer_401_without_login() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    let response = browser
        .post_form("/order/validate/email", &[("email", "x")])
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = browser.get("/my-orders").await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    assert_eq!(
        browser.get("/static/css/main.css").await.status(),
        StatusCode::OK
    );
    assert_eq!(
        browser.get("/static/js/app.js").await.status(),
        StatusCode::OK
    );
}
