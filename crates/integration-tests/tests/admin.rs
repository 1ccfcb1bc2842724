//! Admin gates, order management and bans.

use cardshop_integration_tests::{PANEL_PASSWORD, PANEL_USERNAME, TestApp, location};
use cardshop_storefront::config::AdminGatePolicy;
use cardshop_storefront::services::{MemoryAdminPanelStore, admin_panel_session_key};
use reqwest::StatusCode;

#[tokio::test]
async fn test_admin_requires_login() {
    let app = TestApp::spawn().await;
    let response = app.browser().get("/admin").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains("Admin Access Required"));
}

#[tokio::test]
async fn test_customer_is_denied() {
    let app = TestApp::spawn().await;
    let (browser, _identity) = app.customer().await;

    let response = browser.get("/admin").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.text().await.unwrap().contains("Access Denied"));
}

#[tokio::test]
async fn test_bootstrap_admin_needs_panel_login() {
    let app = TestApp::spawn().await;
    let browser = app.browser();
    browser.login(&app.bootstrap).await;

    let body = browser.get("/").await.text().await.unwrap();
    assert!(body.contains("Admin access granted"));

    let response = browser.get("/admin").await;
    assert_eq!(location(&response), "/admin/login");

    let response = browser
        .post_form(
            "/admin/login",
            &[("username", PANEL_USERNAME), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains("Invalid credentials"));

    let response = browser
        .post_form("/admin/login", &[("username", ""), ("password", "")])
        .await;
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Please enter both username and password")
    );

    let response = browser
        .post_form(
            "/admin/login",
            &[("username", PANEL_USERNAME), ("password", PANEL_PASSWORD)],
        )
        .await;
    assert_eq!(location(&response), "/admin");
    assert_eq!(browser.get("/admin").await.status(), StatusCode::OK);

    let response = browser.get("/admin/login").await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn test_panel_flag_uses_configured_store() {
    let store = MemoryAdminPanelStore::new();
    let app = TestApp::spawn_with_panel_store(store.clone()).await;
    let key = admin_panel_session_key(&app.bootstrap.principal);

    let browser = app.admin().await;
    assert_eq!(store.keys().await, vec![key.clone()]);
    assert_eq!(browser.get("/admin").await.status(), StatusCode::OK);

    let response = browser.post_form("/admin/logout", &[]).await;
    assert_eq!(location(&response), "/");
    assert!(store.keys().await.is_empty());
    assert_eq!(location(&browser.get("/admin").await), "/admin/login");

    app.admin().await;
    assert_eq!(store.keys().await, vec![key]);
    let response = browser.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/");
    assert!(store.keys().await.is_empty());
}

#[tokio::test]
async fn test_role_policy_skips_panel_login() {
    let app = TestApp::spawn_with(|config| config.admin.gate_policy = AdminGatePolicy::Role).await;
    let browser = app.browser();
    browser.login(&app.bootstrap).await;

    assert_eq!(browser.get("/admin").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_manage_order() {
    let app = TestApp::spawn().await;
    let (customer, _identity) = app.customer().await;
    let id = customer.place_order().await;
    let admin = app.admin().await;

    let body = admin.get("/admin").await.text().await.unwrap();
    assert!(body.contains(&format!("#{id}")));
    assert!(body.contains("Jane Customer"));

    let details = format!("/admin/orders/{id}");
    let response = admin
        .post_form(&format!("{details}/status"), &[("status", "shipped")])
        .await;
    assert_eq!(location(&response), details);

    let response = admin
        .post_form(
            &format!("{details}/payment"),
            &[("status", "paymentReceived"), ("notes", "Paid by card")],
        )
        .await;
    assert_eq!(location(&response), details);

    admin
        .post_form(&format!("{details}/tracking"), &[("tracking_number", "1Z999AA1")])
        .await;

    let body = admin.get(&details).await.text().await.unwrap();
    assert!(body.contains("Tracking number saved"));
    assert!(body.contains("value=\"1Z999AA1\""));
    assert!(body.contains("Paid by card"));

    let body = customer.get("/my-orders").await.text().await.unwrap();
    assert!(body.contains("Shipped"));
    assert!(body.contains("1Z999AA1"));

    let response = admin.get(&format!("{details}/photo")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_filter_and_edit_orders() {
    let app = TestApp::spawn().await;
    let (customer, _identity) = app.customer().await;
    let id = customer.place_order().await;
    let admin = app.admin().await;

    let body = admin
        .get("/admin?status=shipped")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("No orders match"));

    let details = format!("/admin/orders/{id}");
    let response = admin
        .post_form(
            &format!("{details}/edit"),
            &[
                ("customer_name", "Janet Customer"),
                ("email", "bad"),
                ("phone", "5551234567"),
                ("street", "123 Main Street"),
                ("city", "Springfield"),
                ("state", "IL"),
                ("zip", "62701"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = admin
        .post_form(
            &format!("{details}/edit"),
            &[
                ("customer_name", "Janet Customer"),
                ("email", "janet@example.com"),
                ("phone", "5551234567"),
                ("street", "123 Main Street"),
                ("city", "Springfield"),
                ("state", "IL"),
                ("zip", "62701"),
            ],
        )
        .await;
    assert_eq!(location(&response), details);

    let body = admin.get("/admin?search=janet").await.text().await.unwrap();
    assert!(body.contains("Janet Customer"));

    let response = admin.post_form(&format!("{details}/delete"), &[]).await;
    assert_eq!(location(&response), "/admin");
    assert_eq!(admin.get(&details).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ban_blocks_ordering() {
    let app = TestApp::spawn().await;
    let (customer, identity) = app.customer().await;
    customer.place_order().await;
    let admin = app.admin().await;
    let principal = identity.principal.to_string();

    let body = admin.get("/admin/users").await.text().await.unwrap();
    assert!(body.contains("Jane Customer"));

    let response = admin
        .post_form("/admin/users/ban", &[("principal", "not a principal")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("Invalid principal ID format"));

    let response = admin
        .post_form("/admin/users/ban", &[("principal", principal.as_str())])
        .await;
    assert_eq!(location(&response), "/admin/users");
    let body = admin.get("/admin/users").await.text().await.unwrap();
    assert!(body.contains("User banned successfully"));

    let response = customer.get("/order").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.text().await.unwrap().contains("Access Restricted"));

    admin
        .post_form("/admin/users/unban", &[("principal", principal.as_str())])
        .await;
    assert_eq!(customer.get("/order").await.status(), StatusCode::OK);
}
