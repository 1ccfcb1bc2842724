//! Integration tests for Cardshop.
//!
//! Each test spawns the storefront on an ephemeral port with an in-memory
//! order backend and in-memory sessions, then drives it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cardshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_pages` - Public pages, health, headers, fallback routing
//! - `ordering` - Login, profile setup, order submission and tracking
//! - `admin` - Admin gates, order management and bans

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardshop_storefront::backend::{Backend, InMemoryBackend};
use cardshop_storefront::config::StorefrontConfig;
use cardshop_storefront::models::Identity;
use cardshop_storefront::services::MemoryAdminPanelStore;
use cardshop_storefront::state::AppState;
use reqwest::{Client, Response, multipart};
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tower_sessions::MemoryStore;

/// Admin panel username configured for every test app.
pub const PANEL_USERNAME: &str = "admin";

/// Admin panel password configured for every test app.
pub const PANEL_PASSWORD: &str = "panel-Secret-9z!Kq2@Lm7#Xw4";

/// Smallest byte string sniffed as a PNG.
pub const PNG_BYTES: [u8; 16] = [
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];

/// A running storefront.
pub struct TestApp {
    pub base_url: String,
    pub backend: Arc<InMemoryBackend>,
    /// Identity allowed to claim the admin role on first login.
    pub bootstrap: Identity,
    server: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl TestApp {
    /// Spawn with the development configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn after adjusting the configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        Self::spawn_with_state(configure, |state| state).await
    }

    /// Spawn with admin panel flags kept in a shared store the test can inspect.
    pub async fn spawn_with_panel_store(store: MemoryAdminPanelStore) -> Self {
        Self::spawn_with_state(|_| {}, |state| state.with_admin_panel_store(store)).await
    }

    async fn spawn_with_state(
        configure: impl FnOnce(&mut StorefrontConfig),
        adjust: impl FnOnce(AppState) -> AppState,
    ) -> Self {
        let bootstrap = Identity::generate();

        let mut config = StorefrontConfig::for_development();
        config.static_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../storefront/static")
            .display()
            .to_string();
        config.admin.bootstrap_principal = Some(bootstrap.principal.clone());
        config.admin.panel_password = Some(SecretString::from(PANEL_PASSWORD));
        configure(&mut config);

        let backend = Arc::new(
            InMemoryBackend::new(config.admin.bootstrap_principal.clone())
                .with_panel_credentials(PANEL_USERNAME, PANEL_PASSWORD)
                .unwrap(),
        );
        let state = adjust(
            AppState::new(config, backend.clone() as Arc<dyn Backend>, None).unwrap(),
        );
        let app = cardshop_storefront::app(state, MemoryStore::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            backend,
            bootstrap,
            server,
        }
    }

    /// A fresh browser with its own cookie jar.
    #[must_use]
    pub fn browser(&self) -> Browser {
        Browser {
            base_url: self.base_url.clone(),
            client: Client::builder()
                .cookie_store(true)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        }
    }

    /// A browser logged in as a new identity with a saved profile.
    pub async fn customer(&self) -> (Browser, Identity) {
        let browser = self.browser();
        let identity = Identity::generate();
        browser.login(&identity).await;
        browser.save_profile("Jane Customer", "jane@example.com").await;
        (browser, identity)
    }

    /// A browser logged in as the bootstrap admin with a panel session.
    pub async fn admin(&self) -> Browser {
        let browser = self.browser();
        browser.login(&self.bootstrap).await;
        let response = browser
            .post_form(
                "/admin/login",
                &[("username", PANEL_USERNAME), ("password", PANEL_PASSWORD)],
            )
            .await;
        assert_eq!(location(&response), "/admin");
        browser
    }
}

/// HTTP client that keeps cookies and does not follow redirects.
pub struct Browser {
    base_url: String,
    pub client: Client,
}

impl Browser {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn post_multipart(&self, path: &str, form: multipart::Form) -> Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    /// Log in as `identity` via its recovery key.
    pub async fn login(&self, identity: &Identity) {
        let response = self
            .post_form("/auth/login", &[("recovery_key", identity.recovery_key())])
            .await;
        assert_eq!(response.status(), 303);
    }

    pub async fn save_profile(&self, name: &str, email: &str) {
        let response = self
            .post_form(
                "/profile",
                &[("name", name), ("email", email), ("phone", "5551234567")],
            )
            .await;
        assert_eq!(response.status(), 303);
    }

    /// Submit a valid order and return its id.
    pub async fn place_order(&self) -> String {
        let response = self.post_multipart("/order", order_form(&[])).await;
        assert_eq!(response.status(), 303, "{}", response.text().await.unwrap());
        location(&response)
            .strip_prefix("/confirmation/")
            .unwrap()
            .to_string()
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

/// Valid order fields, with `overrides` replacing or adding values.
#[must_use]
pub fn order_fields(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, String)> {
    let mut fields: Vec<(&'static str, String)> = [
        ("customer_name", "Jane Customer"),
        ("email", "jane@example.com"),
        ("phone", "5551234567"),
        ("street", "123 Main Street"),
        ("city", "Springfield"),
        ("state", "IL"),
        ("zip", "62701"),
        ("id_name", "Jane Q Customer"),
        ("id_date_of_birth", "1990-04-12"),
        ("id_sex", "F"),
        ("id_height", "5'6\""),
        ("id_weight", "130 lbs"),
        ("id_hair_color", "Brown"),
        ("id_eye_color", "Green"),
        ("id_street", "45 Oak Avenue"),
        ("id_city", "Peoria"),
        ("id_state", "IL"),
        ("id_zip", "61602"),
    ]
    .into_iter()
    .map(|(name, value)| (name, value.to_string()))
    .collect();

    for (name, value) in overrides {
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some(field) => field.1 = (*value).to_string(),
            None => fields.push((name, (*value).to_string())),
        }
    }
    fields
}

/// Multipart order body with a PNG photo and a drawn signature.
#[must_use]
pub fn order_form(overrides: &[(&'static str, &'static str)]) -> multipart::Form {
    let signature = format!("data:image/png;base64,{}", STANDARD.encode(PNG_BYTES));
    let photo = multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name("photo.png")
        .mime_str("image/png")
        .unwrap();

    order_fields(overrides)
        .into_iter()
        .fold(multipart::Form::new(), |form, (name, value)| {
            form.text(name, value)
        })
        .part("photo", photo)
        .text("signature_data", signature)
}
