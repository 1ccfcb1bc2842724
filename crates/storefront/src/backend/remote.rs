//! HTTP client for the remote order backend.
//!
//! Every operation is `POST {base}/api/{method}` with a JSON object of
//! arguments. The caller principal travels in [`CALLER_HEADER`] and the
//! service key as a bearer token. Replies are `{"ok": value}` or
//! `{"err": "message"}`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cardshop_core::{
    NewOrder, Order, OrderId, OrderStatus, OrderUpdate, PaymentContactStatus, Principal,
    UserProfile, UserRole,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::{Backend, BackendError, BackendResult};

/// Header carrying the caller's textual principal.
pub const CALLER_HEADER: &str = "x-caller-principal";

#[derive(serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply<T> {
    Ok(T),
    Err(String),
}

/// Decode a `{"ok"}` / `{"err"}` reply body.
fn decode_reply<T: DeserializeOwned>(body: &str) -> BackendResult<T> {
    match serde_json::from_str::<Reply<T>>(body)? {
        Reply::Ok(value) => Ok(value),
        Reply::Err(message) => Err(BackendError::from_message(message)),
    }
}

/// Error for a non-success HTTP status.
///
/// 401 and 403 are authorization failures whatever the body says; the
/// envelope message is kept when the body carries one.
fn status_error(status: reqwest::StatusCode, body: &str) -> BackendError {
    if matches!(
        status,
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
    ) {
        let message = match serde_json::from_str::<Reply<serde_json::Value>>(body) {
            Ok(Reply::Err(message)) => message,
            _ if body.trim().is_empty() => format!("Unauthorized: {status}"),
            _ => truncate(body.trim(), 200),
        };
        return BackendError::Unauthorized(message);
    }

    BackendError::Status {
        status: status.as_u16(),
        body: truncate(body, 200),
    }
}

fn truncate(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

/// Order backend reached over HTTP.
#[derive(Clone)]
pub struct RemoteBackend {
    inner: Arc<RemoteBackendInner>,
}

struct RemoteBackendInner {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    ready: AtomicBool,
}

impl RemoteBackend {
    /// Create a client for the backend at `base_url`.
    ///
    /// The client starts not ready; call [`RemoteBackend::probe`] or
    /// [`RemoteBackend::spawn_readiness_probe`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(RemoteBackendInner {
                client,
                base_url,
                api_key,
                ready: AtomicBool::new(false),
            }),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/{method}", self.inner.base_url)
    }

    /// Check `GET {base}/health` and record the result as readiness.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/health", self.inner.base_url);
        let ready = match self.inner.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Backend health probe failed");
                false
            }
        };

        let was_ready = self.inner.ready.swap(ready, Ordering::Relaxed);
        if ready != was_ready {
            if ready {
                info!(backend = %self.inner.base_url, "Backend is ready");
            } else {
                warn!(backend = %self.inner.base_url, "Backend is no longer ready");
            }
        }
        ready
    }

    /// Probe readiness on a fixed interval in the background.
    #[must_use]
    pub fn spawn_readiness_probe(&self, interval: Duration) -> JoinHandle<()> {
        let backend = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                backend.probe().await;
            }
        })
    }

    /// Call a backend method.
    #[instrument(skip(self, caller, args), fields(caller = %caller))]
    async fn call<A, T>(&self, method: &str, caller: &Principal, args: &A) -> BackendResult<T>
    where
        A: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        if !self.is_ready() {
            return Err(BackendError::NotReady);
        }

        let mut request = self
            .inner
            .client
            .post(self.endpoint(method))
            .header(CALLER_HEADER, caller.to_text())
            .json(args);
        if let Some(key) = &self.inner.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %truncate(&body, 500),
                "Backend returned non-success status"
            );
            return Err(status_error(status, &body));
        }

        decode_reply(&body).inspect_err(|e| {
            if matches!(e, BackendError::Parse(_)) {
                error!(
                    error = %e,
                    body = %truncate(&body, 500),
                    "Failed to parse backend reply"
                );
            } else {
                debug!(error = %e, "Backend rejected call");
            }
        })
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Relaxed)
    }

    async fn ensure_user_role(&self, caller: &Principal) -> BackendResult<()> {
        self.call("ensureUserRole", caller, &json!({})).await
    }

    async fn get_caller_user_role(&self, caller: &Principal) -> BackendResult<UserRole> {
        self.call("getCallerUserRole", caller, &json!({})).await
    }

    async fn is_caller_admin(&self, caller: &Principal) -> BackendResult<bool> {
        self.call("isCallerAdmin", caller, &json!({})).await
    }

    async fn assign_caller_user_role(
        &self,
        caller: &Principal,
        user: &Principal,
        role: UserRole,
    ) -> BackendResult<()> {
        self.call(
            "assignCallerUserRole",
            caller,
            &json!({ "user": user, "role": role }),
        )
        .await
    }

    async fn assign_admin_role_to_caller(&self, caller: &Principal) -> BackendResult<()> {
        self.call("assignAdminRoleToCaller", caller, &json!({}))
            .await
    }

    async fn admin_login(
        &self,
        caller: &Principal,
        username: &str,
        password: &str,
    ) -> BackendResult<bool> {
        self.call(
            "adminLogin",
            caller,
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    async fn get_caller_user_profile(
        &self,
        caller: &Principal,
    ) -> BackendResult<Option<UserProfile>> {
        self.call("getCallerUserProfile", caller, &json!({})).await
    }

    async fn get_user_profile(
        &self,
        caller: &Principal,
        user: &Principal,
    ) -> BackendResult<Option<UserProfile>> {
        self.call("getUserProfile", caller, &json!({ "user": user }))
            .await
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Principal,
        profile: &UserProfile,
    ) -> BackendResult<()> {
        self.call("saveCallerUserProfile", caller, &json!({ "profile": profile }))
            .await
    }

    async fn submit_order(&self, caller: &Principal, order: &NewOrder) -> BackendResult<OrderId> {
        self.call("submitOrder", caller, order).await
    }

    async fn get_all_orders(&self, caller: &Principal) -> BackendResult<Vec<Order>> {
        self.call("getAllOrders", caller, &json!({})).await
    }

    async fn get_my_orders(&self, caller: &Principal) -> BackendResult<Vec<Order>> {
        self.call("getMyOrders", caller, &json!({})).await
    }

    async fn get_order(&self, caller: &Principal, id: OrderId) -> BackendResult<Option<Order>> {
        self.call("getOrder", caller, &json!({ "orderId": id })).await
    }

    async fn get_order_status(
        &self,
        caller: &Principal,
        id: OrderId,
    ) -> BackendResult<Option<OrderStatus>> {
        self.call("getOrderStatus", caller, &json!({ "orderId": id }))
            .await
    }

    async fn update_order_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: OrderStatus,
    ) -> BackendResult<()> {
        self.call(
            "updateOrderStatus",
            caller,
            &json!({ "orderId": id, "newStatus": status }),
        )
        .await
    }

    async fn update_payment_contact_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: PaymentContactStatus,
        notes: &str,
    ) -> BackendResult<()> {
        self.call(
            "updatePaymentContactStatus",
            caller,
            &json!({ "orderId": id, "newStatus": status, "notes": notes }),
        )
        .await
    }

    async fn update_order(
        &self,
        caller: &Principal,
        id: OrderId,
        update: &OrderUpdate,
    ) -> BackendResult<()> {
        self.call(
            "updateOrder",
            caller,
            &json!({ "orderId": id, "update": update }),
        )
        .await
    }

    async fn delete_order(&self, caller: &Principal, id: OrderId) -> BackendResult<()> {
        self.call("deleteOrder", caller, &json!({ "orderId": id }))
            .await
    }

    async fn add_or_update_tracking_number(
        &self,
        caller: &Principal,
        id: OrderId,
        tracking_number: &str,
    ) -> BackendResult<()> {
        self.call(
            "addOrUpdateTrackingNumber",
            caller,
            &json!({ "orderId": id, "trackingNumber": tracking_number }),
        )
        .await
    }

    async fn get_banned_users(&self, caller: &Principal) -> BackendResult<Vec<Principal>> {
        self.call("getBannedUsers", caller, &json!({})).await
    }

    async fn is_banned_user(&self, caller: &Principal, user: &Principal) -> BackendResult<bool> {
        self.call("isBannedUser", caller, &json!({ "user": user }))
            .await
    }

    async fn ban_user(&self, caller: &Principal, user: &Principal) -> BackendResult<()> {
        self.call("banUser", caller, &json!({ "user": user })).await
    }

    async fn unban_user(&self, caller: &Principal, user: &Principal) -> BackendResult<()> {
        self.call("unbanUser", caller, &json!({ "user": user })).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ok_reply() {
        let id: OrderId = decode_reply(r#"{"ok": 42}"#).unwrap();
        assert_eq!(id, OrderId::new(42));

        let profile: Option<UserProfile> = decode_reply(r#"{"ok": null}"#).unwrap();
        assert!(profile.is_none());
    }

    #[test]
    fn test_decode_err_reply() {
        let err = decode_reply::<()>(r#"{"err": "Unauthorized: Only admins can view all orders"}"#)
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized(_)));

        let err = decode_reply::<()>(r#"{"err": "Order not found"}"#).unwrap_err();
        assert!(matches!(err, BackendError::Rejected(ref m) if m == "Order not found"));
    }

    #[test]
    fn test_forbidden_status_is_authorization_failure() {
        let err = status_error(
            reqwest::StatusCode::UNAUTHORIZED,
            "Unauthorized: caller is not an admin",
        );
        assert!(matches!(err, BackendError::Unauthorized(ref m) if m == "Unauthorized: caller is not an admin"));
        assert!(err.is_access_rejection());
        assert!(!err.is_transient());

        let err = status_error(reqwest::StatusCode::FORBIDDEN, r#"{"err": "User is banned"}"#);
        assert!(matches!(err, BackendError::Unauthorized(ref m) if m == "User is banned"));

        let err = status_error(reqwest::StatusCode::FORBIDDEN, "");
        assert!(matches!(err, BackendError::Unauthorized(ref m) if m.starts_with("Unauthorized")));

        let err = status_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, BackendError::Status { status: 502, .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_decode_malformed_reply() {
        assert!(matches!(
            decode_reply::<bool>("<html>"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let backend =
            RemoteBackend::new("http://backend.local:4943/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://backend.local:4943");
        assert_eq!(
            backend.endpoint("getMyOrders"),
            "http://backend.local:4943/api/getMyOrders"
        );
    }

    #[tokio::test]
    async fn test_not_ready_before_probe() {
        let backend =
            RemoteBackend::new("http://127.0.0.1:9", None, Duration::from_millis(200)).unwrap();
        assert!(!backend.is_ready());
        let err = backend
            .get_my_orders(&Principal::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotReady));
    }
}
