//! The caller's order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use cardshop_core::Order;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireIdentity;
use crate::routes::page::PageNav;
use crate::state::AppState;

/// My orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "my_orders.html")]
pub struct MyOrdersTemplate {
    pub nav: PageNav,
    /// Newest first.
    pub orders: Vec<Order>,
    /// Order expanded on load, from `/my-orders/{id}`.
    pub highlight: Option<String>,
}

impl MyOrdersTemplate {
    /// Whether `order` is the highlighted one.
    #[must_use]
    pub fn is_highlighted(&self, order: &Order) -> bool {
        self.highlight
            .as_deref()
            .is_some_and(|id| id == order.id.to_string())
    }
}

async fn render(
    state: &AppState,
    nav: PageNav,
    identity: &crate::models::Identity,
    highlight: Option<String>,
) -> Result<MyOrdersTemplate, AppError> {
    let orders = state.orders().my_orders(&identity.principal).await?;
    Ok(MyOrdersTemplate {
        nav,
        orders,
        highlight,
    })
}

/// GET /my-orders
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    nav: PageNav,
    RequireIdentity(identity): RequireIdentity,
) -> Result<MyOrdersTemplate, AppError> {
    render(&state, nav, &identity, None).await
}

/// GET /my-orders/{id}
#[instrument(skip(state, nav, identity))]
pub async fn show(
    State(state): State<AppState>,
    nav: PageNav,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Result<MyOrdersTemplate, AppError> {
    render(&state, nav, &identity, Some(id)).await
}
