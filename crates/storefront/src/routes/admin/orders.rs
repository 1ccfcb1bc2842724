//! Admin orders dashboard and order details.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use cardshop_core::{ExternalBlob, Order, OrderId, OrderStatus, PaymentContactStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::backend::BackendError;
use crate::error::{AppError, add_breadcrumb};
use crate::error_format::user_message;
use crate::filters;
use crate::forms::{FieldErrors, OrderEditForm, US_STATES};
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Identity;
use crate::routes::page::PageNav;
use crate::services::{OrderFilter, OrderStats};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackingForm {
    #[serde(default)]
    pub tracking_number: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Text inputs of the edit form as `(name, label)`; state is a select.
const EDIT_FIELDS: [(&str, &str); 6] = [
    ("customer_name", "Full Name"),
    ("email", "Email"),
    ("phone", "Phone"),
    ("street", "Street Address"),
    ("city", "City"),
    ("zip", "ZIP Code"),
];

/// Orders dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: PageNav,
    /// Orders passing the filter, newest first.
    pub orders: Vec<Order>,
    /// Orders before filtering.
    pub total_count: usize,
    pub stats: OrderStats,
    pub filter: OrderFilter,
    pub statuses: [OrderStatus; 2],
    pub payments: [PaymentContactStatus; 3],
}

impl DashboardTemplate {
    /// Whether `value` is the selected status filter.
    #[must_use]
    pub fn status_selected(&self, value: &str) -> bool {
        self.filter.status.as_deref().unwrap_or(crate::services::orders::ALL) == value
    }

    /// Whether `value` is the selected payment filter.
    #[must_use]
    pub fn payment_selected(&self, value: &str) -> bool {
        self.filter.payment.as_deref().unwrap_or(crate::services::orders::ALL) == value
    }
}

/// Order details template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order.html")]
pub struct OrderDetailsTemplate {
    pub nav: PageNav,
    pub order: Order,
    pub edit: OrderEditForm,
    pub edit_errors: FieldErrors,
    /// Open the edit form on load (after a failed edit).
    pub editing: bool,
    pub error: Option<String>,
    pub statuses: [OrderStatus; 2],
    pub payments: [PaymentContactStatus; 3],
    pub states: &'static [(&'static str, &'static str)],
    pub edit_fields: &'static [(&'static str, &'static str)],
}

impl OrderDetailsTemplate {
    /// Current value of an edit form input.
    #[must_use]
    pub fn edit_value(&self, name: &str) -> &str {
        match name {
            "customer_name" => &self.edit.customer_name,
            "email" => &self.edit.email,
            "phone" => &self.edit.phone,
            "street" => &self.edit.street,
            "city" => &self.edit.city,
            "zip" => &self.edit.zip,
            _ => "",
        }
    }

    /// Whether `code` is the state chosen in the edit form.
    #[must_use]
    pub fn state_selected(&self, code: &str) -> bool {
        self.edit.state == code
    }

    fn new(nav: PageNav, order: Order) -> Self {
        Self {
            nav,
            edit: OrderEditForm::from(&order),
            order,
            edit_errors: FieldErrors::new(),
            editing: false,
            error: None,
            statuses: OrderStatus::ALL,
            payments: PaymentContactStatus::ALL,
            states: &US_STATES,
            edit_fields: &EDIT_FIELDS,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_order_id(id: &str) -> Result<OrderId, AppError> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("Order {id}")))
}

async fn load_order(state: &AppState, identity: &Identity, id: OrderId) -> Result<Order, AppError> {
    state
        .orders()
        .order(&identity.principal, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order #{id}")))
}

fn details_href(id: OrderId) -> String {
    format!("/admin/orders/{id}")
}

/// Flash the outcome of a mutation and go back to the order.
///
/// Rejections are shown to the admin; transport failures become errors.
async fn finish_mutation(
    session: &Session,
    id: OrderId,
    result: Result<(), BackendError>,
    success: &str,
) -> Result<Response, AppError> {
    match result {
        Ok(()) => {
            let order_id = id.to_string();
            add_breadcrumb("admin", success, Some(&[("order_id", order_id.as_str())]));
            set_flash(session, success).await?;
        }
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            warn!(error = %e, order_id = %id, "Order update rejected");
            set_flash(session, user_message(&e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&details_href(id)).into_response())
}

// =============================================================================
// Dashboard
// =============================================================================

/// GET /admin
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Result<DashboardTemplate, AppError> {
    let all = state.orders().all_orders(&identity.principal).await?;

    Ok(DashboardTemplate {
        nav,
        orders: filter.apply(&all),
        total_count: all.len(),
        stats: OrderStats::from_orders(&all),
        filter,
        statuses: OrderStatus::ALL,
        payments: PaymentContactStatus::ALL,
    })
}

// =============================================================================
// Order Details
// =============================================================================

/// GET /admin/orders/{id}
#[instrument(skip(state, nav, identity))]
pub async fn show(
    State(state): State<AppState>,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
) -> Result<OrderDetailsTemplate, AppError> {
    let id = parse_order_id(&id)?;
    let order = load_order(&state, &identity, id).await?;
    Ok(OrderDetailsTemplate::new(nav, order))
}

/// POST /admin/orders/{id}/status
#[instrument(skip(state, session, identity, form))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let id = parse_order_id(&id)?;
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|e: cardshop_core::UnknownStatus| AppError::BadRequest(e.to_string()))?;

    let result = state
        .orders()
        .update_status(&identity.principal, id, status)
        .await;
    finish_mutation(&session, id, result, "Order status updated").await
}

/// POST /admin/orders/{id}/payment
#[instrument(skip(state, session, identity, form))]
pub async fn update_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    let id = parse_order_id(&id)?;
    let status: PaymentContactStatus = form
        .status
        .parse()
        .map_err(|e: cardshop_core::UnknownStatus| AppError::BadRequest(e.to_string()))?;

    let result = state
        .orders()
        .update_payment_contact(&identity.principal, id, status, form.notes.trim())
        .await;
    finish_mutation(&session, id, result, "Payment status updated").await
}

/// POST /admin/orders/{id}/edit
#[instrument(skip(state, session, nav, identity, form))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<OrderEditForm>,
) -> Result<Response, AppError> {
    let id = parse_order_id(&id)?;

    match form.validate() {
        Ok(update) => {
            let result = state.orders().update(&identity.principal, id, &update).await;
            finish_mutation(&session, id, result, "Order updated successfully").await
        }
        Err(errors) => {
            let order = load_order(&state, &identity, id).await?;
            let mut page = OrderDetailsTemplate::new(nav, order);
            page.edit = form;
            page.edit_errors = errors;
            page.editing = true;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// POST /admin/orders/{id}/tracking
#[instrument(skip(state, session, nav, identity, form))]
pub async fn update_tracking(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<TrackingForm>,
) -> Result<Response, AppError> {
    let id = parse_order_id(&id)?;
    let tracking_number = form.tracking_number.trim();

    if tracking_number.is_empty() {
        let order = load_order(&state, &identity, id).await?;
        let mut page = OrderDetailsTemplate::new(nav, order);
        page.error = Some("Please enter a tracking number".to_string());
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let result = state
        .orders()
        .set_tracking_number(&identity.principal, id, tracking_number)
        .await;
    finish_mutation(&session, id, result, "Tracking number saved").await
}

/// POST /admin/orders/{id}/delete
#[instrument(skip(state, session, identity))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_order_id(&id)?;

    match state.orders().delete(&identity.principal, id).await {
        Ok(()) => {
            set_flash(&session, format!("Order #{id} deleted")).await?;
            Ok(Redirect::to("/admin").into_response())
        }
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            set_flash(&session, user_message(&e)).await?;
            Ok(Redirect::to(&details_href(id)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Attachments
// =============================================================================

async fn attachment(
    state: &AppState,
    identity: &Identity,
    id: &str,
    pick: fn(&Order) -> Option<&ExternalBlob>,
) -> Result<Response, AppError> {
    let id = parse_order_id(id)?;
    let order = load_order(state, identity, id).await?;
    let blob = pick(&order).ok_or_else(|| AppError::NotFound("Attachment".to_string()))?;
    let resolved = state.blobs().resolve(blob).await?;

    Ok((
        [
            (header::CONTENT_TYPE, resolved.content_type),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        Body::from(resolved.bytes.to_vec()),
    )
        .into_response())
}

/// GET /admin/orders/{id}/photo
pub async fn photo(
    State(state): State<AppState>,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    attachment(&state, &identity, &id, |order| order.id_info.photo.as_ref()).await
}

/// GET /admin/orders/{id}/signature
pub async fn signature(
    State(state): State<AppState>,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    attachment(&state, &identity, &id, |order| order.id_info.signature.as_ref()).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_id() {
        assert_eq!(parse_order_id("42").unwrap(), OrderId::new(42));
        assert!(matches!(parse_order_id("abc"), Err(AppError::NotFound(_))));
    }

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(7),
            customer_name: "Jane Roe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "5551234567".to_string(),
            shipping_address: cardshop_core::Address {
                street: "1 Elm St".to_string(),
                city: "Albany".to_string(),
                state: "NY".to_string(),
                zip: "12207".to_string(),
            },
            id_info: cardshop_core::IdInformation::default(),
            status: OrderStatus::Pending,
            payment_contact_status: PaymentContactStatus::NotContacted,
            contact_notes: String::new(),
            tracking_number: None,
            created_time: 0,
            owner: cardshop_core::Principal::anonymous(),
        }
    }

    #[test]
    fn test_details_prefill_edit_form() {
        let page = OrderDetailsTemplate::new(PageNav::default(), sample_order());
        assert_eq!(page.edit_value("customer_name"), "Jane Roe");
        assert_eq!(page.edit_value("zip"), "12207");
        assert_eq!(page.edit_value("unknown"), "");
        assert!(page.state_selected("NY"));
        assert!(!page.state_selected("CA"));
        assert!(EDIT_FIELDS.iter().all(|(name, _)| *name != "state"));
    }

    #[test]
    fn test_details_page_renders() {
        let html = OrderDetailsTemplate::new(PageNav::default(), sample_order())
            .render()
            .unwrap();
        assert!(html.contains("Order #7"));
        assert!(html.contains("/admin/orders/7/status"));
        assert!(!html.contains("/admin/orders/7/photo"));
    }

    #[test]
    fn test_filter_selection() {
        let page = DashboardTemplate {
            nav: PageNav::default(),
            orders: Vec::new(),
            total_count: 0,
            stats: OrderStats::default(),
            filter: OrderFilter {
                status: Some("shipped".to_string()),
                ..OrderFilter::default()
            },
            statuses: OrderStatus::ALL,
            payments: PaymentContactStatus::ALL,
        };
        assert!(page.status_selected("shipped"));
        assert!(!page.status_selected("all"));
        assert!(page.payment_selected("all"));
    }
}
