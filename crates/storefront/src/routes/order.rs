//! Order form, blur validation, generators and confirmation.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use cardshop_core::{Order, OrderId, PricingTier, Price};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::backend::BackendError;
use crate::error::{AppError, add_breadcrumb};
use crate::error_format::user_message;
use crate::filters;
use crate::forms::order::OrderSubmission;
use crate::forms::{
    FieldErrors, GENERAL_ERROR_MESSAGE, GeneratedAddress, LOGIN_REQUIRED_MESSAGE, OrderField,
    OrderForm, US_STATES, generate_address, generate_full_name,
};
use crate::middleware::{
    GateRejection, OptionalIdentity, RequireIdentity, banned_user_gate, profile_gate,
};
use crate::models::Identity;
use crate::routes::page::PageNav;
use crate::state::AppState;

// =============================================================================
// Form view
// =============================================================================

const SEX_OPTIONS: [(&str, &str); 2] = [("M", "Male"), ("F", "Female")];

/// One input of the order form as rendered.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub error: Option<String>,
    pub input_type: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
    /// Select options as `(value, label)`; empty for text inputs.
    pub options: &'static [(&'static str, &'static str)],
}

impl FieldView {
    fn text(name: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            name,
            label,
            value: String::new(),
            error: None,
            input_type: "text",
            placeholder,
            required: true,
            options: &[],
        }
    }

    const fn kind(mut self, input_type: &'static str) -> Self {
        self.input_type = input_type;
        self
    }

    const fn select(mut self, options: &'static [(&'static str, &'static str)]) -> Self {
        self.options = options;
        self
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Whether `value` is the current selection.
    #[must_use]
    pub fn is_selected(&self, value: &str) -> bool {
        self.value == value
    }
}

/// Checkbox that fills a section with random values on submit.
#[derive(Debug, Clone)]
pub struct GeneratorView {
    pub name: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// A titled group of inputs.
#[derive(Debug, Clone)]
pub struct FormSection {
    pub title: &'static str,
    /// Generator checkbox shown in the section header, if any.
    pub generator: Option<GeneratorView>,
    pub fields: Vec<FieldView>,
}

fn fill(mut view: FieldView, form: &OrderForm, errors: &FieldErrors) -> FieldView {
    view.value = match view.name {
        "id_weight" => form.id_weight.clone(),
        name => name
            .parse::<OrderField>()
            .map(|field| form.value(field).to_string())
            .unwrap_or_default(),
    };
    view.error = errors.get(view.name).map(String::from);
    view
}

/// Lay out the order form with current values and errors.
#[must_use]
pub fn form_sections(form: &OrderForm, errors: &FieldErrors) -> Vec<FormSection> {
    let section = |title, generator, fields: Vec<FieldView>| FormSection {
        title,
        generator,
        fields: fields.into_iter().map(|f| fill(f, form, errors)).collect(),
    };

    vec![
        section(
            "Customer Information",
            None,
            vec![
                FieldView::text("customer_name", "Full Name", "John Doe"),
                FieldView::text("email", "Email Address", "john@example.com").kind("email"),
                FieldView::text("phone", "Phone Number", "(555) 123-4567").kind("tel"),
            ],
        ),
        section(
            "Shipping Address",
            None,
            vec![
                FieldView::text("street", "Street Address", "123 Main St"),
                FieldView::text("city", "City", "New York"),
                FieldView::text("state", "State", "Select state").select(&US_STATES),
                FieldView::text("zip", "ZIP Code", "10001"),
            ],
        ),
        section(
            "ID Information",
            Some(GeneratorView {
                name: "generate_name",
                label: "Generate random name",
                checked: form.generate_name,
            }),
            vec![
                FieldView::text("id_name", "Name on ID", "John Doe"),
                FieldView::text("id_date_of_birth", "Date of Birth", "").kind("date"),
                FieldView::text("id_sex", "Sex/Gender", "Select").select(&SEX_OPTIONS),
                FieldView::text("id_height", "Height", "5'10\""),
                FieldView::text("id_weight", "Weight", "170 lbs").optional(),
                FieldView::text("id_hair_color", "Hair Color", "Brown"),
                FieldView::text("id_eye_color", "Eye Color", "Blue"),
            ],
        ),
        section(
            "Address on ID",
            Some(GeneratorView {
                name: "generate_id_address",
                label: "Generate random address",
                checked: form.generate_id_address,
            }),
            vec![
                FieldView::text("id_street", "Street Address", "123 Main St"),
                FieldView::text("id_city", "City", "New York"),
                FieldView::text("id_state", "State", "Select state").select(&US_STATES),
                FieldView::text("id_zip", "ZIP Code", "10001"),
            ],
        ),
    ]
}

// =============================================================================
// Templates
// =============================================================================

/// Order form page template.
#[derive(Template, WebTemplate)]
#[template(path = "order/form.html")]
pub struct OrderFormTemplate {
    pub nav: PageNav,
    pub sections: Vec<FormSection>,
    pub photo_error: Option<String>,
    pub signature_error: Option<String>,
    /// Alert shown above the submit button.
    pub general_error: Option<String>,
    pub unit_price: Price,
}

impl OrderFormTemplate {
    fn new(nav: PageNav, form: &OrderForm, errors: &FieldErrors) -> Self {
        Self {
            nav,
            sections: form_sections(form, errors),
            photo_error: errors.get("photo").map(String::from),
            signature_error: errors.get("signature").map(String::from),
            general_error: None,
            unit_price: Price::usd(PricingTier::UNIT_PRICE_USD),
        }
    }

    fn with_error(mut self, message: impl Into<String>) -> Self {
        self.general_error = Some(message.into());
        self
    }
}

/// Inline error for a single field (blur validation).
#[derive(Template, WebTemplate)]
#[template(path = "partials/field_error.html")]
pub struct FieldErrorTemplate {
    pub field: &'static str,
    pub message: Option<&'static str>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "order/confirmation.html")]
pub struct ConfirmationTemplate {
    pub nav: PageNav,
    pub order_id: String,
    /// Full order when the caller can read it.
    pub order: Option<Order>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Run the identity, ban and profile gates for the order form.
async fn order_gates(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<Identity, GateRejection> {
    let identity = identity.ok_or(GateRejection::LoginRequired)?;
    banned_user_gate(state, &identity).await?;
    profile_gate(state, &identity).await?;
    Ok(identity)
}

/// Display the order form, prefilled from the caller's profile.
#[instrument(skip_all)]
pub async fn order_page(
    State(state): State<AppState>,
    nav: PageNav,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<Response, GateRejection> {
    let identity = order_gates(&state, identity).await?;

    let mut form = OrderForm::default();
    if let Ok(Some(profile)) = state.access().current_profile(&identity.principal).await {
        form.customer_name = profile.name;
        form.email = profile.email;
        form.phone = profile.phone;
    }

    Ok(OrderFormTemplate::new(nav, &form, &FieldErrors::new()).into_response())
}

/// Handle order submission.
///
/// Every field is validated; on success the order goes to the backend and
/// the customer lands on the confirmation page.
#[instrument(skip_all)]
pub async fn submit_order(
    State(state): State<AppState>,
    nav: PageNav,
    OptionalIdentity(identity): OptionalIdentity,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submission = OrderSubmission::from_multipart(multipart)
        .await
        .map_err(|e| AppError::BadRequest(format!("Could not read the order form: {e}")))?;
    submission.form.apply_generators();

    let Some(identity) = identity else {
        let page = OrderFormTemplate::new(nav, &submission.form, &FieldErrors::new())
            .with_error(LOGIN_REQUIRED_MESSAGE);
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    };

    if let Err(rejection) = banned_user_gate(&state, &identity).await {
        return Ok(rejection.into_response());
    }

    let new_order = match submission.validate() {
        Ok(order) => order,
        Err(errors) => {
            add_breadcrumb("order", "Order form rejected", None);
            let page = OrderFormTemplate::new(nav, &submission.form, &errors)
                .with_error(GENERAL_ERROR_MESSAGE);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.orders().submit(&identity.principal, &new_order).await {
        Ok(id) => Ok(Redirect::to(&format!("/confirmation/{id}")).into_response()),
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            warn!(error = %e, principal = %identity.principal, "Order submission rejected");
            let page = OrderFormTemplate::new(nav, &submission.form, &FieldErrors::new())
                .with_error(user_message(&e));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Validate one field when the customer leaves it.
///
/// POST /order/validate/{field} with the form's urlencoded values; returns
/// the field's error fragment (empty when valid).
pub async fn validate_field(
    RequireIdentity(_identity): RequireIdentity,
    Path(field): Path<String>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<FieldErrorTemplate, AppError> {
    let field: OrderField = field
        .parse()
        .map_err(|e: crate::forms::order::UnknownField| AppError::NotFound(e.to_string()))?;
    let value = values.get(field.name()).map_or("", String::as_str);

    Ok(FieldErrorTemplate {
        field: field.name(),
        message: field.validate(value),
    })
}

/// Generated card name.
#[derive(Debug, Serialize)]
pub struct GeneratedName {
    pub name: String,
}

/// GET /order/generate/name
pub async fn generate_name(RequireIdentity(_identity): RequireIdentity) -> Json<GeneratedName> {
    Json(GeneratedName {
        name: generate_full_name(),
    })
}

/// GET /order/generate/address
pub async fn generate_card_address(
    RequireIdentity(_identity): RequireIdentity,
) -> Json<GeneratedAddress> {
    Json(generate_address())
}

/// Display the confirmation for a placed order.
#[instrument(skip(state, nav, identity))]
pub async fn confirmation(
    State(state): State<AppState>,
    nav: PageNav,
    OptionalIdentity(identity): OptionalIdentity,
    Path(id): Path<String>,
) -> Result<ConfirmationTemplate, AppError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("Order {id}")))?;

    let order = match &identity {
        Some(identity) => state
            .orders()
            .order(&identity.principal, order_id)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, order_id = %order_id, "Could not load confirmed order");
                None
            }),
        None => None,
    };

    Ok(ConfirmationTemplate {
        nav,
        order_id: order_id.to_string(),
        order,
    })
}
