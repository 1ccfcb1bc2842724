//! Home and pricing pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use cardshop_core::{PricingTier, Price};
use tracing::instrument;

use crate::filters;
use crate::routes::page::PageNav;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: PageNav,
    /// Price of one card design.
    pub unit_price: Price,
    /// Copies shipped per design.
    pub copies_per_card: u32,
}

/// Pricing page template.
#[derive(Template, WebTemplate)]
#[template(path = "prices.html")]
pub struct PricesTemplate {
    pub nav: PageNav,
    pub unit_price: Price,
    pub copies_per_card: u32,
    pub tiers: Vec<PricingTier>,
}

/// Display the home page.
#[instrument(skip(nav))]
pub async fn home(nav: PageNav) -> impl IntoResponse {
    HomeTemplate {
        nav,
        unit_price: Price::usd(PricingTier::UNIT_PRICE_USD),
        copies_per_card: PricingTier::COPIES_PER_CARD,
    }
}

/// Display the pricing table.
#[instrument(skip(nav))]
pub async fn prices(nav: PageNav) -> impl IntoResponse {
    PricesTemplate {
        nav,
        unit_price: Price::usd(PricingTier::UNIT_PRICE_USD),
        copies_per_card: PricingTier::COPIES_PER_CARD,
        tiers: PricingTier::table(),
    }
}
