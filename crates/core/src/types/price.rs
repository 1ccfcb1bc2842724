//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A whole-dollar USD price.
    #[must_use]
    pub fn usd(dollars: i64) -> Self {
        Self::new(Decimal::from(dollars), CurrencyCode::USD)
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }
}

impl fmt::Display for Price {
    /// Renders `$100` for whole amounts and `$19.99` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.currency_code.symbol();
        if self.amount.fract().is_zero() {
            write!(f, "{symbol}{}", self.amount.trunc())
        } else {
            write!(f, "{symbol}{:.2}", self.amount)
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
        }
    }
}

/// One row of the pricing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingTier {
    /// Number of distinct cards ordered.
    pub quantity: u32,
    /// Price per card.
    pub unit_price: Price,
    /// Highlighted as the popular choice.
    pub popular: bool,
}

impl PricingTier {
    /// Price of a single card design.
    pub const UNIT_PRICE_USD: i64 = 100;
    /// Physical copies shipped per card design.
    pub const COPIES_PER_CARD: u32 = 2;

    /// The published pricing table: one to five cards, three highlighted.
    #[must_use]
    pub fn table() -> Vec<Self> {
        (1..=5)
            .map(|quantity| Self {
                quantity,
                unit_price: Price::usd(Self::UNIT_PRICE_USD),
                popular: quantity == 3,
            })
            .collect()
    }

    /// Total for this tier.
    #[must_use]
    pub fn total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Physical copies shipped for this tier.
    #[must_use]
    pub const fn copies(&self) -> u32 {
        self.quantity * Self::COPIES_PER_CARD
    }
}
