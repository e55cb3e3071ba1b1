use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable catalog snapshot of a sellable product.
///
/// Owned by the catalog collaborator; the engine reads it for one pass and
/// never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub unit_price: Decimal,
    /// On-hand stock at snapshot time.
    #[serde(default)]
    pub on_hand: u32,
    /// Identifier of the tax profile this product bills under, if any.
    #[serde(default)]
    pub tax_profile: Option<String>,
    #[serde(default)]
    pub min_count: Option<u32>,
    #[serde(default)]
    pub max_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartItem {
    pub sku: String,
    pub quantity: u32,
}

/// Ordered collection of cart items. Per-item results preserve this order.
pub type Cart = Vec<CartItem>;

/// Caller-supplied delivery address fragment.
///
/// Not validated for existence beyond the lookups the engine performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub country: String,
    pub state: String,
    pub pincode: String,
}
