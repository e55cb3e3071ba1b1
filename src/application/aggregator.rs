use crate::application::eligibility::EligibilityResolver;
use crate::application::rules::RuleEvaluator;
use crate::domain::ports::ReferenceDataBox;
use crate::domain::product::{Cart, DeliveryLocation, Product};
use crate::domain::tax::{GeoContext, TaxLine};
use crate::domain::{money_string, money_string_opt};
use crate::error::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub const REASON_PRODUCT_UNAVAILABLE: &str = "product unavailable";
pub const REASON_TAX_UNDETERMINED: &str = "tax could not be determined";

/// Per-item outcome of an aggregation pass, in cart order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemResult {
    pub sku: String,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Informational only; an out-of-bounds quantity still counts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_error: Option<String>,
    #[serde(serialize_with = "money_string_opt", skip_serializing_if = "Option::is_none")]
    pub unit_tax: Option<Decimal>,
    pub tax_lines: Vec<TaxLine>,
}

impl ItemResult {
    fn excluded(sku: &str, reason: impl Into<String>, quantity_error: Option<String>) -> Self {
        Self {
            sku: sku.to_owned(),
            eligible: false,
            reason: Some(reason.into()),
            quantity_error,
            unit_tax: None,
            tax_lines: Vec::new(),
        }
    }
}

/// Monetary totals for one cart. All money serializes as fixed-point
/// strings with two fraction digits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartBreakdown {
    /// Sum of every item's quantity, eligible or not.
    pub total_quantity: u32,
    #[serde(serialize_with = "money_string")]
    pub subtotal: Decimal,
    #[serde(serialize_with = "money_string")]
    pub total_tax: Decimal,
    #[serde(serialize_with = "money_string")]
    pub total_amount: Decimal,
    pub items: Vec<ItemResult>,
}

/// Folds a cart into totals, skipping items whose data is bad instead of
/// failing the whole computation.
pub struct CartAggregator {
    port: ReferenceDataBox,
    as_of: NaiveDate,
}

impl CartAggregator {
    pub fn new(port: ReferenceDataBox) -> Self {
        Self::with_as_of(port, Utc::now().date_naive())
    }

    /// Pins the evaluation date for tax-rule effective windows.
    pub fn with_as_of(port: ReferenceDataBox, as_of: NaiveDate) -> Self {
        Self { port, as_of }
    }

    /// Runs one aggregation pass over the cart.
    ///
    /// Ineligible or unresolvable items contribute zero to the totals but
    /// still appear in `items` with their reason; a failed tax evaluation
    /// excludes its item the same way. The result is a function of the
    /// inputs and the reference data alone; the visibility cache lives and
    /// dies inside this call.
    pub async fn aggregate(
        &self,
        cart: &Cart,
        location: &DeliveryLocation,
        channel: Option<&str>,
        geo: &GeoContext,
    ) -> Result<CartBreakdown> {
        let mut resolver = EligibilityResolver::new(self.port.as_ref());
        let evaluator = RuleEvaluator::new(self.port.as_ref(), self.as_of);

        let mut total_quantity = 0u32;
        let mut subtotal = Decimal::ZERO;
        let mut total_tax = Decimal::ZERO;
        let mut items = Vec::with_capacity(cart.len());

        for item in cart {
            total_quantity += item.quantity;

            let product = match self.port.product(&item.sku).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    tracing::warn!(sku = %item.sku, "product not found, excluding item");
                    items.push(ItemResult::excluded(&item.sku, REASON_PRODUCT_UNAVAILABLE, None));
                    continue;
                }
                Err(err) => {
                    tracing::warn!(sku = %item.sku, error = %err, "product lookup failed, excluding item");
                    items.push(ItemResult::excluded(&item.sku, REASON_PRODUCT_UNAVAILABLE, None));
                    continue;
                }
            };

            let quantity_error = quantity_bounds_error(&product, item.quantity);

            let verdict = resolver.check(&item.sku, location, channel).await;
            if !verdict.eligible {
                items.push(ItemResult::excluded(&item.sku, verdict.reason, quantity_error));
                continue;
            }

            let (matched, tax_lines) = match evaluator.evaluate(&product, item.quantity, geo).await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(sku = %item.sku, error = %err, "tax evaluation failed, excluding item");
                    items.push(ItemResult::excluded(
                        &item.sku,
                        REASON_TAX_UNDETERMINED,
                        quantity_error,
                    ));
                    continue;
                }
            };

            subtotal += product.unit_price * Decimal::from(item.quantity);
            total_tax += tax_lines.iter().map(|line| line.tax_amount).sum::<Decimal>();

            let unit_tax = matched.map(|rule| {
                rule.outcomes
                    .iter()
                    .map(|outcome| product.unit_price * outcome.rate / Decimal::ONE_HUNDRED)
                    .sum::<Decimal>()
            });

            items.push(ItemResult {
                sku: item.sku.clone(),
                eligible: true,
                reason: None,
                quantity_error,
                unit_tax,
                tax_lines,
            });
        }

        Ok(CartBreakdown {
            total_quantity,
            subtotal,
            total_tax,
            total_amount: subtotal + total_tax,
            items,
        })
    }
}

fn quantity_bounds_error(product: &Product, quantity: u32) -> Option<String> {
    if let Some(min) = product.min_count
        && quantity < min
    {
        return Some(format!("quantity below minimum of {min}"));
    }
    if let Some(max) = product.max_count
        && quantity > max
    {
        return Some(format!("quantity above maximum of {max}"));
    }
    None
}
