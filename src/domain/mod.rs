pub mod ports;
pub mod product;
pub mod tax;
pub mod zone;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// Renders a monetary value with exactly two fraction digits.
///
/// Midpoints round away from zero. All money crossing the interface
/// boundary goes through here; no floating point leaves the engine.
pub fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub(crate) fn money_string<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&money(*value))
}

pub(crate) fn money_string_opt<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&money(*v)),
        None => serializer.serialize_none(),
    }
}
