use super::money_string;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered collection of tax rules scoped to a country/region.
///
/// A product references at most one profile. Rules need not arrive sorted;
/// the evaluator orders them by ascending priority before walking them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateProfile {
    pub id: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub rules: Vec<TaxRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    /// Lower priorities are evaluated first.
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// All conditions must hold for the rule to match.
    pub conditions: Vec<TaxCondition>,
    /// A rule may levy several taxes at once.
    pub outcomes: Vec<TaxOutcome>,
}

fn default_active() -> bool {
    true
}

impl TaxRule {
    /// Whether the rule is active and inside its effective window on `as_of`.
    pub fn in_effect(&self, as_of: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        if let Some(from) = self.effective_from
            && as_of < from
        {
            return false;
        }
        if let Some(to) = self.effective_to
            && as_of > to
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCondition {
    /// Raw attribute name as configured; normalized at evaluation time.
    pub attribute: String,
    pub op: Comparison,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

/// The closed set of condition attributes the evaluator can compute.
///
/// Configured names outside this set fail their condition rather than
/// falling through to some implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionAttribute {
    Market,
    SupplyJurisdiction,
    SellingPrice,
}

impl ConditionAttribute {
    /// Normalizes a raw attribute name (trim, lowercase, spaces to
    /// underscores) and maps it onto the closed set, aliases included.
    pub fn parse(raw: &str) -> Option<Self> {
        let canonical = raw.trim().to_lowercase().replace(' ', "_");
        match canonical.as_str() {
            "market" => Some(Self::Market),
            "supply_jurisdiction" | "place_of_supply_context" => Some(Self::SupplyJurisdiction),
            "selling_price" | "transactional_price" => Some(Self::SellingPrice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxOutcome {
    pub tax_id: String,
    pub tax_code: String,
    /// Percentage rate, e.g. 18 for 18%.
    pub rate: Decimal,
}

/// One computed tax amount for one cart item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxLine {
    pub tax_id: String,
    pub tax_code: String,
    #[serde(serialize_with = "money_string")]
    pub tax_rate: Decimal,
    #[serde(serialize_with = "money_string")]
    pub tax_amount: Decimal,
}

/// Domestic/International classification of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    Domestic,
    International,
}

impl Market {
    pub fn as_str(self) -> &'static str {
        match self {
            Market::Domestic => "Domestic",
            Market::International => "International",
        }
    }
}

/// Tenant and delivery geography for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoContext {
    pub tenant_country: String,
    pub tenant_state: String,
    pub delivery_country: String,
    pub delivery_state: String,
}
