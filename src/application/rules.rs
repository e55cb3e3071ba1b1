use crate::domain::ports::ReferenceData;
use crate::domain::product::Product;
use crate::domain::tax::{
    Comparison, ConditionAttribute, GeoContext, Market, TaxCondition, TaxLine, TaxRule,
};
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

pub const WITHIN_SAME_STATE: &str = "Within same state";
pub const TO_A_DIFFERENT_STATE: &str = "To a different state";

/// Walks a product's tax profile in ascending priority order and prices
/// the first rule whose conditions all hold.
///
/// Pure apart from reads through the port; the same inputs always produce
/// the same outcome.
pub struct RuleEvaluator<'a> {
    port: &'a dyn ReferenceData,
    /// Evaluation date for effective-window checks.
    as_of: NaiveDate,
}

/// Computed value of a condition attribute for one evaluation.
enum Actual {
    Text(&'static str),
    Number(Decimal),
}

impl Actual {
    fn as_number(&self) -> Option<Decimal> {
        match self {
            Actual::Number(n) => Some(*n),
            Actual::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(port: &'a dyn ReferenceData, as_of: NaiveDate) -> Self {
        Self { port, as_of }
    }

    /// Returns the matched rule (if any) and its tax lines for
    /// `quantity` units of `product`.
    ///
    /// A product without a profile, an unknown profile id, or a profile
    /// with no rule in effect yields `(None, [])`. The first fully
    /// matching rule wins; rules after it are never consulted.
    pub async fn evaluate(
        &self,
        product: &Product,
        quantity: u32,
        geo: &GeoContext,
    ) -> Result<(Option<TaxRule>, Vec<TaxLine>)> {
        let Some(profile_id) = product.tax_profile.as_deref() else {
            return Ok((None, Vec::new()));
        };
        let Some(profile) = self.port.tax_profile(profile_id).await? else {
            return Ok((None, Vec::new()));
        };

        let mut rules: Vec<&TaxRule> = profile
            .rules
            .iter()
            .filter(|rule| rule.in_effect(self.as_of))
            .collect();
        if rules.is_empty() {
            return Ok((None, Vec::new()));
        }
        rules.sort_by_key(|rule| rule.priority);

        let market = self.market(geo).await;
        let jurisdiction = supply_jurisdiction(geo);

        for rule in rules {
            let matches = rule
                .conditions
                .iter()
                .all(|condition| condition_holds(condition, market, jurisdiction, product.unit_price));
            if matches {
                tracing::debug!(
                    sku = %product.sku,
                    priority = rule.priority,
                    "tax rule matched"
                );
                let lines = tax_lines(rule, product.unit_price, quantity);
                return Ok((Some(rule.clone()), lines));
            }
        }
        Ok((None, Vec::new()))
    }

    /// Classifies the transaction as Domestic or International.
    ///
    /// Both countries are resolved to canonical codes first; when either
    /// side cannot be resolved (unknown name or directory failure), raw
    /// case-insensitive equality decides instead. The silent fallback
    /// mirrors the upstream behavior for unmapped country names.
    async fn market(&self, geo: &GeoContext) -> Market {
        let tenant = self.canonical_country(&geo.tenant_country).await;
        let delivery = self.canonical_country(&geo.delivery_country).await;
        let domestic = match (tenant, delivery) {
            (Some(tenant), Some(delivery)) => tenant == delivery,
            _ => geo
                .tenant_country
                .trim()
                .eq_ignore_ascii_case(geo.delivery_country.trim()),
        };
        if domestic {
            Market::Domestic
        } else {
            Market::International
        }
    }

    async fn canonical_country(&self, name_or_code: &str) -> Option<String> {
        self.port
            .resolve_country_code(name_or_code)
            .await
            .ok()
            .flatten()
    }
}

fn supply_jurisdiction(geo: &GeoContext) -> &'static str {
    if geo
        .tenant_state
        .trim()
        .eq_ignore_ascii_case(geo.delivery_state.trim())
    {
        WITHIN_SAME_STATE
    } else {
        TO_A_DIFFERENT_STATE
    }
}

fn condition_holds(
    condition: &TaxCondition,
    market: Market,
    jurisdiction: &'static str,
    selling_price: Decimal,
) -> bool {
    let Some(attribute) = ConditionAttribute::parse(&condition.attribute) else {
        tracing::warn!(attribute = %condition.attribute, "unrecognized tax condition attribute");
        return false;
    };
    let actual = match attribute {
        ConditionAttribute::Market => Actual::Text(market.as_str()),
        ConditionAttribute::SupplyJurisdiction => Actual::Text(jurisdiction),
        ConditionAttribute::SellingPrice => Actual::Number(selling_price),
    };
    compare(&actual, condition.op, &condition.value)
}

/// Applies one operator. Equality on textual values is case-insensitive;
/// everything numeric parses both operands as decimals, and a parse
/// failure fails just this condition.
fn compare(actual: &Actual, op: Comparison, expected: &str) -> bool {
    let expected = expected.trim();
    if matches!(op, Comparison::Eq | Comparison::Ne) {
        let equal = match actual {
            Actual::Text(s) => s.eq_ignore_ascii_case(expected),
            Actual::Number(n) => match expected.parse::<Decimal>() {
                Ok(e) => *n == e,
                Err(_) => return false,
            },
        };
        return (op == Comparison::Eq) == equal;
    }

    let (Some(lhs), Ok(rhs)) = (actual.as_number(), expected.parse::<Decimal>()) else {
        return false;
    };
    match op {
        Comparison::Lt => lhs < rhs,
        Comparison::Le => lhs <= rhs,
        Comparison::Gt => lhs > rhs,
        Comparison::Ge => lhs >= rhs,
        Comparison::Eq | Comparison::Ne => false,
    }
}

fn tax_lines(rule: &TaxRule, selling_price: Decimal, quantity: u32) -> Vec<TaxLine> {
    rule.outcomes
        .iter()
        .map(|outcome| {
            let amount = selling_price * Decimal::from(quantity) * outcome.rate
                / Decimal::ONE_HUNDRED;
            TaxLine {
                tax_id: outcome.tax_id.clone(),
                tax_code: outcome.tax_code.clone(),
                tax_rate: outcome.rate,
                tax_amount: amount
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money;
    use crate::domain::tax::{TaxOutcome, TaxRateProfile};
    use crate::infrastructure::in_memory::InMemoryReferenceData;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    fn product(price: Decimal) -> Product {
        Product {
            sku: "SKU-1".to_owned(),
            unit_price: price,
            on_hand: 10,
            tax_profile: Some("gst-in".to_owned()),
            min_count: None,
            max_count: None,
        }
    }

    fn rule(priority: i32, conditions: Vec<TaxCondition>, outcomes: Vec<TaxOutcome>) -> TaxRule {
        TaxRule {
            priority,
            active: true,
            effective_from: None,
            effective_to: None,
            conditions,
            outcomes,
        }
    }

    fn condition(attribute: &str, op: Comparison, value: &str) -> TaxCondition {
        TaxCondition {
            attribute: attribute.to_owned(),
            op,
            value: value.to_owned(),
        }
    }

    fn outcome(code: &str, rate: Decimal) -> TaxOutcome {
        TaxOutcome {
            tax_id: format!("tax-{code}"),
            tax_code: code.to_owned(),
            rate,
        }
    }

    fn port_with_rules(rules: Vec<TaxRule>) -> InMemoryReferenceData {
        InMemoryReferenceData::new()
            .with_country("IN", &["India".to_owned()])
            .with_country("FR", &["France".to_owned()])
            .with_tax_profile(TaxRateProfile {
                id: "gst-in".to_owned(),
                country: Some("IN".to_owned()),
                region: None,
                rules,
            })
    }

    fn domestic_geo() -> GeoContext {
        GeoContext {
            tenant_country: "India".to_owned(),
            tenant_state: "Karnataka".to_owned(),
            delivery_country: "IN".to_owned(),
            delivery_state: "Karnataka".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_domestic_gst_scenario() {
        let port = port_with_rules(vec![rule(
            1,
            vec![condition("market", Comparison::Eq, "Domestic")],
            vec![outcome("GST", dec!(18))],
        )]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, lines) = evaluator
            .evaluate(&product(dec!(100.00)), 2, &domestic_geo())
            .await
            .unwrap();

        assert_eq!(matched.unwrap().priority, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].tax_code, "GST");
        assert_eq!(money(lines[0].tax_rate), "18.00");
        assert_eq!(money(lines[0].tax_amount), "36.00");
    }

    #[tokio::test]
    async fn test_international_market_does_not_match() {
        let port = port_with_rules(vec![rule(
            1,
            vec![condition("market", Comparison::Eq, "Domestic")],
            vec![outcome("GST", dec!(18))],
        )]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let geo = GeoContext {
            delivery_country: "France".to_owned(),
            ..domestic_geo()
        };
        let (matched, lines) = evaluator
            .evaluate(&product(dec!(100.00)), 2, &geo)
            .await
            .unwrap();

        assert!(matched.is_none());
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        // Both rules match; only the lower priority's outcomes are used,
        // regardless of the order the rules arrive in.
        let port = port_with_rules(vec![
            rule(
                2,
                vec![condition("market", Comparison::Eq, "Domestic")],
                vec![outcome("VAT", dec!(20))],
            ),
            rule(
                1,
                vec![condition("market", Comparison::Eq, "Domestic")],
                vec![outcome("GST", dec!(18))],
            ),
        ]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, lines) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();

        assert_eq!(matched.unwrap().priority, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].tax_code, "GST");
    }

    #[tokio::test]
    async fn test_conditions_are_conjunctive() {
        let port = port_with_rules(vec![rule(
            1,
            vec![
                condition("market", Comparison::Eq, "Domestic"),
                condition("selling_price", Comparison::Gt, "500"),
            ],
            vec![outcome("GST", dec!(18))],
        )]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert!(matched.is_none());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(600.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert!(matched.is_some());
    }

    #[tokio::test]
    async fn test_attribute_aliases() {
        let port = port_with_rules(vec![rule(
            1,
            vec![
                condition("place_of_supply_context", Comparison::Eq, "Within same state"),
                condition("transactional_price", Comparison::Le, "100"),
            ],
            vec![outcome("SGST", dec!(9))],
        )]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert!(matched.is_some());
    }

    #[tokio::test]
    async fn test_unknown_attribute_fails_rule() {
        let port = port_with_rules(vec![
            rule(
                1,
                vec![condition("customer_mood", Comparison::Eq, "happy")],
                vec![outcome("VAT", dec!(20))],
            ),
            rule(
                2,
                vec![condition("market", Comparison::Eq, "Domestic")],
                vec![outcome("GST", dec!(18))],
            ),
        ]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert_eq!(matched.unwrap().priority, 2);
    }

    #[tokio::test]
    async fn test_numeric_parse_failure_fails_single_condition() {
        // Rule 1 carries an unparseable operand and must be skipped;
        // rule 2 still gets its turn.
        let port = port_with_rules(vec![
            rule(
                1,
                vec![condition("selling_price", Comparison::Lt, "cheap")],
                vec![outcome("VAT", dec!(20))],
            ),
            rule(
                2,
                vec![condition("selling_price", Comparison::Ge, "0")],
                vec![outcome("GST", dec!(18))],
            ),
        ]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert_eq!(matched.unwrap().priority, 2);
    }

    #[tokio::test]
    async fn test_price_equality_is_numeric() {
        let port = port_with_rules(vec![rule(
            1,
            vec![condition("selling_price", Comparison::Eq, "100.0")],
            vec![outcome("GST", dec!(18))],
        )]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert!(matched.is_some());
    }

    #[tokio::test]
    async fn test_inactive_and_out_of_window_rules_skipped() {
        let mut expired = rule(
            1,
            vec![condition("market", Comparison::Eq, "Domestic")],
            vec![outcome("OLD", dec!(25))],
        );
        expired.effective_to = NaiveDate::from_ymd_opt(2020, 12, 31);
        let mut inactive = rule(
            2,
            vec![condition("market", Comparison::Eq, "Domestic")],
            vec![outcome("OFF", dec!(10))],
        );
        inactive.active = false;
        let current = rule(
            3,
            vec![condition("market", Comparison::Eq, "Domestic")],
            vec![outcome("GST", dec!(18))],
        );

        let port = port_with_rules(vec![expired, inactive, current]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &domestic_geo())
            .await
            .unwrap();
        assert_eq!(matched.unwrap().priority, 3);
    }

    #[tokio::test]
    async fn test_no_profile_yields_no_tax() {
        let port = port_with_rules(vec![]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let mut untaxed = product(dec!(100.00));
        untaxed.tax_profile = None;
        let (matched, lines) = evaluator
            .evaluate(&untaxed, 1, &domestic_geo())
            .await
            .unwrap();
        assert!(matched.is_none());
        assert!(lines.is_empty());

        let mut unknown = product(dec!(100.00));
        unknown.tax_profile = Some("missing".to_owned());
        let (matched, lines) = evaluator
            .evaluate(&unknown, 1, &domestic_geo())
            .await
            .unwrap();
        assert!(matched.is_none());
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_market_falls_back_to_raw_equality() {
        // Neither country is in the directory; the raw strings still
        // match case-insensitively, so the transaction is Domestic.
        let port = InMemoryReferenceData::new().with_tax_profile(TaxRateProfile {
            id: "gst-in".to_owned(),
            country: None,
            region: None,
            rules: vec![rule(
                1,
                vec![condition("market", Comparison::Eq, "Domestic")],
                vec![outcome("GST", dec!(18))],
            )],
        });
        let evaluator = RuleEvaluator::new(&port, as_of());

        let geo = GeoContext {
            tenant_country: "Wakanda".to_owned(),
            tenant_state: "N1".to_owned(),
            delivery_country: "wakanda".to_owned(),
            delivery_state: "N1".to_owned(),
        };
        let (matched, _) = evaluator
            .evaluate(&product(dec!(100.00)), 1, &geo)
            .await
            .unwrap();
        assert!(matched.is_some());
    }

    #[tokio::test]
    async fn test_multiple_outcomes_emit_multiple_lines() {
        let port = port_with_rules(vec![rule(
            1,
            vec![condition("supply_jurisdiction", Comparison::Eq, "Within same state")],
            vec![outcome("CGST", dec!(9)), outcome("SGST", dec!(9))],
        )]);
        let evaluator = RuleEvaluator::new(&port, as_of());

        let (_, lines) = evaluator
            .evaluate(&product(dec!(100.00)), 2, &domestic_geo())
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(money(lines[0].tax_amount), "18.00");
        assert_eq!(money(lines[1].tax_amount), "18.00");
    }
}
