//! Shipping Estimator
//!
//! Filters carrier rules by package constraints and ranks the survivors by
//! total cost. Purely functional; holds no state between calls.

use serde::{Deserialize, Serialize};

/// One carrier service with its size/weight ceilings. An unset bound
/// imposes no constraint on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRule {
    pub carrier: String,
    pub service_name: String,
    /// Maximum length in cm.
    pub max_l: Option<u32>,
    /// Maximum width in cm.
    pub max_w: Option<u32>,
    /// Maximum height in cm.
    pub max_h: Option<u32>,
    /// Maximum weight in grams.
    pub max_weight: Option<u32>,
    /// Carrier price in whole currency units.
    pub price: i64,
    /// Packaging cost the rule assumes, kept for display.
    pub packaging_cost: i64,
    pub enabled: bool,
}

/// Caller-supplied package dimensions and weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageInput {
    /// Length in cm.
    pub length: u32,
    /// Width in cm.
    pub width: u32,
    /// Height in cm.
    pub height: u32,
    /// Weight in grams.
    pub weight: u32,
    /// Packaging cost added to every candidate.
    pub packaging_cost: i64,
}

/// A rule that fits the package, with its all-in cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingEstimate {
    pub rule: ShippingRule,
    pub total_cost: i64,
}

/// Whether every defined bound of `rule` is satisfied by the package.
pub fn fits(rule: &ShippingRule, input: &PackageInput) -> bool {
    if rule.max_l.is_some_and(|max| input.length > max) {
        return false;
    }
    if rule.max_w.is_some_and(|max| input.width > max) {
        return false;
    }
    if rule.max_h.is_some_and(|max| input.height > max) {
        return false;
    }
    if rule.max_weight.is_some_and(|max| input.weight > max) {
        return false;
    }
    true
}

/// Rank the rules that fit the package, cheapest first.
///
/// Ties keep input order (stable sort). An empty result means no shipping
/// option is available, not an error.
pub fn estimate(rules: &[ShippingRule], input: &PackageInput) -> Vec<ShippingEstimate> {
    let mut candidates: Vec<ShippingEstimate> = rules
        .iter()
        .filter(|rule| fits(rule, input))
        .map(|rule| ShippingEstimate {
            rule: rule.clone(),
            total_cost: rule.price + input.packaging_cost,
        })
        .collect();

    candidates.sort_by_key(|candidate| candidate.total_cost);
    candidates
}
