use crate::model::{GroupInformation, Order};
use serde::{Deserialize, Serialize};

/// Which family of `multiQueryIndex` keys a lookup matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationKind {
    /// Keys prefixed with the order's move type, e.g. `PICKUP-C1`.
    Route,
    /// Bare keys, e.g. `C1`.
    Location,
}

/// Raw keys an order can be indexed under, in a stable order: customer,
/// `city,state`, zip, customer profile groups, customer zip groups.
fn order_keys(order: &Order, groups: Option<&GroupInformation>) -> Vec<String> {
    let mut keys = Vec::new();
    let customer = order.customer();
    if let Some(c) = customer {
        keys.push(c.to_string());
    }
    if let Some(cs) = order.city_state() {
        keys.push(cs);
    }
    if let Some(zip) = order.zip() {
        keys.push(zip.to_string());
    }
    if let (Some(c), Some(gi)) = (customer, groups) {
        keys.extend(gi.profile_groups(c).iter().cloned());
        keys.extend(gi.zip_groups(c).iter().cloned());
    }
    keys
}

pub fn route_combinations(order: &Order, groups: Option<&GroupInformation>) -> Vec<String> {
    order_keys(order, groups)
        .into_iter()
        .map(|k| format!("{}-{}", order.move_type, k))
        .collect()
}

pub fn location_combinations(order: &Order, groups: Option<&GroupInformation>) -> Vec<String> {
    order_keys(order, groups)
}

/// Combinations for every order, flattened. Duplicates are kept.
pub fn combinations_for(
    kind: CombinationKind,
    routing: &[Order],
    groups: Option<&GroupInformation>,
) -> Vec<String> {
    let generate: fn(&Order, Option<&GroupInformation>) -> Vec<String> = match kind {
        CombinationKind::Route => route_combinations,
        CombinationKind::Location => location_combinations,
    };
    routing.iter().flat_map(|o| generate(o, groups)).collect()
}
