use crate::model::{Reference, RoutingRecord, VendorId, VendorType};
use std::collections::HashSet;

type VendorField = fn(&RoutingRecord) -> Option<&Reference>;

fn driver_of(r: &RoutingRecord) -> Option<&Reference> {
    r.driver.as_ref()
}

fn carrier_of(r: &RoutingRecord) -> Option<&Reference> {
    r.drayos_carrier.as_ref()
}

/// Routing field that carries the vendor for a given vendor type.
fn vendor_field(vendor_type: Option<VendorType>) -> Option<VendorField> {
    match vendor_type? {
        VendorType::Driver => Some(driver_of as VendorField),
        VendorType::Carrier => Some(carrier_of as VendorField),
        VendorType::Unknown => None,
    }
}

/// Unique vendor ids referenced by the routing, in first-seen order.
pub fn vendors_from_routing(records: &[RoutingRecord], vendor_type: Option<VendorType>) -> Vec<VendorId> {
    let Some(field) = vendor_field(vendor_type) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| field(r).and_then(Reference::id))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
