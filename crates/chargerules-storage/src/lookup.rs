use crate::metrics::{kind_label, LOOKUP_FAILURES, LOOKUP_SECONDS};
use crate::traits::ChargeTemplateStore;
use chargerules_core::{
    combinations_for, lookup_criteria, vendor_validity_criteria, ChargeTemplate, CombinationKind,
    Criteria, GroupId, LookupRequest, Order, Result, RuleConfig, VendorCriteriaRequest,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Group ids of every listed vendor, concatenated in vendor order.
fn vendor_group_ids(info: &LookupRequest) -> Vec<GroupId> {
    let Some(gi) = info.group_information.as_ref() else {
        return Vec::new();
    };
    info.vendor_list
        .iter()
        .flat_map(|v| gi.vendor_groups(v).iter().cloned())
        .collect()
}

/// Finds the charge templates that apply to a shipment's routing.
#[derive(Clone)]
pub struct ChargeRuleLookup {
    store: Arc<dyn ChargeTemplateStore>,
    config: RuleConfig,
}

impl ChargeRuleLookup {
    pub fn new(store: Arc<dyn ChargeTemplateStore>, config: RuleConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// The filter a lookup would send to the store, or `None` when the routing
    /// is empty and no read would happen.
    pub fn build_filter(
        &self,
        kind: CombinationKind,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Option<Criteria> {
        let routing = routing.filter(|r| !r.is_empty())?;
        let default_info = LookupRequest::default();
        let info = info.unwrap_or(&default_info);

        let request = VendorCriteriaRequest {
            owner: info.owner.clone(),
            group_ids: vendor_group_ids(info),
            vendor_list: info.vendor_list.clone(),
            vendor_type: info.vendor_type,
        };
        let base = vendor_validity_criteria(&request, &self.config);
        let combinations = combinations_for(kind, routing, info.group_information.as_ref());
        Some(lookup_criteria(base, combinations, &self.config))
    }

    /// Like [`rule_based_charges_for`](Self::rule_based_charges_for) but
    /// surfaces store failures.
    pub async fn try_rule_based_charges_for(
        &self,
        kind: CombinationKind,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Result<Vec<ChargeTemplate>> {
        let Some(filter) = self.build_filter(kind, routing, info) else {
            return Ok(Vec::new());
        };
        debug!(kind = kind_label(kind), filter = %filter.to_document(), "charge rule lookup");
        let _timer = LOOKUP_SECONDS.with_label_values(&[kind_label(kind)]).start_timer();
        self.store.find(&filter).await
    }

    /// Matching templates, or an empty list when the routing is empty or the
    /// lookup fails. Failures are logged, never returned.
    pub async fn rule_based_charges_for(
        &self,
        kind: CombinationKind,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Vec<ChargeTemplate> {
        match self.try_rule_based_charges_for(kind, routing, info).await {
            Ok(found) => found,
            Err(e) => {
                LOOKUP_FAILURES.with_label_values(&[kind_label(kind)]).inc();
                error!(kind = kind_label(kind), "charge rule lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn rule_based_charges(
        &self,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Vec<ChargeTemplate> {
        self.rule_based_charges_for(CombinationKind::Route, routing, info)
            .await
    }

    pub async fn rule_based_charges_for_location(
        &self,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Vec<ChargeTemplate> {
        self.rule_based_charges_for(CombinationKind::Location, routing, info)
            .await
    }

    pub async fn try_rule_based_charges(
        &self,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Result<Vec<ChargeTemplate>> {
        self.try_rule_based_charges_for(CombinationKind::Route, routing, info)
            .await
    }

    pub async fn try_rule_based_charges_for_location(
        &self,
        routing: Option<&[Order]>,
        info: Option<&LookupRequest>,
    ) -> Result<Vec<ChargeTemplate>> {
        self.try_rule_based_charges_for(CombinationKind::Location, routing, info)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::InMemoryStore;
    use chargerules_core::{Condition, RuleError};
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        inner: InMemoryStore,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChargeTemplateStore for CountingStore {
        async fn find(&self, criteria: &Criteria) -> Result<Vec<ChargeTemplate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(criteria).await
        }
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl ChargeTemplateStore for FailingStore {
        async fn find(&self, _criteria: &Criteria) -> Result<Vec<ChargeTemplate>> {
            Err(RuleError::Store("connection refused".into()))
        }
    }

    const SCOPE: &str = "66729ed844d8b882ea14817c";

    fn template(v: JsonValue) -> ChargeTemplate {
        serde_json::from_value(v).unwrap()
    }

    fn seeded() -> Arc<CountingStore> {
        let inner = InMemoryStore::from_templates([
            template(json!({
                "_id": "driver-route", "owner": "O1", "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "DRIVER", "vendorId": ["D1"],
                "moveType": "BY_MOVE", "multiQueryIndex": ["PICKUP-C1"]
            })),
            template(json!({
                "_id": "driver-group-location", "owner": "O1", "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "DRIVER_GROUP", "vendorId": ["DG1"],
                "multiQueryIndex": ["LA,CA"]
            })),
            template(json!({
                "_id": "all-drivers", "owner": "O1", "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "ALL_DRIVER_GROUP", "multiQueryIndex": ["PICKUP-G1"]
            })),
            template(json!({
                "_id": "by-leg", "owner": "O1", "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "ALL_DRIVER_GROUP", "moveType": "BY_LEG",
                "multiQueryIndex": ["PICKUP-C1"]
            })),
            template(json!({
                "_id": "deleted", "owner": "O1", "isDeleted": true, "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "ALL_DRIVER_GROUP", "multiQueryIndex": ["PICKUP-C1"]
            })),
            template(json!({
                "_id": "other-scope", "owner": "O1", "chargeTemplateGroupID": ["elsewhere"],
                "vendorProfileType": "ALL_DRIVER_GROUP", "multiQueryIndex": ["PICKUP-C1"]
            })),
            template(json!({
                "_id": "other-owner", "owner": "O2", "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "ALL_DRIVER_GROUP", "multiQueryIndex": ["PICKUP-C1"]
            })),
            template(json!({
                "_id": "carrier", "owner": "O1", "chargeTemplateGroupID": [SCOPE],
                "vendorProfileType": "CARRIER", "vendorId": ["K1"], "multiQueryIndex": ["PICKUP-C1"]
            })),
        ])
        .unwrap();
        Arc::new(CountingStore {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn routing() -> Vec<Order> {
        serde_json::from_value(json!([{
            "type": "PICKUP", "customerId": "C1", "city": "LA", "state": "CA", "zip_code": "90001"
        }]))
        .unwrap()
    }

    fn driver_info() -> LookupRequest {
        serde_json::from_value(json!({
            "owner": "O1",
            "vendorType": "DRIVER",
            "vendorList": ["D1"],
            "groupInformation": {
                "vendor": {"D1": ["DG1"]},
                "profile": {"C1": ["G1"]},
                "zipCode": {}
            }
        }))
        .unwrap()
    }

    fn ids(found: &[ChargeTemplate]) -> Vec<&str> {
        found.iter().filter_map(|t| t.id.as_deref()).collect()
    }

    #[tokio::test]
    async fn empty_or_missing_routing_skips_the_store() {
        let store = seeded();
        let lookup = ChargeRuleLookup::new(store.clone(), RuleConfig::default());
        let info = driver_info();
        let empty: Vec<Order> = Vec::new();
        assert!(lookup.rule_based_charges(Some(empty.as_slice()), Some(&info)).await.is_empty());
        assert!(lookup.rule_based_charges(None, Some(&info)).await.is_empty());
        assert!(lookup.rule_based_charges_for_location(None, None).await.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn route_lookup_matches_prefixed_keys() {
        let store = seeded();
        let lookup = ChargeRuleLookup::new(store.clone(), RuleConfig::default());
        let found = lookup.rule_based_charges(Some(routing().as_slice()), Some(&driver_info())).await;
        assert_eq!(ids(&found), vec!["driver-route", "all-drivers"]);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn location_lookup_matches_bare_keys_and_vendor_groups() {
        let lookup = ChargeRuleLookup::new(seeded(), RuleConfig::default());
        let found = lookup
            .rule_based_charges_for_location(Some(routing().as_slice()), Some(&driver_info()))
            .await;
        assert_eq!(ids(&found), vec!["driver-group-location"]);
    }

    #[tokio::test]
    async fn carrier_lookup_ignores_driver_templates() {
        let lookup = ChargeRuleLookup::new(seeded(), RuleConfig::default());
        let info: LookupRequest = serde_json::from_value(json!({
            "owner": "O1", "vendorType": "CARRIER", "vendorList": ["K1"]
        }))
        .unwrap();
        let found = lookup.rule_based_charges(Some(routing().as_slice()), Some(&info)).await;
        assert_eq!(ids(&found), vec!["carrier"]);
    }

    #[tokio::test]
    async fn store_failure_resolves_to_empty() {
        let lookup = ChargeRuleLookup::new(Arc::new(FailingStore), RuleConfig::default());
        let info = driver_info();
        assert!(lookup.rule_based_charges(Some(routing().as_slice()), Some(&info)).await.is_empty());
        assert!(lookup
            .rule_based_charges_for_location(Some(routing().as_slice()), Some(&info))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn try_variant_surfaces_store_failure() {
        let lookup = ChargeRuleLookup::new(Arc::new(FailingStore), RuleConfig::default());
        let err = lookup
            .try_rule_based_charges(Some(routing().as_slice()), Some(&driver_info()))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Store(_)));
        assert!(lookup
            .try_rule_based_charges_for_location(None, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn filter_keeps_duplicate_groups_and_combinations() {
        let store = Arc::new(InMemoryStore::new());
        let lookup = ChargeRuleLookup::new(store, RuleConfig::default());
        let info: LookupRequest = serde_json::from_value(json!({
            "owner": "O1",
            "vendorType": "DRIVER",
            "vendorList": ["D1", "D2"],
            "groupInformation": {"vendor": {"D1": ["DG1"], "D2": ["DG1"]}}
        }))
        .unwrap();
        let routing = vec![routing()[0].clone(), routing()[0].clone()];
        let filter = lookup
            .build_filter(CombinationKind::Route, Some(routing.as_slice()), Some(&info))
            .unwrap();

        assert_eq!(
            filter.any_of()[0].get("vendorId"),
            Some(&Condition::In(vec![json!("D1"), json!("D2"), json!("DG1"), json!("DG1")]))
        );
        assert_eq!(
            filter.get("multiQueryIndex"),
            Some(&Condition::In(
                ["PICKUP-C1", "PICKUP-LA,CA", "PICKUP-90001"]
                    .repeat(2)
                    .into_iter()
                    .map(JsonValue::from)
                    .collect()
            ))
        );
        assert_eq!(filter.get("moveType"), Some(&Condition::Ne(json!("BY_LEG"))));
        assert!(lookup.build_filter(CombinationKind::Route, Some(&routing[..0]), Some(&info)).is_none());
    }

    #[test]
    fn missing_info_builds_unnarrowed_filter() {
        let lookup = ChargeRuleLookup::new(Arc::new(InMemoryStore::new()), RuleConfig::default());
        let filter = lookup
            .build_filter(CombinationKind::Location, Some(routing().as_slice()), None)
            .unwrap();
        assert_eq!(filter.get("owner"), Some(&Condition::Eq(JsonValue::Null)));
        assert!(filter.get("vendorId").is_none());
        assert!(filter.any_of().is_empty());
        assert_eq!(
            filter.get("multiQueryIndex"),
            Some(&Condition::In(vec![json!("C1"), json!("LA,CA"), json!("90001")]))
        );
        assert_eq!(lookup.config().template_group_id, SCOPE);
    }
}
