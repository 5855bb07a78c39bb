use crate::config::RuleConfig;
use crate::model::{ProfileType, VendorCriteriaRequest, VendorType};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Match condition on a single field, in document-store terms.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(JsonValue),
    Ne(JsonValue),
    In(Vec<JsonValue>),
}

impl Condition {
    fn to_document(&self) -> JsonValue {
        match self {
            Condition::Eq(v) => v.clone(),
            Condition::Ne(v) => json!({ "$ne": v }),
            Condition::In(vs) => json!({ "$in": vs }),
        }
    }

    /// Array-valued fields match when any element matches; `null` equality
    /// matches a missing field.
    fn matches(&self, field: Option<&JsonValue>) -> bool {
        match self {
            Condition::Eq(v) => value_matches(field, v),
            Condition::Ne(v) => !value_matches(field, v),
            Condition::In(vs) => vs.iter().any(|v| value_matches(field, v)),
        }
    }
}

fn value_matches(field: Option<&JsonValue>, target: &JsonValue) -> bool {
    match field {
        None | Some(JsonValue::Null) => target.is_null(),
        Some(JsonValue::Array(items)) => items.contains(target) || field == Some(target),
        Some(v) => v == target,
    }
}

/// A filter document: field conditions ANDed together plus an optional `$or`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Criteria {
    fields: BTreeMap<String, Condition>,
    any_of: Vec<Criteria>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.into(), Condition::Eq(value.into()));
        self
    }

    pub fn not_equal(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.into(), Condition::Ne(value.into()));
        self
    }

    pub fn is_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.fields.insert(field.into(), Condition::In(values));
        self
    }

    pub fn or(mut self, branches: Vec<Criteria>) -> Self {
        self.any_of = branches;
        self
    }

    /// Overlay `other` onto `self`: its fields replace same-named ones, and a
    /// non-empty `$or` replaces ours.
    pub fn merge(mut self, other: Criteria) -> Self {
        self.fields.extend(other.fields);
        if !other.any_of.is_empty() {
            self.any_of = other.any_of;
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.fields.get(field)
    }

    pub fn any_of(&self) -> &[Criteria] {
        &self.any_of
    }

    pub fn to_document(&self) -> JsonValue {
        let mut doc = Map::new();
        for (field, cond) in self.fields.iter() {
            doc.insert(field.clone(), cond.to_document());
        }
        if !self.any_of.is_empty() {
            let branches = self.any_of.iter().map(Criteria::to_document).collect();
            doc.insert("$or".to_string(), JsonValue::Array(branches));
        }
        JsonValue::Object(doc)
    }

    /// Evaluate against a plain record. Top-level fields only.
    pub fn matches(&self, doc: &JsonValue) -> bool {
        let fields_ok = self
            .fields
            .iter()
            .all(|(field, cond)| cond.matches(doc.get(field)));
        fields_ok && (self.any_of.is_empty() || self.any_of.iter().any(|c| c.matches(doc)))
    }
}

impl Serialize for Criteria {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

fn vendor_ids(req: &VendorCriteriaRequest) -> Vec<String> {
    req.vendor_list
        .iter()
        .chain(req.group_ids.iter())
        .filter(|id| !id.is_empty())
        .cloned()
        .collect()
}

/// Base validity filter for a vendor: owner, not deleted, scoped to the
/// configured template group, narrowed by vendor type.
pub fn vendor_validity_criteria(req: &VendorCriteriaRequest, config: &RuleConfig) -> Criteria {
    let owner = req.owner.clone().map(JsonValue::String).unwrap_or(JsonValue::Null);
    let base = Criteria::new()
        .equals("owner", owner)
        .not_equal("isDeleted", true)
        .is_in("chargeTemplateGroupID", [config.template_group_id.clone()]);

    match req.vendor_type {
        Some(VendorType::Driver) => {
            let direct = Criteria::new()
                .is_in(
                    "vendorProfileType",
                    [ProfileType::Driver.as_str(), ProfileType::DriverGroup.as_str()],
                )
                .is_in("vendorId", vendor_ids(req));
            let everyone = Criteria::new().equals("vendorProfileType", ProfileType::AllDriverGroup.as_str());
            base.or(vec![direct, everyone])
        }
        Some(VendorType::Carrier) => base
            .is_in(
                "vendorProfileType",
                [ProfileType::Carrier.as_str(), ProfileType::CarrierGroup.as_str()],
            )
            .is_in("vendorId", vendor_ids(req)),
        Some(VendorType::Unknown) | None => base,
    }
}

/// Final lookup filter: vendor criteria, minus excluded move types, matching
/// `multiQueryIndex` with the given combinations.
pub fn lookup_criteria(base: Criteria, combinations: Vec<String>, config: &RuleConfig) -> Criteria {
    base.merge(
        Criteria::new()
            .not_equal("moveType", config.excluded_move_type.clone())
            .is_in("multiQueryIndex", combinations),
    )
}
