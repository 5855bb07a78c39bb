use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

pub type VendorId = String;
pub type GroupId = String;
pub type CustomerId = String;

/// An id as it appears in routing and order payloads: either the raw id or a
/// populated document carrying `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Doc {
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(flatten)]
        rest: Map<String, JsonValue>,
    },
}

impl Reference {
    /// Scalar id, or `None` when the reference carries no usable id.
    pub fn id(&self) -> Option<&str> {
        let id = match self {
            Reference::Id(id) => Some(id.as_str()),
            Reference::Doc { id, .. } => id.as_deref(),
        };
        id.filter(|s| !s.is_empty())
    }
}

impl From<&str> for Reference {
    fn from(id: &str) -> Self {
        Reference::Id(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorType {
    Driver,
    Carrier,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileType {
    Driver,
    DriverGroup,
    AllDriverGroup,
    Carrier,
    CarrierGroup,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Driver => "DRIVER",
            ProfileType::DriverGroup => "DRIVER_GROUP",
            ProfileType::AllDriverGroup => "ALL_DRIVER_GROUP",
            ProfileType::Carrier => "CARRIER",
            ProfileType::CarrierGroup => "CARRIER_GROUP",
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leg of a shipment as seen by the rule lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "type", default)]
    pub move_type: String,
    #[serde(default)]
    pub customer_id: Option<Reference>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "zip_code", default)]
    pub zip_code: Option<String>,
}

impl Order {
    pub fn customer(&self) -> Option<&str> {
        self.customer_id.as_ref().and_then(Reference::id)
    }

    /// `"{city},{state}"` when both are present.
    pub fn city_state(&self) -> Option<String> {
        match (non_empty(&self.city), non_empty(&self.state)) {
            (Some(city), Some(state)) => Some(format!("{},{}", city, state)),
            _ => None,
        }
    }

    pub fn zip(&self) -> Option<&str> {
        non_empty(&self.zip_code)
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GroupInformation {
    #[serde(default)]
    pub vendor: HashMap<VendorId, Vec<GroupId>>,
    #[serde(default)]
    pub profile: HashMap<CustomerId, Vec<GroupId>>,
    #[serde(rename = "zipCode", default)]
    pub zip_code: HashMap<CustomerId, Vec<GroupId>>,
}

impl GroupInformation {
    pub fn vendor_groups(&self, vendor: &str) -> &[GroupId] {
        self.vendor.get(vendor).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn profile_groups(&self, customer: &str) -> &[GroupId] {
        self.profile.get(customer).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn zip_groups(&self, customer: &str) -> &[GroupId] {
        self.zip_code.get(customer).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Caller-supplied context for a lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub vendor_type: Option<VendorType>,
    #[serde(default)]
    pub vendor_list: Vec<VendorId>,
    #[serde(default)]
    pub group_information: Option<GroupInformation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorCriteriaRequest {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
    #[serde(default)]
    pub vendor_list: Vec<VendorId>,
    #[serde(default)]
    pub vendor_type: Option<VendorType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRecord {
    #[serde(default)]
    pub driver: Option<Reference>,
    #[serde(default)]
    pub drayos_carrier: Option<Reference>,
    #[serde(flatten)]
    pub rest: Map<String, JsonValue>,
}

/// Plain copy of a stored charge template. Fields the lookup does not read are
/// kept verbatim in `rest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChargeTemplate {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(rename = "chargeTemplateGroupID", default)]
    pub charge_template_group_id: Vec<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_profile_type: Option<String>,
    #[serde(default)]
    pub vendor_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_type: Option<String>,
    #[serde(default)]
    pub multi_query_index: Vec<String>,
    #[serde(flatten)]
    pub rest: Map<String, JsonValue>,
}
