use crate::model::GroupId;

/// Template group every lookup is scoped to unless overridden.
pub const DEFAULT_TEMPLATE_GROUP_ID: &str = "66729ed844d8b882ea14817c";
/// Templates with this move type are never returned by rule lookups.
pub const DEFAULT_EXCLUDED_MOVE_TYPE: &str = "BY_LEG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub template_group_id: GroupId,
    pub excluded_move_type: String,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            template_group_id: DEFAULT_TEMPLATE_GROUP_ID.to_string(),
            excluded_move_type: DEFAULT_EXCLUDED_MOVE_TYPE.to_string(),
        }
    }
}

impl RuleConfig {
    /// Defaults, overridden by `CHARGE_TEMPLATE_GROUP_ID` and
    /// `EXCLUDED_MOVE_TYPE` when set and non-empty.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_non_empty("CHARGE_TEMPLATE_GROUP_ID") {
            cfg.template_group_id = v;
        }
        if let Some(v) = env_non_empty("EXCLUDED_MOVE_TYPE") {
            cfg.excluded_move_type = v;
        }
        cfg
    }

    pub fn with_template_group(mut self, group: impl Into<GroupId>) -> Self {
        self.template_group_id = group.into();
        self
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}
