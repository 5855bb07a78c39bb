use chargerules_core::{ChargeTemplate, Criteria, Result};

/// Read access to persisted charge templates.
#[async_trait::async_trait]
pub trait ChargeTemplateStore: Send + Sync + 'static {
    /// Plain copies of every template matching `criteria`.
    async fn find(&self, criteria: &Criteria) -> Result<Vec<ChargeTemplate>>;
}
