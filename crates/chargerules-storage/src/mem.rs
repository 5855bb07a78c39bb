use crate::metrics::TEMPLATE_SCAN_SECONDS;
use crate::traits::ChargeTemplateStore;
use chargerules_core::{ChargeTemplate, Criteria, Result};
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    // templates alongside their document form, which is what criteria match on
    records: Vec<(JsonValue, ChargeTemplate)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_templates<I>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = ChargeTemplate>,
    {
        let store = Self::new();
        for t in templates {
            store.insert(t)?;
        }
        Ok(store)
    }

    pub fn insert(&self, template: ChargeTemplate) -> Result<()> {
        let doc = serde_json::to_value(&template)?;
        self.inner.write().records.push((doc, template));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ChargeTemplateStore for InMemoryStore {
    async fn find(&self, criteria: &Criteria) -> Result<Vec<ChargeTemplate>> {
        let _timer = TEMPLATE_SCAN_SECONDS.start_timer();
        let inner = self.inner.read();
        let out = inner
            .records
            .iter()
            .filter(|(doc, _)| criteria.matches(doc))
            .map(|(_, t)| t.clone())
            .collect();
        Ok(out)
    }
}
