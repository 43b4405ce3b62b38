use crate::libraries::resources::{DefaultResourceManager, ResourceManagerProvider};
use crate::libraries::storage::AggregateStore;
use anyhow::Result;

/// Delivery settings of the consumer loop
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub group: String,
    pub consumer: String,
    pub batch_size: usize,
    pub poll_timeout: usize,
}

#[derive(Clone)]
pub struct Context {
    resource_manager: DefaultResourceManager,
    pub store: AggregateStore,
    pub config: ConsumerConfig,
}

impl Context {
    pub async fn new(redis_url: String, database_url: &str, config: ConsumerConfig) -> Result<Self> {
        let store = AggregateStore::new(database_url).await?;

        Ok(Self {
            resource_manager: DefaultResourceManager::new(redis_url),
            store,
            config,
        })
    }
}

impl ResourceManagerProvider<DefaultResourceManager> for Context {
    fn resource_manager(&self) -> DefaultResourceManager {
        self.resource_manager.clone()
    }
}
