use crate::libraries::storage::AggregateStore;
use anyhow::Result;

#[derive(Clone)]
pub struct Context {
    pub store: AggregateStore,
}

impl Context {
    pub async fn new(database_url: &str) -> Result<Self> {
        Ok(Self {
            store: AggregateStore::new(database_url).await?,
        })
    }
}
