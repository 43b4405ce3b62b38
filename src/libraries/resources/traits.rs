use async_trait::async_trait;
use jatsl::TaskResourceHandle;
use redis::{aio::ConnectionLike, RedisError};
use thiserror::Error;

/// Resource access errors
#[derive(Error, Debug)]
pub enum ResourceManagerError {
    #[error("failed to connect to redis")]
    Redis(#[from] RedisError),
}

/// Result shorthand
pub type ResourceManagerResult<T> = Result<T, ResourceManagerError>;

/// Manager that provides access to a set of resources
#[async_trait]
pub trait ResourceManager {
    type Redis: ConnectionLike + Send;
    type SharedRedis: ConnectionLike + Send;

    async fn redis(&self, handle: TaskResourceHandle) -> ResourceManagerResult<Self::Redis>;
    async fn shared_redis(
        &self,
        handle: TaskResourceHandle,
    ) -> ResourceManagerResult<Self::SharedRedis>;
}

/// Provider of a resource manager, implemented by job contexts
pub trait ResourceManagerProvider<R: ResourceManager> {
    fn resource_manager(&self) -> R;
}
