use futures::future::FutureExt;
use jatsl::TaskResourceHandle;
use log::{debug, warn};
use redis::{
    aio::{Connection, ConnectionLike, MultiplexedConnection},
    Client, Cmd, Pipeline, RedisError, RedisFuture, RedisResult, Value,
};
use std::time::Duration;
use tokio::time::{sleep, timeout};

const RETRY_INTERVAL: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Individual redis resource created on-demand
///
/// Safe for blocking commands, it is not shared with anybody else.
pub type StandaloneRedisResource = RedisResource<Connection>;
/// Multiplexed redis resource that can be cloned cheaply
pub type SharedRedisResource = RedisResource<MultiplexedConnection>;

/// Redis connection that monitors for connection errors
///
/// Connectivity failures are reported to the owning task's resource handle,
/// prompting the scheduler to restart the job with a fresh connection.
pub struct RedisResource<C: ConnectionLike> {
    con: C,
    handle: TaskResourceHandle,
}

impl RedisResource<Connection> {
    /// Creates a new standalone redis connection
    pub async fn new(handle: TaskResourceHandle, url: &str) -> RedisResult<Self> {
        let client = Client::open(url)?;
        let con = RedisResource::connect_standalone(client).await;

        Ok(Self { con, handle })
    }

    async fn connect_standalone(client: Client) -> Connection {
        let mut warn = true;

        loop {
            match timeout(REQUEST_TIMEOUT, client.get_async_connection()).await {
                Ok(Ok(connection)) => return connection,
                Ok(Err(e)) => {
                    if warn {
                        warn = false;
                        warn!("Unable to connect to redis server! ({})", e)
                    }
                }
                Err(e) => {
                    if warn {
                        warn = false;
                        warn!("Timed out while connecting to redis! ({})", e)
                    }
                }
            }

            sleep(RETRY_INTERVAL).await;
        }
    }
}

impl RedisResource<MultiplexedConnection> {
    /// Creates a new multiplexed redis connection
    pub async fn shared(handle: TaskResourceHandle, url: &str) -> RedisResult<Self> {
        let client = Client::open(url)?;
        let con = RedisResource::connect_multiplexed(client).await;

        Ok(Self { con, handle })
    }

    async fn connect_multiplexed(client: Client) -> MultiplexedConnection {
        let mut warn = true;

        loop {
            match timeout(REQUEST_TIMEOUT, client.get_multiplexed_tokio_connection()).await {
                Ok(Ok(connection)) => return connection,
                Ok(Err(e)) => {
                    if warn {
                        warn = false;
                        warn!("Unable to connect to redis server! ({})", e)
                    }
                }
                Err(e) => {
                    if warn {
                        warn = false;
                        warn!("Timed out while connecting to redis! ({})", e)
                    }
                }
            }

            sleep(RETRY_INTERVAL).await;
        }
    }
}

impl<C: ConnectionLike> RedisResource<C> {
    async fn notify(&mut self, error: &RedisError) {
        debug!("Redis connection failure: {}", error);
        self.handle.resource_died().await;
    }
}

impl Clone for RedisResource<MultiplexedConnection> {
    fn clone(&self) -> Self {
        Self {
            con: self.con.clone(),
            handle: self.handle.clone(),
        }
    }
}

/// Handle a redis command result.
macro_rules! notify_if_disconnected {
    ($self:expr, $result:expr) => {
        if let Err(ref e) = $result {
            if e.is_connection_dropped()
                || e.is_io_error()
                || e.is_connection_refusal()
                || e.is_timeout()
            {
                $self.notify(e).await;
            }
        }
    };
}

impl<C: ConnectionLike + Send> ConnectionLike for RedisResource<C> {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        (async move {
            let result = self.con.req_packed_command(cmd).await;
            notify_if_disconnected!(self, result);
            result
        })
        .boxed()
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        (async move {
            let result = self.con.req_packed_commands(cmd, offset, count).await;
            notify_if_disconnected!(self, result);
            result
        })
        .boxed()
    }

    fn get_db(&self) -> i64 {
        self.con.get_db()
    }
}
