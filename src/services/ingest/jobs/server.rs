use super::super::context::Context;
use super::super::structures::EventSubmission;
use crate::libraries::helpers::keys;
use crate::libraries::resources::SharedRedisResource;
use crate::{
    libraries::resources::{ResourceManager, ResourceManagerProvider},
    with_shared_redis_resource,
};
use anyhow::Result;
use async_trait::async_trait;
use jatsl::{Job, TaskManager};
use log::{debug, error, info};
use redis::AsyncCommands;
use serde_json::json;
use std::net::SocketAddr;
use warp::{http::StatusCode, reply, Filter};

#[derive(Clone)]
pub struct ServerJob {
    port: u16,
}

#[async_trait]
impl Job for ServerJob {
    type Context = Context;

    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: TaskManager<Self::Context>) -> Result<()> {
        let con = with_shared_redis_resource!(manager);
        let routes = ServerJob::routes(con);

        let source_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let (addr, server) =
            warp::serve(routes).bind_with_graceful_shutdown(source_addr, manager.termination_signal());

        info!("Listening at {:?}", addr);
        manager.ready().await;

        server.await;

        Ok(())
    }
}

impl ServerJob {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    fn routes(
        con: SharedRedisResource,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let with_con = warp::any().map(move || con.clone());

        warp::post()
            .and(warp::path("event"))
            .and(with_con)
            .and(warp::body::json())
            .and_then(ServerJob::handle_submission)
    }

    async fn handle_submission(
        mut con: SharedRedisResource,
        submission: EventSubmission,
    ) -> Result<impl warp::Reply, warp::Rejection> {
        if !submission.is_valid() {
            return Ok(reply::with_status(
                reply::json(&json!({ "error": "site_id and event_type must not be empty" })),
                StatusCode::BAD_REQUEST,
            ));
        }

        match con
            .xadd::<_, _, _, _, String>(keys::EVENT_STREAM, "*", &submission.to_fields())
            .await
        {
            Ok(entry_id) => {
                debug!("Enqueued event {} for site {}", entry_id, submission.site_id);

                Ok(reply::with_status(
                    reply::json(&json!({ "status": "accepted" })),
                    StatusCode::ACCEPTED,
                ))
            }
            Err(e) => {
                error!("Failed to enqueue event: {}", e);

                Ok(reply::with_status(
                    reply::json(&json!({ "error": "enqueue failed" })),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ))
            }
        }
    }
}
