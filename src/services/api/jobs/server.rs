use super::super::context::Context;
use super::super::structures::{PathViews, StatsQuery, StatsReply};
use crate::libraries::storage::{database, AggregateStore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use jatsl::{Job, TaskManager};
use log::{error, info};
use serde_json::json;
use sqlx::Error as SQLError;
use std::net::SocketAddr;
use warp::{http::StatusCode, reply, Filter};

const TOP_PATHS_LIMIT: i64 = 10;

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
        let routes = ServerJob::routes(manager.context.store.clone());

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
        store: AggregateStore,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let with_store = warp::any().map(move || store.clone());

        warp::get()
            .and(warp::path("stats"))
            .and(with_store)
            .and(warp::query::<StatsQuery>())
            .and_then(ServerJob::handle_stats)
    }

    async fn handle_stats(
        store: AggregateStore,
        query: StatsQuery,
    ) -> Result<impl warp::Reply, warp::Rejection> {
        let date = match &query.date {
            Some(raw) => match raw.parse::<NaiveDate>() {
                Ok(date) => date,
                Err(_) => {
                    return Ok(reply::with_status(
                        reply::json(&json!({ "error": "date must be YYYY-MM-DD" })),
                        StatusCode::BAD_REQUEST,
                    ))
                }
            },
            None => Utc::now().date_naive(),
        };

        match ServerJob::fetch_stats(&store, &query.site_id, date).await {
            Ok(stats) => Ok(reply::with_status(reply::json(&stats), StatusCode::OK)),
            Err(e) => {
                error!("Failed to query aggregates: {}", e);

                Ok(reply::with_status(
                    reply::json(&json!({ "error": "query failed" })),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ))
            }
        }
    }

    /// Sites and days without any recorded event report zero counters
    async fn fetch_stats(
        store: &AggregateStore,
        site_id: &str,
        date: NaiveDate,
    ) -> Result<StatsReply, SQLError> {
        let (total_views, unique_users) = database::fetch_daily_stats(store.pool(), site_id, date)
            .await?
            .unwrap_or((0, 0));

        let top_paths = database::fetch_top_paths(store.pool(), site_id, date, TOP_PATHS_LIMIT)
            .await?
            .into_iter()
            .map(|(path, views)| PathViews { path, views })
            .collect();

        Ok(StatsReply {
            site_id: site_id.to_string(),
            date: date.to_string(),
            total_views,
            unique_users,
            top_paths,
        })
    }
}
