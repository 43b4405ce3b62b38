use serde::{Deserialize, Serialize};

/// Query parameters of the stats endpoint
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub site_id: String,
    /// Day to report on (YYYY-MM-DD), defaults to the current UTC date
    pub date: Option<String>,
}

/// Aggregated statistics of one site on one day
#[derive(Debug, Serialize)]
pub struct StatsReply {
    pub site_id: String,
    pub date: String,
    pub total_views: i64,
    pub unique_users: i64,
    pub top_paths: Vec<PathViews>,
}

/// Views a single path received on one day
#[derive(Debug, Serialize)]
pub struct PathViews {
    pub path: String,
    pub views: i64,
}
