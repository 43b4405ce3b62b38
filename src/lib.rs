//! This library crate contains all the necessities to run a webtally deployment.
//!
//! Events submitted to the [`ingest`](services::ingest) service are appended to a durable
//! Redis stream, picked up in batches by the [`processor`](services::processor) service
//! through a consumer group and folded into per-site daily aggregates in PostgreSQL,
//! which the [`api`](services::api) service exposes read-only.

pub mod libraries;
pub mod services;
