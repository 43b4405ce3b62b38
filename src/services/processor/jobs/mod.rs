mod consumer;

pub use consumer::{ensure_group, EventConsumerJob};
