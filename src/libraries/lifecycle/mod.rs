//! Process lifecycle management

mod heart;

pub use heart::{DeathReason, Heart, HeartStone};
