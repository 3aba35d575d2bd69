//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TargetState`: the lifecycle of a single crawl target within a pass

mod target_state;

pub use target_state::TargetState;
