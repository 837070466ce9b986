//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual page targets (queued, fetching, extracted, ...)
//! - `SkipReason` / `SkipStats`: Why candidate images were not downloaded, and how often

mod page_state;
mod skip;

// Re-export main types
pub use page_state::PageState;
pub use skip::{SkipReason, SkipStats};
