//! Deterministic hand recommendations. Keep this crate free of IO and
//! platform concerns; report writers are the only file access.

pub mod action_hand;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod hints;
pub mod ordering;
pub mod report;
pub mod scoring;
pub mod snapshot;
pub mod targets_hand;
pub mod types;

pub use action_hand::*;
pub use catalog::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use hints::*;
pub use ordering::*;
pub use report::*;
pub use scoring::*;
pub use snapshot::*;
pub use targets_hand::*;
pub use types::*;
