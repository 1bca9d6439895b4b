//! Loading and validation for action catalogs, game-state snapshots and
//! engine configuration.

mod builtin;
pub mod load;

pub use builtin::*;
pub use load::*;
