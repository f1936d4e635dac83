//! Application use cases (business logic orchestration).

mod list_features;
mod run_suite;

pub use list_features::*;
pub use run_suite::*;
