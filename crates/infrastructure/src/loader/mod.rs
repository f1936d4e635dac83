//! Scenario file loading.
//!
//! A scenario file describes one feature:
//!
//! ```yaml
//! feature: JSONPlaceholder API
//! before:
//!   headers: { Content-Type: application/json; charset=UTF-8 }
//! schemas:
//!   post: { type: object, fields: { id: { type: number, required: true } } }
//! scenarios:
//!   - name: get specific post
//!     steps:
//!       - request: { method: GET, url: https://jsonplaceholder.typicode.com/posts/1 }
//!         expect:
//!           - status_successful
//!           - matches_schema: { type: ref, name: post }
//!           - contains_json: { userId: 1, id: 1 }
//! ```

mod document;
mod file_source;

pub use document::{HookDocument, ScenarioDocument, StepDocument, SuiteDocument};
pub use file_source::{FileFeatureSource, load_features, parse_document, parse_feature};
