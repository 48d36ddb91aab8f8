//! Canonical data shapes and error taxonomy shared by every crate in the
//! graph gateway workspace. Kept dependency-light and transport-agnostic:
//! adapters, the cache, and the HTTP layer all build on top of these types
//! instead of redefining their own.

pub mod error;
pub mod model;

pub use error::{GraphError, Result};
pub use model::{
    CreateGraphRequest, DatabaseInfo, Edge, GraphPayload, GraphStats, GraphSummary, ImpactResult,
    ImpactedNode, Node, QueryResult,
};
