//! The engine-abstraction core: the `GraphEngine` contract every back-end
//! implements (spec §4.B), the immutable registry/router that binds a
//! request to one adapter (§4.C), and the impact-analysis orchestration
//! every adapter's traversal feeds into (§4.H).

pub mod contract;
pub mod impact;
pub mod registry;

pub use contract::{CreateGraphParams, GraphEngine, ImpactParams, Operation};
pub use registry::EngineRegistry;
