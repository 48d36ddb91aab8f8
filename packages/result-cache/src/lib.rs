//! Process-local result cache fronting the graph engines (spec §4.G).
//! Fingerprinted by `(engine, database, graph_id, operation,
//! parameters_hash)`, single-flight on a miss, bounded by both entry count
//! and TTL — never a source of unbounded memory growth or duplicate
//! concurrent work against a back-end.

mod cache;
mod counters;
mod fingerprint;

pub use cache::{CacheOutcome, ResultCache, MAX_TTL_SECS};
pub use counters::{CacheCounters, CacheCountersSnapshot};
pub use fingerprint::{hash_parameters, Fingerprint};
