//! Relational graph engine adapter (spec §4.E): a Postgres-backed
//! `GraphEngine` storing nodes and edges in two flat tables plus a `graphs`
//! metadata table, with impact analysis implemented as a frontier-loop BFS
//! rather than a naive recursive CTE (spec §9).

mod engine;
mod error;
mod queries;
mod rows;

pub use engine::RelationalEngine;
