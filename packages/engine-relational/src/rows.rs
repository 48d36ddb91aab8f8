//! Row <-> domain type conversions for the three-table layout (spec §4.E).
//! Property bags round-trip through `JSONB` natively — unlike the Cypher
//! adapter, Postgres doesn't force a serialize-to-TEXT detour.

use graph_domain::{Edge, Node};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::error::map_driver_error;
use graph_domain::Result;

pub fn node_from_row(row: &PgRow) -> Result<Node> {
    Ok(Node {
        id: row.try_get("node_id").map_err(map_driver_error)?,
        label: row.try_get("label").map_err(map_driver_error)?,
        node_type: row.try_get("node_type").map_err(map_driver_error)?,
        properties: row.try_get("properties").map_err(map_driver_error)?,
    })
}

pub fn edge_from_row(row: &PgRow) -> Result<Edge> {
    Ok(Edge {
        source_id: row.try_get("source_id").map_err(map_driver_error)?,
        target_id: row.try_get("target_id").map_err(map_driver_error)?,
        edge_type: row.try_get("edge_type").map_err(map_driver_error)?,
        label: row.try_get("label").map_err(map_driver_error)?,
        properties: row.try_get("properties").map_err(map_driver_error)?,
    })
}
