//! Row <-> domain type conversions. Property bags are stored as a
//! JSON-serialized string property (`properties`) rather than a native Bolt
//! map — `neo4rs`'s `BoltType` has no lossless round-trip for arbitrary
//! nested JSON, so both this adapter and the relational one serialize at the
//! storage edge and parse back on read (spec §3's "serialize on write, parse
//! on read" rule, applied here too rather than only where the original spec
//! mandated it for the relational store).

use graph_domain::{Edge, GraphError, Node, Result};
use neo4rs::Row;

use crate::error::map_driver_error;

fn properties_from_json_text(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text)
        .map_err(|e| GraphError::internal(InvalidStoredJson(text.to_string(), e.to_string())))
}

#[derive(Debug, thiserror::Error)]
#[error("malformed stored properties json '{0}': {1}")]
struct InvalidStoredJson(String, String);

pub fn properties_to_json_text(value: &serde_json::Value) -> String {
    value.to_string()
}

pub fn node_from_row(row: &Row) -> Result<Node> {
    let properties_text: String = row.get("properties").map_err(map_driver_error)?;
    Ok(Node {
        id: row.get("node_id").map_err(map_driver_error)?,
        label: row.get("label").map_err(map_driver_error)?,
        node_type: row.get("node_type").map_err(map_driver_error)?,
        properties: properties_from_json_text(&properties_text)?,
    })
}

pub fn edge_from_row(row: &Row) -> Result<Edge> {
    let properties_text: String = row.get("properties").map_err(map_driver_error)?;
    Ok(Edge {
        source_id: row.get("source_id").map_err(map_driver_error)?,
        target_id: row.get("target_id").map_err(map_driver_error)?,
        edge_type: row.get("edge_type").map_err(map_driver_error)?,
        label: row.get("label").ok(),
        properties: properties_from_json_text(&properties_text)?,
    })
}
