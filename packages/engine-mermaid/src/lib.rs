//! Mermaid flowchart text ingestion (spec §4.F): a pure, total conversion
//! from `graph TD\nA-->B` style text into the same `GraphPayload` every
//! other engine works with. Carries no storage of its own — callers persist
//! the resulting payload through whichever `GraphEngine` they're targeting.

mod error;
mod parser;

pub use error::MermaidError;
pub use parser::parse_mermaid;
