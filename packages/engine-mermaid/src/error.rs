use graph_domain::GraphError;
use thiserror::Error;

/// A Mermaid parse failure, always tagged with the 1-indexed line it
/// occurred on. The parser is pure and total: this is the only way it ever
/// signals a problem, never a panic crossing the request boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct MermaidError {
    pub line: usize,
    pub message: String,
}

impl MermaidError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl From<MermaidError> for GraphError {
    fn from(err: MermaidError) -> Self {
        GraphError::Invalid(format!("mermaid parse error at {err}"))
    }
}
