use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SsspError>;

/// Invalid-input conditions rejected at the API boundary.
///
/// Everything past these checks is total: the solver neither retries nor
/// returns partial results.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SsspError {
    #[error("edge {from} -> {to} has negative weight {weight}")]
    NegativeWeight { from: usize, to: usize, weight: f64 },
    #[error("edge {from} -> {to} has a non-finite weight")]
    NonFiniteWeight { from: usize, to: usize },
    #[error("vertex {vertex} is out of range for a graph of {vertices} vertices")]
    VertexOutOfRange { vertex: usize, vertices: usize },
    #[error("graph has no vertices")]
    EmptyGraph,
    #[error("source {src_vertex} is out of range for a graph of {vertices} vertices")]
    SourceOutOfRange { src_vertex: usize, vertices: usize },
}
