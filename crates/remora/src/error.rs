use crate::registry::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("node `{id}` is already registered")]
    DuplicateNode { id: NodeId },

    #[error("node `{id}` is not registered")]
    UnknownNode { id: String },

    #[error("invalid target radius {radius} for node `{id}` (must be finite and >= 0)")]
    InvalidRadius { id: NodeId, radius: f64 },

    #[error("node `{id}` has an invalid geographic anchor")]
    InvalidAnchor { id: NodeId },

    #[error("projection is not available for the current viewport")]
    ProjectionUnavailable,

    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
