use thiserror::Error;

/// Errors reported by the tracker and the recorder.
///
/// None of these are fatal: the tracker keeps its previous snapshot and the
/// recorder keeps its previous state, except for [`BakeError::Sink`] which is
/// only raised after the finished target has left the recorder.
#[derive(Error, Debug)]
pub enum BakeError {
    #[error("no tracked mesh is available")]
    NoTrackedMesh,
    #[error("invalid mesh geometry: {0}")]
    InvalidGeometry(String),
    #[error("tracked mesh has {actual} vertices but the base mesh has {expected}")]
    TopologyMismatch { expected: usize, actual: usize },
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording is in progress")]
    NotRecording,
    #[error("no recording to finish")]
    NothingToFinish,
    #[error("failed to store blend shape target: {0}")]
    Sink(#[source] anyhow::Error),
}

impl BakeError {
    pub(crate) fn invalid_geometry(message: impl Into<String>) -> Self {
        BakeError::InvalidGeometry(message.into())
    }

    /// Whether the error is a caller sequencing mistake rather than a problem
    /// with the tracked data.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, BakeError::AlreadyRecording | BakeError::NotRecording | BakeError::NothingToFinish)
    }
}

pub type Result<T, E = BakeError> = std::result::Result<T, E>;
