//! Records a live, tracked face mesh into a base mesh plus named blend shape
//! frames.
//!
//! A [`Tracker`] caches the most recent mesh from a tracking feed. A
//! [`Recorder`] snapshots it as the base of a session, records further
//! snapshots as displacements from that base, and hands the result to an
//! [`AssetSink`] when the session is finished.

pub use error::{BakeError, Result};
pub use pose::RigidPose;
pub use recorder::{compute_deltas, BlendShapeFrame, BlendShapeTarget, Recorder, RecorderState, FULL_WEIGHT};
pub use shared::{SharedRecorder, SharedTracker};
pub use sink::{AssetSink, MemorySink};
pub use snapshot::{triangles_from_flat, MeshSnapshot};
pub use tracker::{LiveMesh, SnapshotSource, Tracker};
pub use trigger::{Trigger, TriggerOutcome};

mod error;
mod pose;
mod recorder;
mod shared;
mod sink;
mod snapshot;
mod tracker;
mod trigger;
