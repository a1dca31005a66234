use std::sync::Arc;

use glam::Vec3;

use crate::error::{BakeError, Result};
use crate::sink::AssetSink;
use crate::snapshot::MeshSnapshot;
use crate::tracker::SnapshotSource;

/// Weight every recorded frame is stored with: the delta applies in full at
/// weight 100.
pub const FULL_WEIGHT: f32 = 100.0;

/// A named per-vertex displacement from the base mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShapeFrame {
    pub name: String,
    pub weight: f32,
    pub deltas: Vec<Vec3>,
}

/// A base mesh and the frames recorded against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShapeTarget {
    base: Arc<MeshSnapshot>,
    frames: Vec<BlendShapeFrame>,
}

impl BlendShapeTarget {
    pub fn new(base: Arc<MeshSnapshot>) -> Self {
        Self {
            base,
            frames: Vec::new(),
        }
    }

    pub fn base(&self) -> &MeshSnapshot {
        &self.base
    }

    pub fn frames(&self) -> &[BlendShapeFrame] {
        &self.frames
    }

    pub fn frame(&self, name: &str) -> Option<&BlendShapeFrame> {
        self.frames.iter().find(|f| f.name == name)
    }

    pub fn into_parts(self) -> (Arc<MeshSnapshot>, Vec<BlendShapeFrame>) {
        (self.base, self.frames)
    }

    fn push_frame(&mut self, name: String, live: &MeshSnapshot) -> Result<&BlendShapeFrame> {
        debug_assert!(self.frame(&name).is_none(), "duplicate frame name {}", name);
        let deltas = compute_deltas(&self.base, live)?;
        self.frames.push(BlendShapeFrame {
            name,
            weight: FULL_WEIGHT,
            deltas,
        });
        Ok(&self.frames[self.frames.len() - 1])
    }
}

/// `live[i] - base[i]` for every vertex.
pub fn compute_deltas(base: &MeshSnapshot, live: &MeshSnapshot) -> Result<Vec<Vec3>> {
    if base.vertex_count() != live.vertex_count() {
        return Err(BakeError::TopologyMismatch {
            expected: base.vertex_count(),
            actual: live.vertex_count(),
        });
    }

    Ok(live.vertices().iter()
        .zip(base.vertices())
        .map(|(live, base)| *live - *base)
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

#[derive(Debug)]
struct Session {
    target: BlendShapeTarget,
    next_frame: u32,
}

/// Turns snapshots of the tracked mesh into a [`BlendShapeTarget`].
///
/// `Idle --begin--> Recording --capture--> Recording --finish--> Idle`.
/// Operations called in the wrong state fail without touching the session.
#[derive(Debug, Default)]
pub struct Recorder {
    session: Option<Session>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        match self.session {
            Some(_) => RecorderState::Recording,
            None => RecorderState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// The target being built, if recording.
    pub fn target(&self) -> Option<&BlendShapeTarget> {
        self.session.as_ref().map(|s| &s.target)
    }

    pub fn frame_count(&self) -> usize {
        self.target().map_or(0, |t| t.frames().len())
    }

    /// Number the next captured frame will be named with. Zero when idle.
    pub fn next_frame_number(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.next_frame)
    }

    /// Takes the current tracked mesh as the base of a new session.
    pub fn begin_capture(&mut self, source: &impl SnapshotSource) -> Result<()> {
        if self.session.is_some() {
            return Err(BakeError::AlreadyRecording);
        }
        let base = source.current_snapshot().ok_or(BakeError::NoTrackedMesh)?;

        tracing::info!(
            vertices = base.vertex_count(),
            triangles = base.triangles().len(),
            "started recording blend shapes",
        );
        self.session = Some(Session {
            target: BlendShapeTarget::new(base),
            next_frame: 1,
        });
        Ok(())
    }

    /// Records the current tracked mesh as a new frame, relative to the base.
    pub fn capture_frame(&mut self, source: &impl SnapshotSource) -> Result<&BlendShapeFrame> {
        let Some(session) = self.session.as_mut() else {
            return Err(BakeError::NotRecording);
        };
        let live = source.current_snapshot().ok_or(BakeError::NoTrackedMesh)?;

        let name = format!("Shape{}", session.next_frame);
        let frame = session.target.push_frame(name, &live)?;
        session.next_frame += 1;

        tracing::info!(name = %frame.name, "captured blend shape");
        Ok(frame)
    }

    /// Ends the session and hands back everything recorded.
    pub fn finish_capture(&mut self) -> Result<BlendShapeTarget> {
        let session = self.session.take().ok_or(BakeError::NothingToFinish)?;
        tracing::info!(frames = session.target.frames().len(), "finished recording blend shapes");
        Ok(session.target)
    }

    /// Ends the session and passes the target on to `sink`.
    ///
    /// The recorder is idle again even if the sink fails.
    pub fn finish_into<S: AssetSink>(&mut self, sink: &mut S) -> Result<S::Receipt> {
        let target = self.finish_capture()?;
        sink.store(target).map_err(BakeError::Sink)
    }

    /// Drops the session without storing it.
    pub fn abandon_capture(&mut self) -> Option<BlendShapeTarget> {
        let session = self.session.take()?;
        let frames = session.target.frames().len();
        if frames > 0 {
            tracing::warn!(frames, "abandoned recording, discarding captured blend shapes");
        }
        Some(session.target)
    }
}
