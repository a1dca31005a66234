//! Thread-safe handles for when the tracking feed and the triggers don't run
//! on the same thread.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::pose::RigidPose;
use crate::recorder::{BlendShapeTarget, Recorder, RecorderState};
use crate::sink::AssetSink;
use crate::snapshot::MeshSnapshot;
use crate::tracker::{LiveMesh, SnapshotSource, Tracker};
use crate::trigger::{Trigger, TriggerOutcome};

/// A [`Tracker`] shared between the feed and its readers.
///
/// Readers always see a whole snapshot: an update swaps the `Arc` under the
/// write lock, never the arrays in place.
#[derive(Debug, Clone, Default)]
pub struct SharedTracker {
    inner: Arc<RwLock<Tracker>>,
}

impl SharedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tracking_begin(&self) {
        self.inner.write().on_tracking_begin();
    }

    pub fn on_tracking_update(
        &self,
        vertices: Vec<Vec3>,
        uvs: Vec<Vec2>,
        triangles: Vec<[u32; 3]>,
        pose: RigidPose,
    ) -> Result<bool> {
        // Validate outside of the lock.
        let snapshot = MeshSnapshot::new(vertices, uvs, triangles)?;
        Ok(self.inner.write().replace(snapshot, pose))
    }

    /// Same as [`Tracker::replace`].
    pub fn replace(&self, snapshot: MeshSnapshot, pose: RigidPose) -> bool {
        self.inner.write().replace(snapshot, pose)
    }

    /// Acquires a mesh and sets its first state in one step, so readers never
    /// see the empty snapshot in between.
    pub fn begin_with(&self, snapshot: MeshSnapshot, pose: RigidPose) {
        let mut tracker = self.inner.write();
        tracker.on_tracking_begin();
        tracker.replace(snapshot, pose);
    }

    /// Replaces the mesh, acquiring it first if nothing is tracked. Returns
    /// whether this update acquired the mesh.
    pub fn update_or_begin(&self, snapshot: MeshSnapshot, pose: RigidPose) -> bool {
        let mut tracker = self.inner.write();
        let acquired = !tracker.is_tracking();
        if acquired {
            tracker.on_tracking_begin();
        }
        tracker.replace(snapshot, pose);
        acquired
    }

    pub fn on_tracking_end(&self) {
        self.inner.write().on_tracking_end();
    }

    pub fn current(&self) -> Option<LiveMesh> {
        self.inner.read().current().cloned()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation()
    }

    /// The live mesh together with the generation it belongs to.
    pub fn current_with_generation(&self) -> (Option<LiveMesh>, u64) {
        let tracker = self.inner.read();
        (tracker.current().cloned(), tracker.generation())
    }
}

impl SnapshotSource for SharedTracker {
    fn current_snapshot(&self) -> Option<Arc<MeshSnapshot>> {
        self.inner.read().current_snapshot()
    }
}

/// A [`Recorder`] behind a single lock, so that a begin, capture or finish
/// runs start to end without another trigger interleaving.
#[derive(Debug, Default)]
pub struct SharedRecorder {
    inner: Mutex<Recorder>,
}

impl SharedRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.inner.lock().state()
    }

    /// State, frames recorded so far and the number of the next frame, read
    /// together.
    pub fn status(&self) -> (RecorderState, usize, u32) {
        let recorder = self.inner.lock();
        (recorder.state(), recorder.frame_count(), recorder.next_frame_number())
    }

    pub fn begin_capture(&self, source: &impl SnapshotSource) -> Result<()> {
        self.inner.lock().begin_capture(source)
    }

    /// Returns the name of the captured frame.
    pub fn capture_frame(&self, source: &impl SnapshotSource) -> Result<String> {
        Ok(self.inner.lock().capture_frame(source)?.name.clone())
    }

    pub fn finish_capture(&self) -> Result<BlendShapeTarget> {
        self.inner.lock().finish_capture()
    }

    pub fn abandon_capture(&self) -> Option<BlendShapeTarget> {
        self.inner.lock().abandon_capture()
    }

    /// Same as [`Recorder::primary`].
    pub fn primary<R>(&self, source: &impl SnapshotSource) -> Result<TriggerOutcome<R>> {
        self.inner.lock().primary(source)
    }

    pub fn trigger<S: AssetSink>(
        &self,
        trigger: Trigger,
        source: &impl SnapshotSource,
        sink: &mut S,
    ) -> Result<TriggerOutcome<S::Receipt>> {
        self.inner.lock().trigger(trigger, source, sink)
    }
}
