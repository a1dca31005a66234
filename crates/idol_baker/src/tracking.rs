use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::Resource;
use parking_lot::Mutex;

use idol_api::{FaceMesh, RecordingState, RecordingStatus, TriggerResponse};
use idol_bake::{AssetSink, BakeError, BlendShapeTarget, MeshSnapshot, RecorderState, RigidPose, SharedRecorder, SharedTracker, Trigger, TriggerOutcome};

use crate::asset_sink::JsonAssetSink;

struct BakerInner {
    tracker: SharedTracker,
    recorder: SharedRecorder,
    sink: Mutex<JsonAssetSink>,
}

/// The tracked face and the blend shape recording made from it.
///
/// Shared by the HTTP API, which feeds it, and the bevy world, which draws
/// the face and turns key presses into triggers.
#[derive(Clone, Resource)]
pub struct Baker {
    inner: Arc<BakerInner>,
}

impl Baker {
    pub fn new(sink: JsonAssetSink) -> Self {
        Self {
            inner: Arc::new(BakerInner {
                tracker: SharedTracker::new(),
                recorder: SharedRecorder::new(),
                sink: Mutex::new(sink),
            }),
        }
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.inner.tracker
    }

    /// A face was acquired; `mesh` is its first state.
    pub fn face_acquired(&self, mesh: FaceMesh) -> Result<(), BakeError> {
        let (snapshot, pose) = Self::convert(mesh)?;
        self.inner.tracker.begin_with(snapshot, pose);
        Ok(())
    }

    /// A new state of the tracked face. Acquires the face if none was
    /// tracked; returns whether it did.
    pub fn face_updated(&self, mesh: FaceMesh) -> Result<bool, BakeError> {
        let (snapshot, pose) = Self::convert(mesh)?;
        Ok(self.inner.tracker.update_or_begin(snapshot, pose))
    }

    fn convert(mesh: FaceMesh) -> Result<(MeshSnapshot, RigidPose), BakeError> {
        let triangles = idol_bake::triangles_from_flat(&mesh.triangle_indices)?;
        let snapshot = MeshSnapshot::new(mesh.vertices, mesh.uvs, triangles)?;
        Ok((snapshot, RigidPose::from_matrix(&mesh.transform)))
    }

    pub fn face_lost(&self) {
        self.inner.tracker.on_tracking_end();
    }

    pub fn trigger(&self, trigger: Trigger) -> Result<TriggerOutcome<PathBuf>, BakeError> {
        match trigger {
            Trigger::Primary => self.inner.recorder.primary(&self.inner.tracker),
            Trigger::Finalize => self.store(self.take_finished()?),
        }
    }

    /// Ends the recording in progress. Only touches memory, so the caller
    /// can [`Baker::store`] the result elsewhere.
    pub fn take_finished(&self) -> Result<BlendShapeTarget, BakeError> {
        self.inner.recorder.finish_capture()
    }

    /// Writes a finished target to disk. The recorder isn't locked meanwhile.
    pub fn store(&self, target: BlendShapeTarget) -> Result<TriggerOutcome<PathBuf>, BakeError> {
        let frame_count = target.frames().len();
        let receipt = self.inner.sink.lock().store(target).map_err(BakeError::Sink)?;
        Ok(TriggerOutcome::Finished {
            frame_count,
            receipt,
        })
    }

    pub fn status(&self) -> RecordingStatus {
        let (state, frame_count, next_frame) = self.inner.recorder.status();
        RecordingStatus {
            state: match state {
                RecorderState::Idle => RecordingState::Idle,
                RecorderState::Recording => RecordingState::Recording,
            },
            tracking: self.inner.tracker.current().is_some(),
            frame_count,
            next_frame,
        }
    }
}

/// Converts a trigger outcome into its API response. A free function because
/// both types are foreign to this crate.
pub fn trigger_response(value: TriggerOutcome<PathBuf>) -> TriggerResponse {
    match value {
        TriggerOutcome::Began { vertex_count } => TriggerResponse::Began { vertex_count },
        TriggerOutcome::Captured { name, frame_count } => TriggerResponse::Captured { name, frame_count },
        TriggerOutcome::Finished { frame_count, receipt } => TriggerResponse::Finished {
            frame_count,
            asset: receipt.display().to_string(),
        },
    }
}

/// Logs the result of a trigger the way the input layer reports it.
pub fn log_trigger(trigger: Trigger, result: &Result<TriggerOutcome<PathBuf>, BakeError>) {
    match result {
        Ok(TriggerOutcome::Began { vertex_count }) => tracing::info!("recording from a {} vertex base mesh", vertex_count),
        Ok(TriggerOutcome::Captured { name, .. }) => tracing::info!("added blend shape {}", name),
        Ok(TriggerOutcome::Finished { frame_count, receipt }) =>
            tracing::info!("saved {} blend shapes to {}", frame_count, receipt.display()),
        Err(err) if err.is_protocol_violation() => tracing::debug!("ignored {:?}: {}", trigger, err),
        Err(err) => tracing::warn!("{:?} failed: {}", trigger, err),
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec2, Vec3};
    use test_log::test;

    use super::*;

    fn face(z: f32) -> FaceMesh {
        FaceMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::new(0., 1., z)],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            triangle_indices: vec![0, 1, 2],
            transform: Mat4::from_translation(Vec3::new(0., 0., -0.5)),
        }
    }

    #[test]
    fn records_through_triggers() {
        let dir = tempfile::tempdir().unwrap();
        let baker = Baker::new(JsonAssetSink::new(dir.path(), "Face"));

        baker.face_acquired(face(0.)).unwrap();
        assert_eq!(baker.tracker().current().unwrap().pose.translation, Vec3::new(0., 0., -0.5));

        baker.trigger(Trigger::Primary).unwrap();
        baker.face_updated(face(1.)).unwrap();
        baker.trigger(Trigger::Primary).unwrap();
        assert_eq!(baker.status().frame_count, 1);
        assert_eq!(baker.status().next_frame, 2);

        let outcome = baker.trigger(Trigger::Finalize).unwrap();
        assert_eq!(outcome, TriggerOutcome::Finished { frame_count: 1, receipt: dir.path().join("Face.json") });
        assert_eq!(baker.status().state, RecordingState::Idle);
    }

    #[test]
    fn update_acquires_face() {
        let baker = Baker::new(JsonAssetSink::new("unused", "Face"));
        assert!(baker.face_updated(face(0.)).unwrap());
        assert!(!baker.face_updated(face(1.)).unwrap());
        assert!(baker.status().tracking);

        baker.trigger(Trigger::Primary).unwrap();
        assert_eq!(baker.status().state, RecordingState::Recording);
    }

    #[test]
    fn recorder_is_free_while_storing() {
        let dir = tempfile::tempdir().unwrap();
        let baker = Baker::new(JsonAssetSink::new(dir.path(), "Face"));
        baker.face_updated(face(0.)).unwrap();
        baker.trigger(Trigger::Primary).unwrap();
        baker.trigger(Trigger::Primary).unwrap();

        let target = baker.take_finished().unwrap();
        // A new session can start before the previous one hits the disk.
        baker.trigger(Trigger::Primary).unwrap();
        assert_eq!(baker.status().state, RecordingState::Recording);

        let outcome = baker.store(target).unwrap();
        assert_eq!(outcome, TriggerOutcome::Finished { frame_count: 1, receipt: dir.path().join("Face.json") });
        assert!(matches!(baker.take_finished(), Ok(t) if t.frames().is_empty()));
        assert!(matches!(baker.take_finished(), Err(BakeError::NothingToFinish)));
    }

    #[test]
    fn rejects_ragged_indices() {
        let baker = Baker::new(JsonAssetSink::new("unused", "Face"));
        let mut mesh = face(0.);
        mesh.triangle_indices.push(0);
        assert!(matches!(baker.face_acquired(mesh), Err(BakeError::InvalidGeometry(_))));
        assert!(!baker.status().tracking);
    }

    #[test]
    fn lost_face_blocks_capture() {
        let baker = Baker::new(JsonAssetSink::new("unused", "Face"));
        baker.face_acquired(face(0.)).unwrap();
        baker.trigger(Trigger::Primary).unwrap();
        baker.face_lost();

        assert!(matches!(baker.trigger(Trigger::Primary), Err(BakeError::NoTrackedMesh)));
        let status = baker.status();
        assert_eq!(status.state, RecordingState::Recording);
        assert!(!status.tracking);
    }
}
