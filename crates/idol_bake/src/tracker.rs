use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::error::Result;
use crate::pose::RigidPose;
use crate::snapshot::MeshSnapshot;

/// Anything that can hand out the latest tracked mesh.
pub trait SnapshotSource {
    fn current_snapshot(&self) -> Option<Arc<MeshSnapshot>>;
}

/// The latest tracked mesh and where it is.
#[derive(Debug, Clone)]
pub struct LiveMesh {
    pub snapshot: Arc<MeshSnapshot>,
    pub pose: RigidPose,
}

/// Caches the most recent mesh delivered by the tracking feed.
///
/// No history is kept: every update replaces the previous snapshot as a
/// whole. The tracker knows nothing about recording, so losing the mesh never
/// touches a recording in progress.
#[derive(Debug, Default)]
pub struct Tracker {
    live: Option<LiveMesh>,
    generation: u64,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mesh was acquired. Any previous snapshot is discarded and replaced by
    /// an empty one until the first update arrives.
    pub fn on_tracking_begin(&mut self) {
        if self.live.is_some() {
            tracing::debug!("tracking restarted, discarding previous mesh");
        }
        self.live = Some(LiveMesh {
            snapshot: Arc::new(MeshSnapshot::default()),
            pose: RigidPose::IDENTITY,
        });
        self.generation += 1;
    }

    /// Replaces the mesh and pose.
    ///
    /// The arrays are validated before anything is replaced; on error the
    /// previous snapshot stays current. Returns `false` if the update was
    /// dropped because no mesh is being tracked.
    pub fn on_tracking_update(
        &mut self,
        vertices: Vec<Vec3>,
        uvs: Vec<Vec2>,
        triangles: Vec<[u32; 3]>,
        pose: RigidPose,
    ) -> Result<bool> {
        let snapshot = MeshSnapshot::new(vertices, uvs, triangles)?;
        Ok(self.replace(snapshot, pose))
    }

    /// Same as [`Tracker::on_tracking_update`] for an already validated snapshot.
    pub fn replace(&mut self, snapshot: MeshSnapshot, pose: RigidPose) -> bool {
        let Some(live) = self.live.as_mut() else {
            tracing::debug!("ignoring mesh update while not tracking");
            return false;
        };

        *live = LiveMesh {
            snapshot: Arc::new(snapshot),
            pose,
        };
        self.generation += 1;
        true
    }

    /// The mesh was lost.
    pub fn on_tracking_end(&mut self) {
        if self.live.take().is_some() {
            self.generation += 1;
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.live.is_some()
    }

    pub fn current(&self) -> Option<&LiveMesh> {
        self.live.as_ref()
    }

    pub fn pose(&self) -> Option<RigidPose> {
        self.live.as_ref().map(|l| l.pose)
    }

    /// Bumped on every change, including loss of the mesh.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl SnapshotSource for Tracker {
    fn current_snapshot(&self) -> Option<Arc<MeshSnapshot>> {
        self.live.as_ref().map(|l| l.snapshot.clone())
    }
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for &T {
    fn current_snapshot(&self) -> Option<Arc<MeshSnapshot>> {
        (**self).current_snapshot()
    }
}
