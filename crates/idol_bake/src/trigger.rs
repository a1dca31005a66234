use crate::error::Result;
use crate::recorder::Recorder;
use crate::sink::AssetSink;
use crate::tracker::SnapshotSource;

/// The two actions an input layer can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Begin a recording, or capture a frame if one is in progress.
    Primary,
    /// Finish the recording in progress.
    Finalize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome<R> {
    Began { vertex_count: usize },
    Captured { name: String, frame_count: usize },
    Finished { frame_count: usize, receipt: R },
}

impl Recorder {
    /// Begins a recording, or captures a frame if one is in progress.
    pub fn primary<R>(&mut self, source: &impl SnapshotSource) -> Result<TriggerOutcome<R>> {
        if self.is_recording() {
            let name = self.capture_frame(source)?.name.clone();
            return Ok(TriggerOutcome::Captured {
                name,
                frame_count: self.frame_count(),
            });
        }

        self.begin_capture(source)?;
        Ok(TriggerOutcome::Began {
            vertex_count: self.target().map_or(0, |t| t.base().vertex_count()),
        })
    }

    /// Maps `trigger` onto begin/capture/finish depending on the current state.
    pub fn trigger<S: AssetSink>(
        &mut self,
        trigger: Trigger,
        source: &impl SnapshotSource,
        sink: &mut S,
    ) -> Result<TriggerOutcome<S::Receipt>> {
        match trigger {
            Trigger::Primary => self.primary(source),
            Trigger::Finalize => {
                let frame_count = self.frame_count();
                let receipt = self.finish_into(sink)?;
                Ok(TriggerOutcome::Finished {
                    frame_count,
                    receipt,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use crate::error::BakeError;
    use crate::pose::RigidPose;
    use crate::recorder::RecorderState;
    use crate::sink::MemorySink;
    use crate::tracker::Tracker;

    use super::*;

    #[test]
    fn primary_begins_then_captures() {
        let mut tracker = Tracker::new();
        tracker.on_tracking_begin();
        tracker.on_tracking_update(vec![Vec3::ZERO; 2], vec![Vec2::ZERO; 2], vec![], RigidPose::IDENTITY).unwrap();
        let mut recorder = Recorder::new();
        let mut sink = MemorySink::default();

        let outcome = recorder.trigger(Trigger::Primary, &tracker, &mut sink).unwrap();
        assert_eq!(outcome, TriggerOutcome::Began { vertex_count: 2 });

        let outcome = recorder.trigger(Trigger::Primary, &tracker, &mut sink).unwrap();
        assert_eq!(outcome, TriggerOutcome::Captured { name: "Shape1".into(), frame_count: 1 });

        let outcome = recorder.trigger(Trigger::Finalize, &tracker, &mut sink).unwrap();
        assert_eq!(outcome, TriggerOutcome::Finished { frame_count: 1, receipt: 0 });
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(sink.stored.len(), 1);
    }

    #[test]
    fn finalize_while_idle_is_reported() {
        let mut recorder = Recorder::new();
        let mut sink = MemorySink::default();
        let err = recorder.trigger(Trigger::Finalize, &Tracker::new(), &mut sink).unwrap_err();
        assert!(matches!(err, BakeError::NothingToFinish));
        assert!(sink.stored.is_empty());
    }

    #[test]
    fn primary_without_mesh_stays_idle() {
        let mut recorder = Recorder::new();
        let mut sink = MemorySink::default();
        let err = recorder.trigger(Trigger::Primary, &Tracker::new(), &mut sink).unwrap_err();
        assert!(matches!(err, BakeError::NoTrackedMesh));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }
}
