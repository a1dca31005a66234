use bevy::prelude::{ButtonInput, KeyCode, Res};
use bevy::tasks::{IoTaskPool, TaskPool};

use idol_bake::Trigger;

use crate::tracking::{log_trigger, Baker};

pub const TRIGGER_KEYS: [(KeyCode, Trigger); 2] = [
    (KeyCode::Space, Trigger::Primary),
    (KeyCode::Enter, Trigger::Finalize),
];

/// Space begins a recording or adds a blend shape to it, Return saves it.
///
/// Saving ends the recording straight away; the asset is written on the IO
/// task pool so the frame isn't held up by the disk.
pub fn keyboard_triggers(keys: Res<ButtonInput<KeyCode>>, baker: Res<Baker>) {
    for (key, trigger) in TRIGGER_KEYS {
        if !keys.just_pressed(key) {
            continue;
        }

        match trigger {
            Trigger::Primary => log_trigger(trigger, &baker.trigger(trigger)),
            Trigger::Finalize => match baker.take_finished() {
                Ok(target) => {
                    let baker = Baker::clone(&baker);
                    IoTaskPool::get_or_init(TaskPool::new)
                        .spawn(async move {
                            log_trigger(trigger, &baker.store(target));
                        })
                        .detach();
                }
                Err(err) => log_trigger(trigger, &Err(err)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::{Duration, Instant};

    use bevy::prelude::{App, Update};
    use glam::{Mat4, Vec2, Vec3};
    use idol_api::{FaceMesh, RecordingState};

    use crate::asset_sink::JsonAssetSink;

    use super::*;

    fn press(app: &mut App, key: KeyCode) {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.reset_all();
        keys.press(key);
        app.update();
    }

    fn wait_for(path: &Path) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if path.exists() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn keys_drive_recording() {
        let dir = tempfile::tempdir().unwrap();
        let baker = Baker::new(JsonAssetSink::new(dir.path(), "Face"));
        baker.face_acquired(FaceMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            uvs: vec![Vec2::ZERO; 3],
            triangle_indices: vec![0, 1, 2],
            transform: Mat4::IDENTITY,
        }).unwrap();

        let mut app = App::new();
        app.insert_resource(baker.clone())
            .init_resource::<ButtonInput<KeyCode>>()
            .add_systems(Update, keyboard_triggers);

        // Nothing to save yet.
        press(&mut app, KeyCode::Enter);
        assert_eq!(baker.status().state, RecordingState::Idle);

        press(&mut app, KeyCode::Space);
        assert_eq!(baker.status().state, RecordingState::Recording);
        press(&mut app, KeyCode::Space);
        press(&mut app, KeyCode::Space);
        assert_eq!(baker.status().frame_count, 2);

        press(&mut app, KeyCode::Enter);
        assert_eq!(baker.status().state, RecordingState::Idle);
        assert!(wait_for(&dir.path().join("Face.json")));
    }

    #[test]
    fn saving_does_not_block_next_recording() {
        let dir = tempfile::tempdir().unwrap();
        let baker = Baker::new(JsonAssetSink::new(dir.path(), "Face"));
        baker.face_updated(FaceMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            uvs: vec![Vec2::ZERO; 3],
            triangle_indices: vec![0, 1, 2],
            transform: Mat4::IDENTITY,
        }).unwrap();

        let mut app = App::new();
        app.insert_resource(baker.clone())
            .init_resource::<ButtonInput<KeyCode>>()
            .add_systems(Update, keyboard_triggers);

        press(&mut app, KeyCode::Space);
        press(&mut app, KeyCode::Space);
        press(&mut app, KeyCode::Enter);
        // The recording ended on the frame the key was pressed.
        assert_eq!(baker.status().state, RecordingState::Idle);
        press(&mut app, KeyCode::Space);
        assert_eq!(baker.status().state, RecordingState::Recording);
        assert_eq!(baker.status().frame_count, 0);

        press(&mut app, KeyCode::Space);
        press(&mut app, KeyCode::Enter);
        assert!(wait_for(&dir.path().join("Face.json")));
        assert!(wait_for(&dir.path().join("Face 1.json")));
    }
}
