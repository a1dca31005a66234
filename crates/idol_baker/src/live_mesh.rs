use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;

use idol_bake::MeshSnapshot;

use crate::tracking::Baker;

/// Marks the entity that draws the tracked face.
#[derive(Component)]
pub struct LiveFace;

pub fn mesh_from_snapshot(snapshot: &MeshSnapshot) -> Mesh {
    let positions: Vec<[f32; 3]> = snapshot.vertices().iter().map(|v| v.to_array()).collect();
    let normals: Vec<[f32; 3]> = snapshot.vertex_normals().into_iter().map(|n| n.to_array()).collect();
    let uvs: Vec<[f32; 2]> = snapshot.uvs().iter().map(|uv| uv.to_array()).collect();

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(snapshot.flat_indices()));
    mesh
}

pub fn spawn_live_face(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(mesh_from_snapshot(&MeshSnapshot::default())),
            material: materials.add(StandardMaterial {
                base_color: Color::srgb(0.9, 0.8, 0.75),
                double_sided: true,
                cull_mode: None,
                ..default()
            }),
            visibility: Visibility::Hidden,
            ..default()
        },
        LiveFace,
    ));
}

/// Rebuilds the face mesh whenever the tracker has something new, and hides
/// it while no face is tracked.
pub fn update_live_face(
    baker: Res<Baker>,
    mut last_generation: Local<Option<u64>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut faces: Query<(&Handle<Mesh>, &mut Transform, &mut Visibility), With<LiveFace>>,
) {
    let (live, generation) = baker.tracker().current_with_generation();
    if *last_generation == Some(generation) {
        return;
    }
    *last_generation = Some(generation);

    for (handle, mut transform, mut visibility) in &mut faces {
        let Some(live) = live.as_ref().filter(|l| !l.snapshot.is_empty()) else {
            *visibility = Visibility::Hidden;
            continue;
        };

        meshes.insert(handle, mesh_from_snapshot(&live.snapshot));
        *transform = Transform {
            translation: live.pose.translation,
            rotation: live.pose.rotation,
            ..default()
        };
        *visibility = Visibility::Visible;
    }
}

#[cfg(test)]
mod tests {
    use idol_api::FaceMesh;

    use crate::asset_sink::JsonAssetSink;

    use super::*;

    fn face() -> FaceMesh {
        FaceMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            triangle_indices: vec![0, 1, 2],
            transform: Mat4::from_translation(Vec3::new(0., 0.5, 0.)),
        }
    }

    #[test]
    fn converts_snapshot_to_mesh() {
        let snapshot = MeshSnapshot::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            vec![[0, 1, 2]],
        ).unwrap();
        let mesh = mesh_from_snapshot(&snapshot);
        assert_eq!(mesh.count_vertices(), 3);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(3));
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
    }

    #[test]
    fn follows_tracker() {
        let baker = Baker::new(JsonAssetSink::new("unused", "Face"));
        let mut app = App::new();
        app.insert_resource(baker.clone())
            .init_resource::<Assets<Mesh>>()
            .add_systems(Update, update_live_face);

        let handle = app.world_mut().resource_mut::<Assets<Mesh>>()
            .add(mesh_from_snapshot(&MeshSnapshot::default()));
        let entity = app.world_mut()
            .spawn((handle.clone(), Transform::default(), Visibility::Hidden, LiveFace))
            .id();

        baker.face_acquired(face()).unwrap();
        app.update();
        assert_eq!(app.world().get::<Visibility>(entity), Some(&Visibility::Visible));
        assert_eq!(app.world().get::<Transform>(entity).unwrap().translation, Vec3::new(0., 0.5, 0.));
        assert_eq!(app.world().resource::<Assets<Mesh>>().get(&handle).unwrap().count_vertices(), 3);

        baker.face_lost();
        app.update();
        assert_eq!(app.world().get::<Visibility>(entity), Some(&Visibility::Hidden));
    }
}
