use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use idol_bake::{AssetSink, BlendShapeTarget, MeshSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Vec3Dto {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3Dto> for Vec3 {
    fn from(value: Vec3Dto) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

impl From<Vec3> for Vec3Dto {
    fn from(value: Vec3) -> Self {
        Vec3Dto { x: value.x, y: value.y, z: value.z }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Vec2Dto {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2Dto> for Vec2 {
    fn from(value: Vec2Dto) -> Self {
        Vec2::new(value.x, value.y)
    }
}

impl From<Vec2> for Vec2Dto {
    fn from(value: Vec2) -> Self {
        Vec2Dto { x: value.x, y: value.y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlendShapeDto {
    #[serde(rename = "shapeKeyName")]
    pub name: String,
    #[serde(rename = "blendShapeWeight")]
    pub weight: f32,
    #[serde(rename = "elements")]
    pub indices: Vec<u32>,
    #[serde(rename = "v3_vertices")]
    pub positions: Vec<Vec3Dto>,
    #[serde(rename = "vertexCount")]
    pub vertex_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseMeshDto {
    pub vertices: Vec<Vec3Dto>,
    pub uvs: Vec<Vec2Dto>,
    pub triangles: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds_min: Option<Vec3Dto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds_max: Option<Vec3Dto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlendShapesDto {
    #[serde(rename = "baseMesh", default, skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseMeshDto>,
    #[serde(rename = "blendShapeDatas")]
    pub blend_shapes: Vec<BlendShapeDto>,
}

/// A blend shape stored sparsely: vertices missing from `indices` don't move.
#[derive(Debug, Clone)]
pub struct BlendShape {
    pub name: String,
    pub vertex_count: u32,
    pub weight: f32,
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
}

impl BlendShape {
    fn from_deltas(name: &str, weight: f32, deltas: &[Vec3]) -> Self {
        let (indices, positions) = deltas.iter()
            .enumerate()
            .filter(|(_, d)| **d != Vec3::ZERO)
            .map(|(i, d)| (i as u32, *d))
            .unzip();
        Self {
            name: name.to_string(),
            vertex_count: deltas.len() as u32,
            weight,
            indices,
            positions,
        }
    }

    /// One displacement per vertex.
    pub fn dense_deltas(&self) -> Vec<Vec3> {
        let mut deltas = vec![Vec3::ZERO; self.vertex_count as usize];
        for (i, position) in self.indices.iter().zip(self.positions.iter()) {
            if let Some(delta) = deltas.get_mut(*i as usize) {
                *delta = *position;
            }
        }
        deltas
    }
}

#[derive(Debug, Clone)]
pub struct BlendShapeLibrary {
    pub base: Option<MeshSnapshot>,
    pub blend_shapes: Vec<BlendShape>,
}

impl BlendShapeLibrary {
    pub fn from_target(target: &BlendShapeTarget) -> Self {
        Self {
            base: Some(target.base().clone()),
            blend_shapes: target.frames().iter()
                .map(|f| BlendShape::from_deltas(&f.name, f.weight, &f.deltas))
                .collect(),
        }
    }

    pub fn from_slice(src: &[u8]) -> anyhow::Result<BlendShapeLibrary> {
        let dto = serde_json::from_slice::<BlendShapesDto>(src)?;
        let base = match dto.base {
            Some(base) => Some(MeshSnapshot::new(
                base.vertices.into_iter().map(From::from).collect(),
                base.uvs.into_iter().map(From::from).collect(),
                idol_bake::triangles_from_flat(&base.triangles)?,
            )?),
            None => None,
        };

        Ok(Self {
            base,
            blend_shapes: dto.blend_shapes.into_iter()
                .map(|s| BlendShape {
                    name: s.name,
                    vertex_count: s.vertex_count,
                    weight: s.weight,
                    indices: s.indices,
                    positions: s.positions.into_iter().map(From::from).collect(),
                })
                .collect(),
        })
    }

    fn to_dto(&self) -> BlendShapesDto {
        BlendShapesDto {
            base: self.base.as_ref().map(|base| {
                let bounds = base.bounds();
                BaseMeshDto {
                    vertices: base.vertices().iter().copied().map(From::from).collect(),
                    uvs: base.uvs().iter().copied().map(From::from).collect(),
                    triangles: base.flat_indices(),
                    bounds_min: bounds.map(|(min, _)| min.into()),
                    bounds_max: bounds.map(|(_, max)| max.into()),
                }
            }),
            blend_shapes: self.blend_shapes.iter()
                .map(|s| BlendShapeDto {
                    name: s.name.clone(),
                    weight: s.weight,
                    indices: s.indices.clone(),
                    positions: s.positions.iter().copied().map(From::from).collect(),
                    vertex_count: s.vertex_count,
                })
                .collect(),
        }
    }
}

/// Writes finished targets as JSON files into a directory.
///
/// Files are named after `name`, and never overwrite an existing asset:
/// `Face.json`, then `Face 1.json`, `Face 2.json` and so on.
#[derive(Debug, Clone)]
pub struct JsonAssetSink {
    directory: PathBuf,
    name: String,
    attempts: u32,
}

/// How many names are tried before giving up on a directory.
const MAX_ATTEMPTS: u32 = 10_000;

impl JsonAssetSink {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            attempts: MAX_ATTEMPTS,
        }
    }

    fn candidate(&self, n: u32) -> PathBuf {
        match n {
            0 => self.directory.join(format!("{}.json", self.name)),
            n => self.directory.join(format!("{} {}.json", self.name, n)),
        }
    }

    fn create_unique(&self) -> anyhow::Result<(PathBuf, File)> {
        std::fs::create_dir_all(&self.directory)
            .with_context(|| format!("failed to create {}", self.directory.display()))?;

        for n in 0..self.attempts {
            let path = self.candidate(n);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err).with_context(|| format!("failed to create {}", path.display())),
            }
        }
        Err(anyhow!("no free name for {} in {} after {} attempts", self.name, self.directory.display(), self.attempts))
    }
}

impl AssetSink for JsonAssetSink {
    type Receipt = PathBuf;

    fn store(&mut self, target: BlendShapeTarget) -> anyhow::Result<PathBuf> {
        let dto = BlendShapeLibrary::from_target(&target).to_dto();
        let (path, file) = self.create_unique()?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &dto)?;
        writer.flush()?;
        writer.into_inner()
            .map_err(|e| e.into_error())?
            .sync_all()
            .with_context(|| format!("failed to sync {}", path.display()))?;

        tracing::info!(path = %path.display(), frames = target.frames().len(), "saved blend shape asset");
        Ok(path)
    }
}
